//! Errors surfaced by the caches and the reconciliation coordinator.
//!
//! Remote failures keep their [`RestError`] so callers can tell a status or
//! transport failure from a malformed body. Nothing here carries a fallback
//! value: a failed read or write is always an `Err`.

use std::fmt;

use shelf_core::{CartItemId, DraftError, ProductId, TotalOutOfRange};
use thiserror::Error;

use crate::rest::RestError;

/// Kind of cached entity a lookup was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Product,
    CartItem,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Product => "product",
            Self::CartItem => "cart item",
        })
    }
}

/// Client-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// A remote call failed (`RequestFailed` or `InvalidResponseShape`).
    #[error(transparent)]
    Remote(#[from] RestError),

    /// A local cache lookup by id found nothing.
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: String },

    /// Creating a cart line failed remotely; the cart is unchanged.
    #[error("failed to add product {product_id} to the cart: {source}")]
    CartItemCreateFailed {
        product_id: ProductId,
        source: RestError,
    },

    /// Changing a cart line failed remotely; the cart is unchanged.
    #[error("failed to update cart item {item_id}: {source}")]
    CartItemUpdateFailed {
        item_id: CartItemId,
        source: RestError,
    },

    /// One or both halves of the catalog failed to load. The half that
    /// loaded is kept.
    #[error("catalog load failed: {}", describe_load_failures(.products.as_ref(), .categories.as_ref()))]
    CatalogLoad {
        products: Option<RestError>,
        categories: Option<RestError>,
    },

    /// A product draft was rejected before any request was sent.
    #[error("invalid product: {0}")]
    InvalidDraft(#[from] DraftError),

    /// Catalog and cart both failed to load; each keeps its own error.
    #[error("{catalog}; cart load failed: {cart}")]
    Load { catalog: Box<Error>, cart: Box<Error> },

    /// A cart line would have a total outside the price range. Nothing was
    /// sent.
    #[error("invalid cart line: {0}")]
    LineTotal(#[from] TotalOutOfRange),
}

impl Error {
    pub(crate) fn product_not_found(id: ProductId) -> Self {
        Self::NotFound {
            kind: EntityKind::Product,
            id: id.to_string(),
        }
    }

    pub(crate) fn cart_item_not_found(id: &CartItemId) -> Self {
        Self::NotFound {
            kind: EntityKind::CartItem,
            id: id.to_string(),
        }
    }

    /// `true` when the local cache had no entity with the requested id.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// The underlying remote error, if this failure came from the store.
    ///
    /// For a failed combined load this is the catalog's error when it has one.
    #[must_use]
    pub fn remote(&self) -> Option<&RestError> {
        match self {
            Self::Load { catalog, cart } => catalog.remote().or_else(|| cart.remote()),
            Self::Remote(e)
            | Self::CartItemCreateFailed { source: e, .. }
            | Self::CartItemUpdateFailed { source: e, .. } => Some(e),
            Self::CatalogLoad {
                products: Some(e), ..
            }
            | Self::CatalogLoad {
                products: None,
                categories: Some(e),
            } => Some(e),
            Self::NotFound { .. }
            | Self::InvalidDraft(_)
            | Self::LineTotal(_)
            | Self::CatalogLoad {
                products: None,
                categories: None,
            } => None,
        }
    }
}

fn describe_load_failures(products: Option<&RestError>, categories: Option<&RestError>) -> String {
    let parts: Vec<String> = [("products", products), ("categories", categories)]
        .into_iter()
        .filter_map(|(name, err)| err.map(|e| format!("{name}: {e}")))
        .collect();

    if parts.is_empty() {
        return "(no failure details provided)".to_string();
    }
    parts.join("; ")
}

/// Result type alias for [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
