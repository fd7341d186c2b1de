//! Catalog entities: products, categories and product drafts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{CategoryId, ProductId};
use super::price::Price;

// =============================================================================
// Category
// =============================================================================

/// A product category. Read-only from the client's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

// =============================================================================
// Product
// =============================================================================

/// Whether a product can currently be bought.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StockStatus {
    InStock,
    OutOfStock,
}

impl StockStatus {
    /// Human-readable label (e.g. "in stock").
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::InStock => "in stock",
            Self::OutOfStock => "out of stock",
        }
    }

    /// Label with spaces replaced by dashes, for use as a CSS class or slug.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::InStock => "in-stock",
            Self::OutOfStock => "out-of-stock",
        }
    }
}

/// A product as held by the remote store.
///
/// Ids are always server-assigned. Timestamps are optional on the wire
/// because records written by older clients may lack them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    pub stock: u32,
    #[serde(default = "unassigned_category")]
    pub category_id: CategoryId,
    #[serde(default)]
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

const fn unassigned_category() -> CategoryId {
    CategoryId::UNASSIGNED
}

impl Product {
    /// `true` when at least one unit is in stock.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Stock status derived from `stock`.
    #[must_use]
    pub const fn stock_status(&self) -> StockStatus {
        if self.in_stock() {
            StockStatus::InStock
        } else {
            StockStatus::OutOfStock
        }
    }
}

// =============================================================================
// Drafts
// =============================================================================

/// Reasons a product draft is rejected before it is sent.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("product name cannot be empty")]
    EmptyName,
    #[error("price cannot be negative (got {0})")]
    NegativePrice(Price),
    #[error("invalid image URL {url:?}: {reason}")]
    InvalidImageUrl { url: String, reason: String },
}

/// Form data for a product, without an id.
///
/// The store assigns ids; a draft never carries one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub stock: u32,
    pub category_id: CategoryId,
    pub image_url: String,
}

impl ProductDraft {
    /// Check the fields the store relies on.
    ///
    /// # Errors
    ///
    /// Returns `DraftError` for an empty (or whitespace-only) name or a
    /// negative price.
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.name.trim().is_empty() {
            return Err(DraftError::EmptyName);
        }
        if self.price.is_negative() {
            return Err(DraftError::NegativePrice(self.price));
        }
        Ok(())
    }

    /// Request body for a create, stamped with `now` as both timestamps.
    #[must_use]
    pub fn into_new(self, now: DateTime<Utc>) -> NewProduct {
        NewProduct {
            name: self.name.trim().to_owned(),
            description: self.description,
            price: self.price,
            stock: self.stock,
            category_id: self.category_id,
            image_url: self.image_url,
            created_at: now,
            modified_at: now,
        }
    }

    /// Full replacement for an existing product.
    ///
    /// `created_at` is carried over from the record being replaced, since a
    /// full replace would otherwise drop it.
    #[must_use]
    pub fn into_replacement(
        self,
        id: ProductId,
        created_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Product {
        Product {
            id,
            name: self.name.trim().to_owned(),
            description: self.description,
            price: self.price,
            stock: self.stock,
            category_id: self.category_id,
            image_url: self.image_url,
            created_at,
            modified_at: Some(now),
        }
    }
}

impl From<&Product> for ProductDraft {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            stock: product.stock,
            category_id: product.category_id,
            image_url: product.image_url.clone(),
        }
    }
}

/// Create request body: a product without an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub stock: u32,
    pub category_id: CategoryId,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}
