//! Cart line items.
//!
//! A [`CartItem`] keeps `total_price` private and recomputes it from
//! `unit_price * quantity` on construction, on deserialisation and on every
//! change. A line whose total does not fit in a decimal is never built. The
//! wire shape lives in [`CartItemRecord`].

use serde::{Deserialize, Serialize};

use super::id::{CartItemId, ProductId, UserId};
use super::price::Price;
use super::product::Product;
use super::quantity::Quantity;

/// `unit_price * quantity` is outside the range of a price.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("line total out of range: {quantity} x {unit_price}")]
pub struct TotalOutOfRange {
    pub unit_price: Price,
    pub quantity: Quantity,
}

/// Total for a line.
///
/// # Errors
///
/// Returns `TotalOutOfRange` if the product overflows.
pub fn line_total(unit_price: Price, quantity: Quantity) -> Result<Price, TotalOutOfRange> {
    unit_price
        .checked_times(quantity)
        .ok_or(TotalOutOfRange {
            unit_price,
            quantity,
        })
}

/// A line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CartItemRecord", into = "CartItemRecord")]
pub struct CartItem {
    id: CartItemId,
    product_id: ProductId,
    product_name: String,
    unit_price: Price,
    quantity: Quantity,
    total_price: Price,
    user_id: UserId,
}

impl CartItem {
    /// Build a cart line; the total is derived.
    ///
    /// # Errors
    ///
    /// Returns `TotalOutOfRange` if the total overflows.
    pub fn new(
        id: CartItemId,
        product_id: ProductId,
        product_name: impl Into<String>,
        unit_price: Price,
        quantity: Quantity,
        user_id: UserId,
    ) -> Result<Self, TotalOutOfRange> {
        Ok(Self {
            id,
            product_id,
            product_name: product_name.into(),
            unit_price,
            quantity,
            total_price: line_total(unit_price, quantity)?,
            user_id,
        })
    }

    #[must_use]
    pub const fn id(&self) -> &CartItemId {
        &self.id
    }

    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product_id
    }

    #[must_use]
    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    /// Price snapshot taken when the line was added.
    #[must_use]
    pub const fn unit_price(&self) -> Price {
        self.unit_price
    }

    #[must_use]
    pub const fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Always `unit_price * quantity`.
    #[must_use]
    pub const fn total_price(&self) -> Price {
        self.total_price
    }

    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Take quantity and unit price from an authoritative copy of this line.
    pub fn reconcile_with(&mut self, confirmed: &Self) {
        self.quantity = confirmed.quantity;
        self.unit_price = confirmed.unit_price;
        self.total_price = confirmed.total_price;
    }
}

/// Wire representation of a cart line.
///
/// `total_price` is whatever the store holds; converting into a
/// [`CartItem`] discards it in favour of the derived value, and fails if
/// that value overflows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRecord {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Price,
    pub quantity: Quantity,
    #[serde(default)]
    pub total_price: Price,
    pub user_id: UserId,
}

impl CartItemRecord {
    /// Whether the stored total agrees with `unit_price * quantity`.
    #[must_use]
    pub fn total_is_consistent(&self) -> bool {
        self.unit_price.checked_times(self.quantity) == Some(self.total_price)
    }
}

impl TryFrom<CartItemRecord> for CartItem {
    type Error = TotalOutOfRange;

    fn try_from(record: CartItemRecord) -> Result<Self, Self::Error> {
        Self::new(
            record.id,
            record.product_id,
            record.product_name,
            record.unit_price,
            record.quantity,
            record.user_id,
        )
    }
}

impl From<CartItem> for CartItemRecord {
    fn from(item: CartItem) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            product_name: item.product_name,
            unit_price: item.unit_price,
            quantity: item.quantity,
            total_price: item.total_price,
            user_id: item.user_id,
        }
    }
}

/// Create request body for a cart line. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemDraft {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Price,
    pub quantity: Quantity,
    pub total_price: Price,
    pub user_id: UserId,
}

impl CartItemDraft {
    /// Snapshot the product's current price into a new line.
    ///
    /// # Errors
    ///
    /// Returns `TotalOutOfRange` if the line total overflows.
    pub fn for_product(
        product: &Product,
        quantity: Quantity,
        user_id: UserId,
    ) -> Result<Self, TotalOutOfRange> {
        Ok(Self {
            product_id: product.id,
            product_name: product.name.clone(),
            unit_price: product.price,
            quantity,
            total_price: line_total(product.price, quantity)?,
            user_id,
        })
    }
}

/// Partial update body carrying only the quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuantityPatch {
    pub quantity: Quantity,
}
