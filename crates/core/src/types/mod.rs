//! Core types for Shelf.
//!
//! This module provides type-safe wrappers for the catalog and cart domain.

pub mod cart;
pub mod id;
pub mod price;
pub mod product;
pub mod quantity;

pub use cart::{
    CartItem, CartItemDraft, CartItemRecord, QuantityPatch, TotalOutOfRange, line_total,
};
pub use id::*;
pub use price::Price;
pub use product::{Category, DraftError, NewProduct, Product, ProductDraft, StockStatus};
pub use quantity::{Quantity, QuantityError};
