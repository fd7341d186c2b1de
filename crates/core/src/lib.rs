//! Shelf Core - Shared domain types for the catalog and cart engine.
//!
//! This crate provides the types used across all Shelf components:
//! - `client` - Remote resource client, caches and reconciliation coordinator
//! - `cli` - Command-line rendering adapter
//!
//! # Architecture
//!
//! The core crate contains only types and pure arithmetic - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices and quantities, plus the
//!   `Product`, `Category` and `CartItem` entities

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
