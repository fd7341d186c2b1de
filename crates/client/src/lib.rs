//! Shelf Client - catalog and cart state reconciliation.
//!
//! Keeps a local view of a remote catalog and cart consistent with the
//! JSON resource store that owns them.
//!
//! # Architecture
//!
//! - [`rest`] - Remote resource client (`reqwest`), one request per call
//! - [`store`] - `CatalogStore` / `CartStore` traits the caches talk to
//! - [`catalog`] - Products and categories, plus the pure filter engine
//! - [`cart`] - Cart lines, quantity rules and derived totals
//! - [`coordinator`] - Write-then-patch orchestration for a session
//!
//! The cache is never changed ahead of the store: every write is sent
//! first and the cache is patched from the confirmed response.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod rest;
pub mod store;

pub use cart::CartCache;
pub use catalog::{CatalogCache, CatalogFilter, CategoryFilter, FilterView};
pub use config::{ApiConfig, ConfigError};
pub use coordinator::{Coordinator, Snapshot};
pub use error::{EntityKind, Error, Result};
pub use rest::{FailureCause, Operation, Resource, RestClient, RestError};
pub use store::{CartStore, CatalogStore};
