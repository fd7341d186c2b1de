//! Sub-command implementations.
//!
//! Each command loads what it needs into a [`Coordinator`](shelf_client::Coordinator),
//! runs one operation and returns the text to print.

pub mod cart;
pub mod products;
