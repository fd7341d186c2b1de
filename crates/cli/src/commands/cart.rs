//! Cart commands.

use shelf_client::{CartStore, CatalogStore, Coordinator, Result};
use shelf_core::{CartItemId, ProductId, Quantity};

use crate::render;

/// Cart table with totals.
///
/// # Errors
///
/// Returns an error if the cart cannot be loaded.
pub async fn show<S: CatalogStore + CartStore>(shelf: &mut Coordinator<S>) -> Result<String> {
    shelf.load_cart().await?;
    Ok(render::cart(&shelf.snapshot()))
}

/// Add a product to the cart.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded, the product is unknown
/// or the store rejects the line.
pub async fn add<S: CatalogStore + CartStore>(
    shelf: &mut Coordinator<S>,
    product_id: ProductId,
    quantity: Quantity,
) -> Result<String> {
    shelf.load_catalog().await?;
    let item = shelf.add_to_cart(product_id, quantity).await?;
    Ok(format!("added {}\n", render::cart_line(&item)))
}

/// Add `by` units to a line.
///
/// # Errors
///
/// Returns an error if the cart cannot be loaded, the line is unknown or the
/// store rejects the change.
pub async fn increment<S: CatalogStore + CartStore>(
    shelf: &mut Coordinator<S>,
    item_id: &CartItemId,
    by: u32,
) -> Result<String> {
    shelf.load_cart().await?;
    let item = shelf.increment(item_id, by).await?;
    Ok(format!("{}\n", render::cart_line(&item)))
}

/// Take `by` units off a line. The quantity stops at one.
///
/// # Errors
///
/// Same as [`increment`].
pub async fn decrement<S: CatalogStore + CartStore>(
    shelf: &mut Coordinator<S>,
    item_id: &CartItemId,
    by: u32,
) -> Result<String> {
    shelf.load_cart().await?;
    let item = shelf.decrement(item_id, by).await?;
    Ok(format!("{}\n", render::cart_line(&item)))
}

/// Remove a line.
///
/// # Errors
///
/// Returns an error if the cart cannot be loaded or the store rejects the
/// delete.
pub async fn remove<S: CatalogStore + CartStore>(
    shelf: &mut Coordinator<S>,
    item_id: &CartItemId,
) -> Result<String> {
    shelf.load_cart().await?;
    if shelf.remove_from_cart(item_id).await? {
        Ok(format!("removed {item_id}\n"))
    } else {
        Ok(format!("no cart item {item_id}\n"))
    }
}
