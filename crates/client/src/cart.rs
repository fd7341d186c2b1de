//! Last-fetched cart lines and the rules for changing them.
//!
//! Every mutation sends its request first and touches the cache only once
//! the store has answered successfully. A failed call leaves the cache
//! exactly as it was.

use shelf_core::{
    CartItem, CartItemDraft, CartItemId, Price, Product, Quantity, QuantityPatch, UserId,
    line_total,
};
use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::store::CartStore;

#[derive(Debug, Clone, Default)]
pub struct CartCache {
    items: Vec<CartItem>,
    loaded: bool,
}

impl CartCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every line with the store's current cart.
    ///
    /// # Errors
    ///
    /// Returns `Error::Remote` if the list fails; the cache keeps its
    /// previous contents.
    #[instrument(skip_all)]
    pub async fn load_all(&mut self, store: &impl CartStore) -> Result<()> {
        let items = store.list_cart_items().await?;
        debug!(count = items.len(), "Loaded cart");
        self.items = items;
        self.loaded = true;
        Ok(())
    }

    /// Add `quantity` units of `product` as a new line.
    ///
    /// The line's unit price is the product's price right now; later price
    /// changes do not reach it.
    ///
    /// # Errors
    ///
    /// Returns `Error::LineTotal` without sending anything if the line total
    /// overflows, and `Error::CartItemCreateFailed` if the store rejects the
    /// line.
    #[instrument(skip_all, fields(product_id = %product.id, quantity = %quantity))]
    pub async fn add_item(
        &mut self,
        store: &impl CartStore,
        product: &Product,
        quantity: Quantity,
        user_id: &UserId,
    ) -> Result<CartItem> {
        let draft = CartItemDraft::for_product(product, quantity, user_id.clone())?;
        let created = store
            .create_cart_item(&draft)
            .await
            .map_err(|source| Error::CartItemCreateFailed {
                product_id: product.id,
                source,
            })?;

        debug!(item_id = %created.id(), "Cart line created");
        self.items.push(created.clone());
        Ok(created)
    }

    /// Move a line's quantity by `delta`, never below one.
    ///
    /// Only the quantity is sent. The cached line then takes quantity and
    /// unit price from the store's response, so a change made elsewhere wins.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` without sending anything if the line is not
    /// cached or the new total overflows, and `Error::CartItemUpdateFailed`
    /// if the store rejects the change.
    #[instrument(skip(self, store), fields(item_id = %id))]
    pub async fn change_quantity(
        &mut self,
        store: &impl CartStore,
        id: &CartItemId,
        delta: i64,
    ) -> Result<CartItem> {
        let current = self
            .item(id)
            .ok_or_else(|| Error::cart_item_not_found(id))?;
        let quantity = current.quantity().apply_delta(delta);
        line_total(current.unit_price(), quantity)?;
        let patch = QuantityPatch { quantity };

        let confirmed = store
            .patch_cart_item(id, patch)
            .await
            .map_err(|source| Error::CartItemUpdateFailed {
                item_id: id.clone(),
                source,
            })?;

        // Re-resolve: the slot was found before the await
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id() == id)
            .ok_or_else(|| Error::cart_item_not_found(id))?;
        item.reconcile_with(&confirmed);
        debug!(quantity = %item.quantity(), total = %item.total_price(), "Cart line updated");
        Ok(item.clone())
    }

    /// Delete a line. An id that is not cached is a no-op.
    ///
    /// Returns whether a line was removed.
    ///
    /// # Errors
    ///
    /// Returns `Error::CartItemUpdateFailed` if the store rejects the delete.
    #[instrument(skip(self, store), fields(item_id = %id))]
    pub async fn remove_item(&mut self, store: &impl CartStore, id: &CartItemId) -> Result<bool> {
        if self.item(id).is_none() {
            debug!("Cart line not cached; nothing to remove");
            return Ok(false);
        }

        store
            .delete_cart_item(id)
            .await
            .map_err(|source| Error::CartItemUpdateFailed {
                item_id: id.clone(),
                source,
            })?;

        self.items.retain(|item| item.id() != id);
        Ok(true)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    #[must_use]
    pub fn item(&self, id: &CartItemId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Number of lines (not units).
    #[must_use]
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// `unit_price * quantity` of a cached line.
    #[must_use]
    pub fn total_for_item(&self, id: &CartItemId) -> Option<Price> {
        self.item(id).map(CartItem::total_price)
    }

    /// Sum of every line total, or `None` if it overflows.
    #[must_use]
    pub fn subtotal(&self) -> Option<Price> {
        Price::checked_sum(self.items.iter().map(CartItem::total_price))
    }

    /// Sum of every line's quantity.
    #[must_use]
    pub fn quantity_total(&self) -> u64 {
        self.items
            .iter()
            .map(|item| u64::from(item.quantity().get()))
            .sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;
    use shelf_core::{CategoryId, ProductId};

    use super::*;
    use crate::rest::{Operation, Resource};
    use crate::store::memory::MemoryStore;

    fn line(id: &str, unit_price: i64, quantity: u32) -> CartItem {
        CartItem::new(
            CartItemId::from(id),
            ProductId::new(1),
            "Widget",
            Price::from(unit_price),
            Quantity::new(quantity).unwrap(),
            UserId::new("1"),
        )
        .unwrap()
    }

    fn lamp() -> Product {
        Product {
            id: ProductId::new(3),
            name: "Lamp".to_string(),
            description: String::new(),
            price: Price::from_cents(1250),
            stock: 2,
            category_id: CategoryId::new(1),
            image_url: String::new(),
            created_at: None,
            modified_at: None,
        }
    }

    async fn loaded(store: &MemoryStore) -> CartCache {
        let mut cart = CartCache::new();
        cart.load_all(store).await.unwrap();
        cart
    }

    #[tokio::test]
    async fn test_decrement_clamps_then_increment() {
        let store = MemoryStore::new().with_cart_items(vec![line("a", 10, 2)]);
        let mut cart = loaded(&store).await;
        let a = CartItemId::from("a");

        let item = cart.change_quantity(&store, &a, -5).await.unwrap();
        assert_eq!(item.quantity().get(), 1);
        assert_eq!(item.total_price(), Price::from(10));

        let item = cart.change_quantity(&store, &a, 1).await.unwrap();
        assert_eq!(item.quantity().get(), 2);
        assert_eq!(cart.total_for_item(&a), Some(Price::from(20)));
    }

    #[tokio::test]
    async fn test_change_quantity_takes_server_values() {
        let store = MemoryStore::new().with_cart_items(vec![line("a", 10, 2)]);
        let mut cart = loaded(&store).await;
        let a = CartItemId::from("a");

        // Another session bumped the price and quantity
        assert!(store.edit_cart_item(&a, Quantity::new(5).unwrap(), Price::from(12)));

        let item = cart.change_quantity(&store, &a, 1).await.unwrap();
        assert_eq!(item.quantity().get(), 3);
        assert_eq!(item.unit_price(), Price::from(12));
        assert_eq!(item.total_price(), Price::from(36));
    }

    #[tokio::test]
    async fn test_change_quantity_unknown_id_sends_nothing() {
        let store = MemoryStore::new();
        let mut cart = loaded(&store).await;
        let before = store.request_count();

        let err = cart
            .change_quantity(&store, &CartItemId::from("zz"), 1)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.request_count(), before);
    }

    #[tokio::test]
    async fn test_overflowing_quantity_sends_nothing() {
        let costly = CartItem::new(
            CartItemId::from("a"),
            ProductId::new(1),
            "Widget",
            Price::new(rust_decimal::Decimal::MAX),
            Quantity::ONE,
            UserId::new("1"),
        )
        .unwrap();
        let store = MemoryStore::new().with_cart_items(vec![costly.clone()]);
        let mut cart = loaded(&store).await;
        let before = store.request_count();

        let err = cart
            .change_quantity(&store, &CartItemId::from("a"), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::LineTotal(_)));
        assert_eq!(store.request_count(), before);
        assert_eq!(cart.items(), [costly].as_slice());
    }

    #[test]
    fn test_subtotal_overflow_is_none() {
        let costly = CartItem::new(
            CartItemId::from("b"),
            ProductId::new(1),
            "Widget",
            Price::new(rust_decimal::Decimal::MAX),
            Quantity::ONE,
            UserId::new("1"),
        )
        .unwrap();
        let cart = CartCache {
            items: vec![line("a", 10, 1), costly],
            loaded: true,
        };
        assert_eq!(cart.subtotal(), None);
    }

    #[tokio::test]
    async fn test_failed_patch_leaves_cart_untouched() {
        let store = MemoryStore::new().with_cart_items(vec![line("a", 10, 2), line("b", 3, 1)]);
        let mut cart = loaded(&store).await;
        let before = cart.items().to_vec();

        store.fail_next(Resource::CartItems, Operation::Patch, 500);
        let err = cart
            .change_quantity(&store, &CartItemId::from("a"), 1)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::CartItemUpdateFailed { .. }));
        assert_eq!(cart.items(), before.as_slice());
    }

    #[tokio::test]
    async fn test_add_item_snapshots_price() {
        let store = MemoryStore::new();
        let mut cart = loaded(&store).await;

        let item = cart
            .add_item(&store, &lamp(), Quantity::new(2).unwrap(), &UserId::new("u1"))
            .await
            .unwrap();
        assert_eq!(item.unit_price(), Price::from_cents(1250));
        assert_eq!(item.total_price(), Price::from(25));
        assert_eq!(item.user_id().as_str(), "u1");
        assert_eq!(cart.count(), 1);
        assert_eq!(store.cart_items()[0].id(), item.id());
    }

    #[tokio::test]
    async fn test_failed_add_leaves_cart_untouched() {
        let store = MemoryStore::new();
        let mut cart = loaded(&store).await;

        store.corrupt_next(Resource::CartItems, Operation::Create);
        let err = cart
            .add_item(&store, &lamp(), Quantity::ONE, &UserId::new("1"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::CartItemCreateFailed { product_id, .. } if product_id == ProductId::new(3)));
        assert_eq!(cart.count(), 0);
    }

    #[tokio::test]
    async fn test_remove_nonexistent_is_noop() {
        let store = MemoryStore::new().with_cart_items(vec![line("a", 10, 2)]);
        let mut cart = loaded(&store).await;
        let before = store.request_count();

        let removed = cart
            .remove_item(&store, &CartItemId::from("nope"))
            .await
            .unwrap();
        assert!(!removed);
        assert_eq!(cart.count(), 1);
        assert_eq!(store.request_count(), before);
    }

    #[tokio::test]
    async fn test_remove_item() {
        let store = MemoryStore::new().with_cart_items(vec![line("a", 10, 2), line("b", 3, 1)]);
        let mut cart = loaded(&store).await;

        assert!(cart.remove_item(&store, &CartItemId::from("a")).await.unwrap());
        assert_eq!(cart.count(), 1);
        assert!(store.cart_items().iter().all(|i| i.id().as_str() != "a"));
    }

    #[tokio::test]
    async fn test_failed_remove_keeps_line() {
        let store = MemoryStore::new().with_cart_items(vec![line("a", 10, 2)]);
        let mut cart = loaded(&store).await;

        store.fail_next(Resource::CartItems, Operation::Remove, 503);
        assert!(cart.remove_item(&store, &CartItemId::from("a")).await.is_err());
        assert_eq!(cart.count(), 1);
    }

    #[test]
    fn test_totals() {
        let cart = CartCache {
            items: vec![line("a", 10, 2), line("b", 3, 3)],
            loaded: true,
        };
        assert_eq!(cart.subtotal(), Some(Price::from(29)));
        assert_eq!(cart.quantity_total(), 5);
        assert_eq!(CartCache::new().subtotal(), Some(Price::ZERO));
        assert_eq!(CartCache::new().count(), 0);
    }

    proptest! {
        #[test]
        fn prop_quantity_never_below_one(
            start in 1u32..50,
            deltas in prop::collection::vec(-20i64..20, 1..10),
        ) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let store = MemoryStore::new().with_cart_items(vec![line("a", 7, start)]);
            let a = CartItemId::from("a");

            rt.block_on(async {
                let mut cart = loaded(&store).await;
                for delta in deltas {
                    let item = cart.change_quantity(&store, &a, delta).await.unwrap();
                    prop_assert!(item.quantity().get() >= 1);
                    prop_assert_eq!(Some(item.total_price()), item.unit_price().checked_times(item.quantity()));
                }
                Ok(())
            })?;
        }
    }
}
