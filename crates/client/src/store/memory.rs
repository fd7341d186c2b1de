//! In-memory resource store for tests.
//!
//! Behaves like a small JSON collection server: it assigns ids, answers
//! unknown ids with a 404 and records every call. Failures can be injected
//! per `(resource, operation)`; an injected failure short-circuits the call
//! before any state changes.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use shelf_core::{
    CartItem, CartItemDraft, CartItemId, Category, CategoryId, NewProduct, Price, Product,
    ProductId, Quantity, QuantityPatch, TotalOutOfRange,
};

use super::{CartStore, CatalogStore};
use crate::rest::{Operation, Resource, RestError};

/// A failure to return from the next matching call.
#[derive(Debug, Clone)]
enum Injected {
    Status(u16),
    InvalidShape,
}

#[derive(Debug, Default)]
struct State {
    products: Vec<Product>,
    categories: Vec<Category>,
    cart_items: Vec<CartItem>,
    next_cart_item: u64,
    failures: HashMap<(Resource, Operation), Injected>,
    requests: Vec<(Resource, Operation)>,
}

impl State {
    /// Record the call and consume any failure injected for it.
    fn begin(&mut self, resource: Resource, operation: Operation) -> Result<(), RestError> {
        self.requests.push((resource, operation));
        match self.failures.remove(&(resource, operation)) {
            None => Ok(()),
            Some(Injected::Status(status)) => Err(RestError::status(resource, operation, status)),
            Some(Injected::InvalidShape) => Err(RestError::InvalidResponseShape {
                resource,
                operation,
                reason: "expected an object, got string".to_string(),
            }),
        }
    }

    fn next_product_id(&self) -> ProductId {
        let max = self
            .products
            .iter()
            .map(|p| p.id.as_i64())
            .max()
            .unwrap_or(0);
        ProductId::new(max + 1)
    }

    fn next_cart_item_id(&mut self) -> CartItemId {
        loop {
            self.next_cart_item += 1;
            let candidate = CartItemId::new(format!("c{}", self.next_cart_item));
            if !self.cart_items.iter().any(|item| item.id() == &candidate) {
                return candidate;
            }
        }
    }
}

/// Thread-safe in-memory store implementing both store traits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the products collection.
    #[must_use]
    pub fn with_products(self, products: Vec<Product>) -> Self {
        self.lock().products = products;
        self
    }

    /// Seed the categories collection.
    #[must_use]
    pub fn with_categories(self, categories: Vec<Category>) -> Self {
        self.lock().categories = categories;
        self
    }

    /// Seed the cart.
    #[must_use]
    pub fn with_cart_items(self, items: Vec<CartItem>) -> Self {
        self.lock().cart_items = items;
        self
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next `operation` on `resource` fail with `status`.
    pub fn fail_next(&self, resource: Resource, operation: Operation, status: u16) {
        self.lock()
            .failures
            .insert((resource, operation), Injected::Status(status));
    }

    /// Make the next `operation` on `resource` return a malformed body.
    pub fn corrupt_next(&self, resource: Resource, operation: Operation) {
        self.lock()
            .failures
            .insert((resource, operation), Injected::InvalidShape);
    }

    /// Change a cart line behind the client's back, as another session
    /// would. Returns `false` if the line does not exist or its total would
    /// overflow.
    pub fn edit_cart_item(&self, id: &CartItemId, quantity: Quantity, unit_price: Price) -> bool {
        let mut state = self.lock();
        let Some(item) = state.cart_items.iter_mut().find(|item| item.id() == id) else {
            return false;
        };
        let Ok(edited) = CartItem::new(
            item.id().clone(),
            item.product_id(),
            item.product_name(),
            unit_price,
            quantity,
            item.user_id().clone(),
        ) else {
            return false;
        };
        *item = edited;
        true
    }

    /// Every call made so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<(Resource, Operation)> {
        self.lock().requests.clone()
    }

    /// Number of calls made so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.lock().requests.len()
    }

    /// Server-side products.
    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        self.lock().products.clone()
    }

    /// Server-side cart lines.
    #[must_use]
    pub fn cart_items(&self) -> Vec<CartItem> {
        self.lock().cart_items.clone()
    }
}

impl CatalogStore for MemoryStore {
    async fn list_products(&self) -> Result<Vec<Product>, RestError> {
        let mut state = self.lock();
        state.begin(Resource::Products, Operation::List)?;
        Ok(state.products.clone())
    }

    async fn list_products_in_category(
        &self,
        category: CategoryId,
        limit: usize,
    ) -> Result<Vec<Product>, RestError> {
        let mut state = self.lock();
        state.begin(Resource::Products, Operation::List)?;
        Ok(state
            .products
            .iter()
            .filter(|p| p.category_id == category)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get_product(&self, id: ProductId) -> Result<Product, RestError> {
        let mut state = self.lock();
        state.begin(Resource::Products, Operation::Get)?;
        state
            .products
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| RestError::status(Resource::Products, Operation::Get, 404))
    }

    async fn create_product(&self, product: &NewProduct) -> Result<Product, RestError> {
        let mut state = self.lock();
        state.begin(Resource::Products, Operation::Create)?;
        let created = Product {
            id: state.next_product_id(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            stock: product.stock,
            category_id: product.category_id,
            image_url: product.image_url.clone(),
            created_at: Some(product.created_at),
            modified_at: Some(product.modified_at),
        };
        state.products.push(created.clone());
        Ok(created)
    }

    async fn update_product(&self, product: &Product) -> Result<Product, RestError> {
        let mut state = self.lock();
        state.begin(Resource::Products, Operation::Update)?;
        let slot = state
            .products
            .iter_mut()
            .find(|p| p.id == product.id)
            .ok_or_else(|| RestError::status(Resource::Products, Operation::Update, 404))?;
        slot.clone_from(product);
        Ok(product.clone())
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), RestError> {
        let mut state = self.lock();
        state.begin(Resource::Products, Operation::Remove)?;
        let before = state.products.len();
        state.products.retain(|p| p.id != id);
        if state.products.len() == before {
            return Err(RestError::status(Resource::Products, Operation::Remove, 404));
        }
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RestError> {
        let mut state = self.lock();
        state.begin(Resource::Categories, Operation::List)?;
        Ok(state.categories.clone())
    }
}

/// What a client decoding the stored line over HTTP would report.
fn undecodable(operation: Operation, err: &TotalOutOfRange) -> RestError {
    RestError::InvalidResponseShape {
        resource: Resource::CartItems,
        operation,
        reason: err.to_string(),
    }
}

impl CartStore for MemoryStore {
    async fn list_cart_items(&self) -> Result<Vec<CartItem>, RestError> {
        let mut state = self.lock();
        state.begin(Resource::CartItems, Operation::List)?;
        Ok(state.cart_items.clone())
    }

    async fn create_cart_item(&self, draft: &CartItemDraft) -> Result<CartItem, RestError> {
        let mut state = self.lock();
        state.begin(Resource::CartItems, Operation::Create)?;
        let item = CartItem::new(
            state.next_cart_item_id(),
            draft.product_id,
            draft.product_name.clone(),
            draft.unit_price,
            draft.quantity,
            draft.user_id.clone(),
        )
        .map_err(|e| undecodable(Operation::Create, &e))?;
        state.cart_items.push(item.clone());
        Ok(item)
    }

    async fn patch_cart_item(
        &self,
        id: &CartItemId,
        patch: QuantityPatch,
    ) -> Result<CartItem, RestError> {
        let mut state = self.lock();
        state.begin(Resource::CartItems, Operation::Patch)?;
        let item = state
            .cart_items
            .iter_mut()
            .find(|item| item.id() == id)
            .ok_or_else(|| RestError::status(Resource::CartItems, Operation::Patch, 404))?;
        *item = CartItem::new(
            item.id().clone(),
            item.product_id(),
            item.product_name(),
            item.unit_price(),
            patch.quantity,
            item.user_id().clone(),
        )
        .map_err(|e| undecodable(Operation::Patch, &e))?;
        Ok(item.clone())
    }

    async fn delete_cart_item(&self, id: &CartItemId) -> Result<(), RestError> {
        let mut state = self.lock();
        state.begin(Resource::CartItems, Operation::Remove)?;
        let before = state.cart_items.len();
        state.cart_items.retain(|item| item.id() != id);
        if state.cart_items.len() == before {
            return Err(RestError::status(Resource::CartItems, Operation::Remove, 404));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shelf_core::UserId;

    use super::*;

    fn draft(product_id: i64) -> CartItemDraft {
        CartItemDraft {
            product_id: ProductId::new(product_id),
            product_name: "Widget".to_string(),
            unit_price: Price::from(10),
            quantity: Quantity::ONE,
            total_price: Price::from(10),
            user_id: UserId::new("1"),
        }
    }

    #[tokio::test]
    async fn test_overflowing_patch_is_invalid_shape() {
        let store = MemoryStore::new();
        let mut costly = draft(1);
        costly.unit_price = Price::new(rust_decimal::Decimal::MAX);
        costly.total_price = costly.unit_price;
        let line = store.create_cart_item(&costly).await.unwrap();

        let err = store
            .patch_cart_item(
                line.id(),
                QuantityPatch {
                    quantity: Quantity::new(2).unwrap(),
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_invalid_shape());
        assert_eq!(store.cart_items(), vec![line]);
    }

    #[tokio::test]
    async fn test_assigns_distinct_cart_ids() {
        let store = MemoryStore::new();
        let a = store.create_cart_item(&draft(1)).await.unwrap();
        let b = store.create_cart_item(&draft(2)).await.unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(store.cart_items().len(), 2);
    }

    #[tokio::test]
    async fn test_injected_failure_is_consumed_once() {
        let store = MemoryStore::new();
        store.fail_next(Resource::CartItems, Operation::Create, 503);

        let err = store.create_cart_item(&draft(1)).await.unwrap_err();
        assert!(err.is_request_failed());
        assert!(store.cart_items().is_empty());

        assert!(store.create_cart_item(&draft(1)).await.is_ok());
        assert_eq!(store.request_count(), 2);
    }

    #[tokio::test]
    async fn test_unknown_id_is_404() {
        let store = MemoryStore::new();
        let err = store.get_product(ProductId::new(7)).await.unwrap_err();
        assert_eq!(err.to_string(), "get products failed: HTTP 404");
    }
}
