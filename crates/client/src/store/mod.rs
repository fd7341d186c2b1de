//! Collaborator interfaces for the remote catalog and cart.
//!
//! The caches and the coordinator only talk to these traits. [`RestClient`]
//! implements both over HTTP; the `test-util` feature adds an in-memory
//! implementation with failure injection.

#[cfg(any(test, feature = "test-util"))]
pub mod memory;

use std::future::Future;

use shelf_core::{
    CartItem, CartItemDraft, CartItemId, Category, CategoryId, NewProduct, Product, ProductId,
    QuantityPatch,
};

use crate::rest::{Resource, RestClient, RestError};

/// Products (read/write) and categories (read-only).
pub trait CatalogStore {
    /// All products.
    fn list_products(&self) -> impl Future<Output = Result<Vec<Product>, RestError>> + Send;

    /// Up to `limit` products in one category, in store order.
    fn list_products_in_category(
        &self,
        category: CategoryId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Product>, RestError>> + Send;

    /// One product by id.
    fn get_product(&self, id: ProductId)
    -> impl Future<Output = Result<Product, RestError>> + Send;

    /// Create a product; the store assigns the id.
    fn create_product(
        &self,
        product: &NewProduct,
    ) -> impl Future<Output = Result<Product, RestError>> + Send;

    /// Replace a product wholesale.
    fn update_product(
        &self,
        product: &Product,
    ) -> impl Future<Output = Result<Product, RestError>> + Send;

    /// Delete a product.
    fn delete_product(&self, id: ProductId) -> impl Future<Output = Result<(), RestError>> + Send;

    /// All categories.
    fn list_categories(&self) -> impl Future<Output = Result<Vec<Category>, RestError>> + Send;
}

/// Cart lines.
pub trait CartStore {
    /// All cart lines.
    fn list_cart_items(&self) -> impl Future<Output = Result<Vec<CartItem>, RestError>> + Send;

    /// Create a cart line; the store assigns the id.
    fn create_cart_item(
        &self,
        draft: &CartItemDraft,
    ) -> impl Future<Output = Result<CartItem, RestError>> + Send;

    /// Change only the quantity of a line.
    fn patch_cart_item(
        &self,
        id: &CartItemId,
        patch: QuantityPatch,
    ) -> impl Future<Output = Result<CartItem, RestError>> + Send;

    /// Delete a cart line.
    fn delete_cart_item(&self, id: &CartItemId)
    -> impl Future<Output = Result<(), RestError>> + Send;
}

// =============================================================================
// HTTP implementation
// =============================================================================

impl CatalogStore for RestClient {
    async fn list_products(&self) -> Result<Vec<Product>, RestError> {
        self.list(Resource::Products).await
    }

    async fn list_products_in_category(
        &self,
        category: CategoryId,
        limit: usize,
    ) -> Result<Vec<Product>, RestError> {
        let query = [
            ("categoryId", category.to_string()),
            ("_limit", limit.to_string()),
        ];
        self.list_where(Resource::Products, &query).await
    }

    async fn get_product(&self, id: ProductId) -> Result<Product, RestError> {
        self.get(Resource::Products, &id.to_string()).await
    }

    async fn create_product(&self, product: &NewProduct) -> Result<Product, RestError> {
        self.create(Resource::Products, product).await
    }

    async fn update_product(&self, product: &Product) -> Result<Product, RestError> {
        self.update(Resource::Products, &product.id.to_string(), product)
            .await
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), RestError> {
        self.remove(Resource::Products, &id.to_string()).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RestError> {
        self.list(Resource::Categories).await
    }
}

impl CartStore for RestClient {
    async fn list_cart_items(&self) -> Result<Vec<CartItem>, RestError> {
        self.list(Resource::CartItems).await
    }

    async fn create_cart_item(&self, draft: &CartItemDraft) -> Result<CartItem, RestError> {
        self.create(Resource::CartItems, draft).await
    }

    async fn patch_cart_item(
        &self,
        id: &CartItemId,
        patch: QuantityPatch,
    ) -> Result<CartItem, RestError> {
        self.patch(Resource::CartItems, id.as_str(), &patch).await
    }

    async fn delete_cart_item(&self, id: &CartItemId) -> Result<(), RestError> {
        self.remove(Resource::CartItems, id.as_str()).await
    }
}
