//! Last-fetched products and categories.
//!
//! The cache is replaced wholesale by [`CatalogCache::load_all`] and patched
//! in place only after the store has confirmed a write. Each half tracks its
//! own loaded state, so a partial load keeps the half that succeeded.

pub mod filter;

use shelf_core::{Category, CategoryId, Product, ProductId};
use tracing::{debug, instrument, warn};

use crate::error::{Error, Result};
use crate::store::CatalogStore;

pub use filter::{CatalogFilter, CategoryFilter, FilterView};

#[derive(Debug, Clone, Default)]
pub struct CatalogCache {
    products: Option<Vec<Product>>,
    categories: Option<Vec<Category>>,
}

impl CatalogCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch products and categories concurrently and replace both.
    ///
    /// # Errors
    ///
    /// Returns `Error::CatalogLoad` naming each half that failed. The half
    /// that succeeded is stored regardless; a failed half keeps its previous
    /// contents.
    #[instrument(skip_all)]
    pub async fn load_all(&mut self, store: &impl CatalogStore) -> Result<()> {
        let (products, categories) = tokio::join!(store.list_products(), store.list_categories());

        let products = match products {
            Ok(products) => {
                debug!(count = products.len(), "Loaded products");
                self.products = Some(products);
                None
            }
            Err(e) => Some(e),
        };
        let categories = match categories {
            Ok(categories) => {
                debug!(count = categories.len(), "Loaded categories");
                self.categories = Some(categories);
                None
            }
            Err(e) => Some(e),
        };

        if products.is_none() && categories.is_none() {
            Ok(())
        } else {
            Err(Error::CatalogLoad {
                products,
                categories,
            })
        }
    }

    // =========================================================================
    // Patches (applied only after a confirmed write)
    // =========================================================================

    /// Append a product the store has created.
    pub(crate) fn apply_create(&mut self, product: Product) {
        match self.products.as_mut() {
            Some(products) => products.push(product),
            // A lone product must not make an unfetched catalog look loaded
            None => debug!(id = %product.id, "Products not loaded; created product not cached"),
        }
    }

    /// Replace the cached product with the same id.
    pub(crate) fn apply_update(&mut self, product: Product) {
        let slot = self
            .products
            .as_mut()
            .and_then(|products| products.iter_mut().find(|p| p.id == product.id));
        match slot {
            Some(slot) => *slot = product,
            None => warn!(id = %product.id, "Updated product is not cached"),
        }
    }

    /// Drop the cached product with `id`, if any.
    pub(crate) fn apply_delete(&mut self, id: ProductId) {
        if let Some(products) = self.products.as_mut() {
            products.retain(|p| p.id != id);
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// `None` until products have been loaded.
    #[must_use]
    pub fn products(&self) -> Option<&[Product]> {
        self.products.as_deref()
    }

    /// `None` until categories have been loaded.
    #[must_use]
    pub fn categories(&self) -> Option<&[Category]> {
        self.categories.as_deref()
    }

    #[must_use]
    pub const fn products_loaded(&self) -> bool {
        self.products.is_some()
    }

    #[must_use]
    pub const fn categories_loaded(&self) -> bool {
        self.categories.is_some()
    }

    #[must_use]
    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products()?.iter().find(|p| p.id == id)
    }

    #[must_use]
    pub fn category(&self, id: CategoryId) -> Option<&Category> {
        self.categories()?.iter().find(|c| c.id == id)
    }

    /// Display name of a category, if it is cached.
    #[must_use]
    pub fn category_name(&self, id: CategoryId) -> Option<&str> {
        self.category(id).map(|c| c.name.as_str())
    }

    /// "Last id + 1", for showing a tentative id on a create form.
    ///
    /// Never sent: drafts carry no id and the store assigns the real one.
    #[must_use]
    pub fn preview_next_id(&self) -> ProductId {
        let last = self
            .products()
            .and_then(<[Product]>::last)
            .map_or(0, |p| p.id.as_i64());
        ProductId::new(last + 1)
    }

    /// Filtered view of the cached products.
    #[must_use]
    pub fn view(&self, filter: &CatalogFilter) -> FilterView<'_> {
        filter::view(self.products(), filter)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shelf_core::Price;

    use super::*;
    use crate::rest::{Operation, Resource};
    use crate::store::memory::MemoryStore;

    fn product(id: i64, name: &str, category: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            description: String::new(),
            price: Price::from(5),
            stock: 1,
            category_id: CategoryId::new(category),
            image_url: String::new(),
            created_at: None,
            modified_at: None,
        }
    }

    fn category(id: i64, name: &str) -> Category {
        Category {
            id: CategoryId::new(id),
            name: name.to_string(),
        }
    }

    fn seeded() -> MemoryStore {
        MemoryStore::new()
            .with_products(vec![product(1, "Widget", 2), product(4, "Gadget", 3)])
            .with_categories(vec![category(2, "Tools"), category(3, "Toys")])
    }

    #[tokio::test]
    async fn test_load_all_replaces_both_halves() {
        let store = seeded();
        let mut cache = CatalogCache::new();
        assert!(!cache.products_loaded());

        cache.load_all(&store).await.unwrap();
        assert_eq!(cache.products().unwrap().len(), 2);
        assert_eq!(cache.category_name(CategoryId::new(3)), Some("Toys"));
        assert_eq!(cache.product(ProductId::new(4)).unwrap().name, "Gadget");
    }

    #[tokio::test]
    async fn test_partial_load_keeps_successful_half() {
        let store = seeded();
        store.fail_next(Resource::Categories, Operation::List, 500);

        let mut cache = CatalogCache::new();
        let err = cache.load_all(&store).await.unwrap_err();

        assert!(matches!(
            err,
            Error::CatalogLoad {
                products: None,
                categories: Some(_)
            }
        ));
        assert!(cache.products_loaded());
        assert!(!cache.categories_loaded());
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_contents() {
        let store = seeded();
        let mut cache = CatalogCache::new();
        cache.load_all(&store).await.unwrap();

        store.corrupt_next(Resource::Products, Operation::List);
        let err = cache.load_all(&store).await.unwrap_err();
        assert!(err.remote().is_some_and(crate::rest::RestError::is_invalid_shape));
        assert_eq!(cache.products().unwrap().len(), 2);
    }

    #[test]
    fn test_apply_create_needs_loaded_products() {
        let mut cache = CatalogCache::new();
        cache.apply_create(product(9, "Lamp", 1));
        assert!(!cache.products_loaded());
        assert_eq!(cache.view(&CatalogFilter::default()), FilterView::NotLoaded);
    }

    #[tokio::test]
    async fn test_apply_patches() {
        let store = seeded();
        let mut cache = CatalogCache::new();
        cache.load_all(&store).await.unwrap();

        cache.apply_create(product(5, "Lamp", 2));
        assert_eq!(cache.preview_next_id(), ProductId::new(6));

        cache.apply_update(product(1, "Widget v2", 2));
        assert_eq!(cache.product(ProductId::new(1)).unwrap().name, "Widget v2");

        // Unknown ids are a no-op
        cache.apply_update(product(77, "Ghost", 2));
        cache.apply_delete(ProductId::new(77));
        assert_eq!(cache.products().unwrap().len(), 3);

        cache.apply_delete(ProductId::new(4));
        let ids: Vec<i64> = cache.products().unwrap().iter().map(|p| p.id.as_i64()).collect();
        assert_eq!(ids, vec![1, 5]);
    }

    #[test]
    fn test_preview_next_id_on_empty_catalog() {
        assert_eq!(CatalogCache::new().preview_next_id(), ProductId::new(1));
    }
}
