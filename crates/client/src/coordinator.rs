//! Reconciliation coordinator.
//!
//! One [`Coordinator`] per session owns both caches, the active filter and
//! the store. Every write goes to the store first; the cache is patched only
//! from the confirmed response, with no `.await` between the response and
//! the patch. Writes take `&mut self`, so one coordinator never has two
//! mutations in flight.
//!
//! # Example
//!
//! ```rust,ignore
//! use shelf_client::{ApiConfig, Coordinator, RestClient};
//!
//! let config = ApiConfig::from_env()?;
//! let mut shelf = Coordinator::new(RestClient::new(&config), config.user_id);
//! shelf.load_all().await?;
//! shelf.set_name_filter("widget");
//! for product in shelf.view().products() {
//!     println!("{} {}", product.name, product.price);
//! }
//! ```

use chrono::Utc;
use shelf_core::{
    CartItem, CartItemId, Category, DraftError, Price, Product, ProductDraft, ProductId, Quantity,
    UserId,
};
use tracing::{debug, info, instrument};
use url::Url;

use crate::cart::CartCache;
use crate::catalog::{CatalogCache, CatalogFilter, CategoryFilter, FilterView, filter};
use crate::error::{Error, Result};
use crate::store::{CartStore, CatalogStore};

/// How many same-category products to request for the related strip. One
/// more than shown, since the product itself may be among them.
const RELATED_FETCH_LIMIT: usize = 4;

/// How many related products to show.
const RELATED_LIMIT: usize = 3;

/// Everything a renderer needs, borrowed from the coordinator.
#[derive(Debug, Clone)]
pub struct Snapshot<'a> {
    pub view: FilterView<'a>,
    pub filter: &'a CatalogFilter,
    pub categories: Option<&'a [Category]>,
    pub cart: &'a [CartItem],
    pub cart_loaded: bool,
    /// `None` if the sum of line totals overflows.
    pub subtotal: Option<Price>,
}

impl Snapshot<'_> {
    /// Number of cart lines.
    #[must_use]
    pub const fn cart_count(&self) -> usize {
        self.cart.len()
    }
}

/// Session state plus the store it reconciles against.
#[derive(Debug)]
pub struct Coordinator<S> {
    store: S,
    catalog: CatalogCache,
    cart: CartCache,
    filter: CatalogFilter,
    user_id: UserId,
    check_image_urls: bool,
}

impl<S> Coordinator<S>
where
    S: CatalogStore + CartStore,
{
    /// Start a session with empty, unloaded caches.
    pub fn new(store: S, user_id: UserId) -> Self {
        Self {
            store,
            catalog: CatalogCache::new(),
            cart: CartCache::new(),
            filter: CatalogFilter::default(),
            user_id,
            check_image_urls: false,
        }
    }

    /// Reject product drafts whose non-empty image URL does not parse.
    #[must_use]
    pub fn with_image_url_check(mut self, enabled: bool) -> Self {
        self.check_image_urls = enabled;
        self
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn catalog(&self) -> &CatalogCache {
        &self.catalog
    }

    pub const fn cart(&self) -> &CartCache {
        &self.cart
    }

    pub const fn filter(&self) -> &CatalogFilter {
        &self.filter
    }

    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Replace products and categories.
    ///
    /// # Errors
    ///
    /// Returns `Error::CatalogLoad` if either half failed.
    pub async fn load_catalog(&mut self) -> Result<()> {
        self.catalog.load_all(&self.store).await
    }

    /// Replace the cart.
    ///
    /// # Errors
    ///
    /// Returns `Error::Remote` if the list failed.
    pub async fn load_cart(&mut self) -> Result<()> {
        self.cart.load_all(&self.store).await
    }

    /// Load catalog and cart concurrently. Both are attempted even if one
    /// fails.
    ///
    /// # Errors
    ///
    /// Returns the failing side's error, or `Error::Load` carrying both when
    /// catalog and cart failed.
    #[instrument(skip(self))]
    pub async fn load_all(&mut self) -> Result<()> {
        let (catalog, cart) = tokio::join!(
            self.catalog.load_all(&self.store),
            self.cart.load_all(&self.store)
        );
        match (catalog, cart) {
            (Ok(()), Ok(())) => Ok(()),
            (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
            (Err(catalog), Err(cart)) => Err(Error::Load {
                catalog: Box::new(catalog),
                cart: Box::new(cart),
            }),
        }
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Fetch one product and refresh its cached copy, if there is one.
    ///
    /// # Errors
    ///
    /// Returns `Error::Remote` if the store has no such product or the
    /// request fails.
    #[instrument(skip(self))]
    pub async fn fetch_product(&mut self, id: ProductId) -> Result<Product> {
        let product = self.store.get_product(id).await?;
        if self.catalog.product(id).is_some() {
            self.catalog.apply_update(product.clone());
        }
        Ok(product)
    }

    /// Up to three other products from the same category, in store order.
    ///
    /// Uses the cached product when there is one and fetches it otherwise.
    ///
    /// # Errors
    ///
    /// Returns `Error::Remote` if either request fails.
    #[instrument(skip(self))]
    pub async fn related_products(&mut self, id: ProductId) -> Result<Vec<Product>> {
        let product = match self.catalog.product(id) {
            Some(product) => product.clone(),
            None => self.fetch_product(id).await?,
        };

        let candidates = self
            .store
            .list_products_in_category(product.category_id, RELATED_FETCH_LIMIT)
            .await?;

        Ok(filter::related(&candidates, &product, RELATED_LIMIT)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Create a product. The store assigns its id.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDraft` before sending anything if the draft is
    /// rejected, and `Error::Remote` if the store rejects the create.
    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn create_product(&mut self, draft: ProductDraft) -> Result<Product> {
        self.check_draft(&draft)?;

        let created = self
            .store
            .create_product(&draft.into_new(Utc::now()))
            .await?;

        info!(id = %created.id, "Product created");
        self.catalog.apply_create(created.clone());
        Ok(created)
    }

    /// Replace a cached product with `draft`, keeping its creation time.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the product is not cached,
    /// `Error::InvalidDraft` if the draft is rejected (both before sending
    /// anything), and `Error::Remote` if the store rejects the update.
    #[instrument(skip(self, draft))]
    pub async fn update_product(&mut self, id: ProductId, draft: ProductDraft) -> Result<Product> {
        let created_at = self
            .catalog
            .product(id)
            .ok_or_else(|| Error::product_not_found(id))?
            .created_at;
        self.check_draft(&draft)?;

        let replacement = draft.into_replacement(id, created_at, Utc::now());
        let confirmed = self.store.update_product(&replacement).await?;

        info!("Product updated");
        self.catalog.apply_update(confirmed.clone());
        Ok(confirmed)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `Error::Remote` if the store rejects the delete; the product
    /// stays cached.
    #[instrument(skip(self))]
    pub async fn delete_product(&mut self, id: ProductId) -> Result<()> {
        self.store.delete_product(id).await?;
        info!("Product deleted");
        self.catalog.apply_delete(id);
        Ok(())
    }

    fn check_draft(&self, draft: &ProductDraft) -> std::result::Result<(), DraftError> {
        draft.validate()?;
        if self.check_image_urls && !draft.image_url.is_empty() {
            Url::parse(&draft.image_url).map_err(|e| DraftError::InvalidImageUrl {
                url: draft.image_url.clone(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Add a cached product to the cart at its current price.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the product is not cached and
    /// `Error::CartItemCreateFailed` if the store rejects the line.
    #[instrument(skip(self))]
    pub async fn add_to_cart(&mut self, product_id: ProductId, quantity: Quantity) -> Result<CartItem> {
        let product = self
            .catalog
            .product(product_id)
            .ok_or_else(|| Error::product_not_found(product_id))?;
        self.cart
            .add_item(&self.store, product, quantity, &self.user_id)
            .await
    }

    /// Move a line's quantity by `delta`, never below one.
    ///
    /// # Errors
    ///
    /// See [`CartCache::change_quantity`].
    pub async fn change_quantity(&mut self, id: &CartItemId, delta: i64) -> Result<CartItem> {
        self.cart.change_quantity(&self.store, id, delta).await
    }

    /// Add `by` units to a line.
    ///
    /// # Errors
    ///
    /// See [`CartCache::change_quantity`].
    pub async fn increment(&mut self, id: &CartItemId, by: u32) -> Result<CartItem> {
        self.change_quantity(id, i64::from(by)).await
    }

    /// Take `by` units off a line, stopping at one.
    ///
    /// # Errors
    ///
    /// See [`CartCache::change_quantity`].
    pub async fn decrement(&mut self, id: &CartItemId, by: u32) -> Result<CartItem> {
        self.change_quantity(id, -i64::from(by)).await
    }

    /// Remove a line; `Ok(false)` if it was not cached.
    ///
    /// # Errors
    ///
    /// See [`CartCache::remove_item`].
    pub async fn remove_from_cart(&mut self, id: &CartItemId) -> Result<bool> {
        self.cart.remove_item(&self.store, id).await
    }

    // =========================================================================
    // Filters and views
    // =========================================================================

    pub fn set_category_filter(&mut self, category: impl Into<CategoryFilter>) {
        self.filter.set_category(category);
        debug!(filter = ?self.filter, "Category filter set");
    }

    pub fn set_name_filter(&mut self, term: &str) {
        self.filter.set_name(term);
        debug!(filter = ?self.filter, "Name filter set");
    }

    pub fn clear_filters(&mut self) {
        self.filter.clear();
    }

    /// Cached products under the active filter.
    #[must_use]
    pub fn view(&self) -> FilterView<'_> {
        self.catalog.view(&self.filter)
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            view: self.view(),
            filter: &self.filter,
            categories: self.catalog.categories(),
            cart: self.cart.items(),
            cart_loaded: self.cart.is_loaded(),
            subtotal: self.cart.subtotal(),
        }
    }
}
