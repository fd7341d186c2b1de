//! Catalog commands.

use clap::Args;
use rust_decimal::Decimal;
use shelf_client::{CartStore, CatalogStore, Coordinator, Result};
use shelf_core::{CategoryId, Price, ProductDraft, ProductId};
use tracing::info;

use crate::render;

/// Product fields settable from the command line.
#[derive(Debug, Default, Args)]
pub struct ProductFields {
    /// Product name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Description text
    #[arg(short, long)]
    pub description: Option<String>,

    /// Unit price (e.g. 9.99)
    #[arg(short, long)]
    pub price: Option<Decimal>,

    /// Units in stock
    #[arg(short, long)]
    pub stock: Option<u32>,

    /// Category id
    #[arg(short, long)]
    pub category: Option<i64>,

    /// Image URL
    #[arg(long)]
    pub image_url: Option<String>,
}

impl ProductFields {
    /// Overwrite the fields that were given; keep the rest.
    fn apply_to(self, draft: &mut ProductDraft) {
        if let Some(name) = self.name {
            draft.name = name;
        }
        if let Some(description) = self.description {
            draft.description = description;
        }
        if let Some(price) = self.price {
            draft.price = Price::new(price);
        }
        if let Some(stock) = self.stock {
            draft.stock = stock;
        }
        if let Some(category) = self.category {
            draft.category_id = CategoryId::new(category);
        }
        if let Some(image_url) = self.image_url {
            draft.image_url = image_url;
        }
    }
}

/// Filtered product table.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded.
pub async fn list<S: CatalogStore + CartStore>(
    shelf: &mut Coordinator<S>,
    category: Option<i64>,
    search: Option<&str>,
) -> Result<String> {
    shelf.load_catalog().await?;
    if let Some(category) = category {
        shelf.set_category_filter(CategoryId::new(category));
    }
    if let Some(term) = search {
        shelf.set_name_filter(term);
    }
    Ok(render::products(shelf.catalog(), &shelf.view()))
}

/// Category list.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded.
pub async fn categories<S: CatalogStore + CartStore>(shelf: &mut Coordinator<S>) -> Result<String> {
    shelf.load_catalog().await?;
    Ok(render::categories(
        shelf.catalog().categories().unwrap_or_default(),
    ))
}

/// One product and its related products.
///
/// # Errors
///
/// Returns an error if the product cannot be fetched.
pub async fn show<S: CatalogStore + CartStore>(
    shelf: &mut Coordinator<S>,
    id: ProductId,
) -> Result<String> {
    // Category names are a nicety; a failed catalog load does not stop the lookup
    if let Err(e) = shelf.load_catalog().await {
        tracing::warn!(error = %e, "Catalog not fully loaded");
    }
    let product = shelf.fetch_product(id).await?;
    let related = shelf.related_products(id).await?;
    Ok(render::product_detail(shelf.catalog(), &product, &related))
}

/// Create a product from the given fields.
///
/// # Errors
///
/// Returns an error if the draft is invalid or the store rejects it.
pub async fn create<S: CatalogStore + CartStore>(
    shelf: &mut Coordinator<S>,
    fields: ProductFields,
) -> Result<String> {
    shelf.load_catalog().await?;
    let mut draft = ProductDraft::default();
    fields.apply_to(&mut draft);

    let product = shelf.create_product(draft).await?;
    info!(id = %product.id, "Created product");
    Ok(format!("created product #{} {}\n", product.id, product.name))
}

/// Change the given fields of a product.
///
/// # Errors
///
/// Returns an error if the product is unknown, the result is invalid or the
/// store rejects the update.
pub async fn update<S: CatalogStore + CartStore>(
    shelf: &mut Coordinator<S>,
    id: ProductId,
    fields: ProductFields,
) -> Result<String> {
    shelf.load_catalog().await?;
    let mut draft = shelf
        .catalog()
        .product(id)
        .map(ProductDraft::from)
        .unwrap_or_default();
    fields.apply_to(&mut draft);

    let product = shelf.update_product(id, draft).await?;
    Ok(format!("updated product #{} {}\n", product.id, product.name))
}

/// Delete a product.
///
/// # Errors
///
/// Returns an error if the store rejects the delete.
pub async fn delete<S: CatalogStore + CartStore>(
    shelf: &mut Coordinator<S>,
    id: ProductId,
) -> Result<String> {
    shelf.load_catalog().await?;
    shelf.delete_product(id).await?;
    Ok(format!("deleted product #{id}\n"))
}
