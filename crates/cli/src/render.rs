//! Plain-text rendering of catalog and cart state.

use std::fmt::Write;

use shelf_client::{CatalogCache, FilterView, Snapshot};
use shelf_core::{CartItem, Category, Product};

const RULE: &str = "------------------------------------------------------------------";

fn category_label(catalog: &CatalogCache, product: &Product) -> String {
    catalog
        .category_name(product.category_id)
        .map_or_else(|| format!("#{}", product.category_id), str::to_owned)
}

fn product_row(out: &mut String, catalog: &CatalogCache, product: &Product) {
    let _ = writeln!(
        out,
        "{:<5} {:<24} {:>10} {:<13} {}",
        product.id,
        product.name,
        product.price.to_string(),
        product.stock_status().label(),
        category_label(catalog, product),
    );
}

/// Product table for a filtered view.
#[must_use]
pub fn products(catalog: &CatalogCache, view: &FilterView<'_>) -> String {
    let products = match view {
        FilterView::NotLoaded => return "catalog not loaded\n".to_string(),
        FilterView::EmptyCatalog => return "no products\n".to_string(),
        FilterView::NoMatch => return "no match found\n".to_string(),
        FilterView::Matches(products) => products,
    };

    let mut out = format!(
        "{:<5} {:<24} {:>10} {:<13} {}\n{RULE}\n",
        "ID", "NAME", "PRICE", "STOCK", "CATEGORY"
    );
    for product in products {
        product_row(&mut out, catalog, product);
    }
    out
}

/// One product with its related strip.
#[must_use]
pub fn product_detail(catalog: &CatalogCache, product: &Product, related: &[Product]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} (#{})", product.name, product.id);
    let _ = writeln!(out, "  price:    {}", product.price);
    let _ = writeln!(
        out,
        "  stock:    {} ({})",
        product.stock,
        product.stock_status().label()
    );
    let _ = writeln!(out, "  category: {}", category_label(catalog, product));
    if !product.description.is_empty() {
        let _ = writeln!(out, "  about:    {}", product.description);
    }
    if !product.image_url.is_empty() {
        let _ = writeln!(out, "  image:    {}", product.image_url);
    }
    if let Some(created) = product.created_at {
        let _ = writeln!(out, "  created:  {}", created.to_rfc3339());
    }

    if !related.is_empty() {
        let _ = writeln!(out, "\nRelated:");
        for p in related {
            let _ = writeln!(out, "  #{:<4} {:<24} {}", p.id, p.name, p.price);
        }
    }
    out
}

/// Category list.
#[must_use]
pub fn categories(categories: &[Category]) -> String {
    if categories.is_empty() {
        return "no categories\n".to_string();
    }
    categories.iter().fold(String::new(), |mut out, c| {
        let _ = writeln!(out, "{:<5} {}", c.id, c.name);
        out
    })
}

/// One cart line.
#[must_use]
pub fn cart_line(item: &CartItem) -> String {
    format!(
        "{:<8} {:<24} {:>10} x{:<4} {:>10}",
        item.id(),
        item.product_name(),
        item.unit_price().to_string(),
        item.quantity(),
        item.total_price().to_string(),
    )
}

/// Cart table with totals.
#[must_use]
pub fn cart(snapshot: &Snapshot<'_>) -> String {
    if snapshot.cart.is_empty() {
        return "cart is empty\n".to_string();
    }

    let mut out = format!(
        "{:<8} {:<24} {:>10} {:<5} {:>10}\n{RULE}\n",
        "ITEM", "PRODUCT", "UNIT", "QTY", "TOTAL"
    );
    for item in snapshot.cart {
        let _ = writeln!(out, "{}", cart_line(item));
    }
    let _ = writeln!(out, "{RULE}");
    let _ = match snapshot.subtotal {
        Some(subtotal) => writeln!(out, "{} line(s), subtotal {subtotal}", snapshot.cart_count()),
        None => writeln!(out, "{} line(s), subtotal out of range", snapshot.cart_count()),
    };
    out
}
