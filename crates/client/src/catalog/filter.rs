//! Pure filtering over a product slice.
//!
//! Nothing here mutates its input; every function returns borrowed views
//! into the slice it was given.

use shelf_core::{CategoryId, Product};

/// Category half of a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// No category restriction.
    #[default]
    All,
    /// Only products whose `category_id` equals this id.
    Only(CategoryId),
}

impl From<CategoryId> for CategoryFilter {
    /// Category `0` is the "all categories" choice.
    fn from(id: CategoryId) -> Self {
        if id.is_unassigned() {
            Self::All
        } else {
            Self::Only(id)
        }
    }
}

/// Category and name filters, combined by conjunction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogFilter {
    category: CategoryFilter,
    name: Option<String>,
}

impl CatalogFilter {
    #[must_use]
    pub const fn category(&self) -> CategoryFilter {
        self.category
    }

    /// The active name term, already trimmed and lowercased.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_category(&mut self, category: impl Into<CategoryFilter>) {
        self.category = category.into();
    }

    /// Set the name term. A blank term clears the name filter.
    pub fn set_name(&mut self, term: &str) {
        let term = term.trim();
        self.name = (!term.is_empty()).then(|| term.to_lowercase());
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// `true` when neither half restricts anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.category == CategoryFilter::All && self.name.is_none()
    }

    /// Whether one product passes both halves.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        let category_ok = match self.category {
            CategoryFilter::All => true,
            CategoryFilter::Only(id) => product.category_id == id,
        };
        category_ok
            && self
                .name
                .as_deref()
                .is_none_or(|term| product.name.to_lowercase().contains(term))
    }
}

/// What the filtered catalog looks like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterView<'a> {
    /// Products have not been fetched yet.
    NotLoaded,
    /// Products were fetched and there are none.
    EmptyCatalog,
    /// The catalog has products but none pass the filter.
    NoMatch,
    /// Products passing the filter, in catalog order.
    Matches(Vec<&'a Product>),
}

impl<'a> FilterView<'a> {
    /// Matching products; empty for every other variant.
    #[must_use]
    pub fn products(&self) -> &[&'a Product] {
        match self {
            Self::Matches(products) => products,
            Self::NotLoaded | Self::EmptyCatalog | Self::NoMatch => &[],
        }
    }
}

/// Products in `category`; everything for [`CategoryFilter::All`].
#[must_use]
pub fn by_category(products: &[Product], category: CategoryFilter) -> Vec<&Product> {
    let mut filter = CatalogFilter::default();
    filter.set_category(category);
    apply(products, &filter)
}

/// Products whose name contains `term`, ignoring case. A blank term
/// matches everything.
#[must_use]
pub fn by_name<'a>(products: &'a [Product], term: &str) -> Vec<&'a Product> {
    let mut filter = CatalogFilter::default();
    filter.set_name(term);
    apply(products, &filter)
}

/// Products passing `filter`, in their original order.
#[must_use]
pub fn apply<'a>(products: &'a [Product], filter: &CatalogFilter) -> Vec<&'a Product> {
    products.iter().filter(|p| filter.matches(p)).collect()
}

/// Up to `limit` other products in the same category as `product`.
#[must_use]
pub fn related<'a>(products: &'a [Product], product: &Product, limit: usize) -> Vec<&'a Product> {
    products
        .iter()
        .filter(|p| p.category_id == product.category_id && p.id != product.id)
        .take(limit)
        .collect()
}

/// Classify the filtered catalog. `None` means the products were never
/// loaded.
#[must_use]
pub fn view<'a>(products: Option<&'a [Product]>, filter: &CatalogFilter) -> FilterView<'a> {
    match products {
        None => FilterView::NotLoaded,
        Some([]) => FilterView::EmptyCatalog,
        Some(products) => {
            let matches = apply(products, filter);
            if matches.is_empty() {
                FilterView::NoMatch
            } else {
                FilterView::Matches(matches)
            }
        }
    }
}
