//! Smoke tests against a real resource store.
//!
//! These tests require a running `json-server` (or compatible) store with
//! `products`, `categories` and `cartItems` collections.
//!
//! Run with: `SHELF_API_URL=http://localhost:3000/ cargo test -p shelf-integration-tests -- --ignored`

use reqwest::{Client, StatusCode};
use shelf_client::{ApiConfig, Coordinator, FilterView, RestClient};
use shelf_core::{Quantity, UserId};

/// Base URL for the store (configurable via environment).
fn api_base_url() -> String {
    std::env::var("SHELF_API_URL").unwrap_or_else(|_| "http://localhost:3000/".to_string())
}

fn coordinator() -> Coordinator<RestClient> {
    let config = ApiConfig::new(&api_base_url(), UserId::random_session())
        .expect("SHELF_API_URL must be an http(s) URL");
    Coordinator::new(RestClient::new(&config), config.user_id)
}

#[tokio::test]
#[ignore = "Requires a running JSON resource store"]
async fn test_store_serves_collections() {
    let client = Client::new();
    for collection in ["products", "categories", "cartItems"] {
        let resp = client
            .get(format!("{}{collection}", api_base_url()))
            .send()
            .await
            .expect("Failed to reach store");
        assert_eq!(resp.status(), StatusCode::OK, "GET /{collection}");
    }
}

#[tokio::test]
#[ignore = "Requires a running JSON resource store"]
async fn test_load_everything() {
    let mut shelf = coordinator();
    shelf.load_all().await.expect("Failed to load catalog and cart");

    assert_ne!(shelf.view(), FilterView::NotLoaded);
    assert!(shelf.catalog().categories_loaded());
    assert!(shelf.cart().is_loaded());
}

#[tokio::test]
#[ignore = "Requires a running JSON resource store"]
async fn test_cart_round_trip_cleans_up() {
    let mut shelf = coordinator();
    shelf.load_all().await.expect("Failed to load");

    let Some(product_id) = shelf.view().products().first().map(|p| p.id) else {
        // Nothing to add to the cart in an empty catalog
        return;
    };

    let line = shelf
        .add_to_cart(product_id, Quantity::ONE)
        .await
        .expect("Failed to add to cart");
    let line = shelf
        .decrement(line.id(), 3)
        .await
        .expect("Failed to decrement");
    assert_eq!(line.quantity().get(), 1);

    assert!(
        shelf
            .remove_from_cart(line.id())
            .await
            .expect("Failed to remove line")
    );
}
