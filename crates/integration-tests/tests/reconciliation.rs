//! End-to-end reconciliation flows over real HTTP.
//!
//! Each test drives a `Coordinator<RestClient>` against the fixture server
//! and checks both the cached state and what the server holds afterwards.

use axum::http::Method;
use serde_json::json;
use shelf_client::store::memory::MemoryStore;
use shelf_client::{CartStore, CatalogStore, Coordinator, Error, FilterView};
use shelf_core::{CartItemId, CategoryId, Price, ProductDraft, ProductId, Quantity, UserId};
use shelf_integration_tests::{FixtureServer, demo_seed};

fn lamp() -> ProductDraft {
    ProductDraft {
        name: "Desk Lamp".to_string(),
        description: "Adjustable".to_string(),
        price: Price::from_cents(2450),
        stock: 5,
        category_id: CategoryId::new(1),
        image_url: "https://example.com/lamp.png".to_string(),
    }
}

#[tokio::test]
async fn test_widget_filter_scenario() {
    let server = FixtureServer::start(demo_seed()).await;
    let mut shelf = server.coordinator("1");
    shelf.load_all().await.unwrap();

    shelf.set_category_filter(CategoryId::new(2));
    shelf.set_name_filter("widget");
    let names: Vec<&str> = shelf.view().products().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Widget", "Widget Deluxe"]);

    shelf.set_category_filter(CategoryId::new(9));
    assert_eq!(shelf.view(), FilterView::NoMatch);

    shelf.clear_filters();
    assert_eq!(shelf.view().products().len(), 4);
}

#[tokio::test]
async fn test_quantity_scenario() {
    let server = FixtureServer::start(demo_seed()).await;
    let mut shelf = server.coordinator("1");
    shelf.load_cart().await.unwrap();
    let a = CartItemId::from("a");

    let item = shelf.change_quantity(&a, -5).await.unwrap();
    assert_eq!(item.quantity().get(), 1);
    assert_eq!(item.total_price(), Price::from(10));

    let item = shelf.change_quantity(&a, 1).await.unwrap();
    assert_eq!(item.quantity().get(), 2);
    assert_eq!(item.total_price(), Price::from(20));

    // Only quantities were sent, and a clamped patch is still sent
    let patches: Vec<_> = server
        .requests()
        .into_iter()
        .filter(|r| r.method == Method::PATCH)
        .filter_map(|r| r.body)
        .collect();
    assert_eq!(patches, vec![json!({ "quantity": 1 }), json!({ "quantity": 2 })]);
}

#[tokio::test]
async fn test_server_values_win_on_patch() {
    let server = FixtureServer::start(demo_seed()).await;
    let mut shelf = server.coordinator("1");
    shelf.load_cart().await.unwrap();

    // Another client repriced the line
    server.set_field("cartItems", "a", "unitPrice", json!(12));

    let item = shelf
        .increment(&CartItemId::from("a"), 1)
        .await
        .unwrap();
    assert_eq!(item.unit_price(), Price::from(12));
    assert_eq!(item.total_price(), Price::from(36));
    assert_eq!(shelf.cart().subtotal(), Some(Price::from(36)));
}

#[tokio::test]
async fn test_remove_unknown_line_sends_nothing() {
    let server = FixtureServer::start(demo_seed()).await;
    let mut shelf = server.coordinator("1");
    shelf.load_cart().await.unwrap();
    let before = server.requests().len();

    assert!(!shelf.remove_from_cart(&CartItemId::from("nope")).await.unwrap());
    assert_eq!(server.requests().len(), before);
    assert_eq!(shelf.cart().count(), 1);
}

#[tokio::test]
async fn test_add_to_cart_gets_server_id() {
    let server = FixtureServer::start(demo_seed()).await;
    let mut shelf = server.coordinator("u-42");
    shelf.load_all().await.unwrap();

    let item = shelf
        .add_to_cart(ProductId::new(4), Quantity::new(2).unwrap())
        .await
        .unwrap();

    assert_ne!(item.id().as_str(), "a");
    assert_eq!(item.unit_price(), Price::from_cents(2499));
    assert_eq!(item.total_price(), Price::from_cents(4998));
    assert_eq!(shelf.snapshot().cart_count(), 2);

    let stored = server.collection("cartItems");
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[1]["userId"], "u-42");
    assert_eq!(stored[1]["productName"], "Widget Deluxe");
}

#[tokio::test]
async fn test_failed_mutations_leave_caches_equal() {
    let server = FixtureServer::start(demo_seed()).await;
    let mut shelf = server.coordinator("1");
    shelf.load_all().await.unwrap();
    let products = shelf.catalog().products().unwrap().to_vec();
    let cart = shelf.cart().items().to_vec();

    server.fail_next(Method::POST, "products", 500);
    assert!(shelf.create_product(lamp()).await.is_err());

    server.fail_next(Method::POST, "cartItems", 500);
    let err = shelf
        .add_to_cart(ProductId::new(2), Quantity::ONE)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::CartItemCreateFailed { .. }));

    server.respond_next(Method::PATCH, "cartItems", json!("ok"));
    let err = shelf
        .change_quantity(&CartItemId::from("a"), 3)
        .await
        .unwrap_err();
    assert!(err.remote().is_some_and(shelf_client::RestError::is_invalid_shape));

    server.fail_next(Method::DELETE, "cartItems", 404);
    assert!(shelf.remove_from_cart(&CartItemId::from("a")).await.is_err());

    assert_eq!(shelf.catalog().products().unwrap(), products.as_slice());
    assert_eq!(shelf.cart().items(), cart.as_slice());
}

#[tokio::test]
async fn test_product_lifecycle() {
    let server = FixtureServer::start(demo_seed()).await;
    let mut shelf = server.coordinator("1");
    shelf.load_catalog().await.unwrap();

    let created = shelf.create_product(lamp()).await.unwrap();
    assert_eq!(created.id, ProductId::new(5));
    let body = server.requests().pop().unwrap().body.unwrap();
    assert!(body.get("id").is_none());
    assert_eq!(body["createdAt"], body["modifiedAt"]);

    let mut draft = ProductDraft::from(&created);
    draft.stock = 0;
    let updated = shelf.update_product(created.id, draft).await.unwrap();
    assert_eq!(updated.created_at, created.created_at);
    assert!(!shelf.catalog().product(created.id).unwrap().in_stock());

    shelf.delete_product(created.id).await.unwrap();
    assert!(shelf.catalog().product(created.id).is_none());
    assert_eq!(server.collection("products").len(), 4);
}

#[tokio::test]
async fn test_related_products() {
    let server = FixtureServer::start(demo_seed()).await;
    let mut shelf = server.coordinator("1");

    // Not cached: the product itself is fetched first
    let related = shelf.related_products(ProductId::new(3)).await.unwrap();
    let ids: Vec<i64> = related.iter().map(|p| p.id.as_i64()).collect();
    assert_eq!(ids, vec![1, 4]);

    let last = server.requests().pop().unwrap();
    assert_eq!(last.path, "/products");
}

#[tokio::test]
async fn test_partial_catalog_load() {
    let server = FixtureServer::start(demo_seed()).await;
    server.fail_next(Method::GET, "categories", 500);

    let mut shelf = server.coordinator("1");
    let err = shelf.load_catalog().await.unwrap_err();

    assert!(matches!(
        err,
        Error::CatalogLoad {
            products: None,
            categories: Some(_)
        }
    ));
    assert!(shelf.catalog().products_loaded());
    assert!(shelf.catalog().categories().is_none());
    assert_eq!(shelf.view().products().len(), 4);
}

#[tokio::test]
async fn test_load_all_reports_both_failures() {
    let server = FixtureServer::start(demo_seed()).await;
    server.fail_next(Method::GET, "products", 500);
    server.fail_next(Method::GET, "cartItems", 503);

    let mut shelf = server.coordinator("1");
    let err = shelf.load_all().await.unwrap_err();

    assert!(matches!(err, Error::Load { .. }));
    let message = err.to_string();
    assert!(message.contains("list products failed: HTTP 500"));
    assert!(message.contains("list cartItems failed: HTTP 503"));
    assert!(shelf.catalog().categories_loaded());
    assert!(!shelf.cart().is_loaded());
}

/// Run the same cart flow against any store and report the resulting lines.
async fn cart_flow<S: CatalogStore + CartStore>(shelf: &mut Coordinator<S>) -> Vec<(String, u32, Price)> {
    shelf.load_all().await.unwrap();
    let line = shelf
        .add_to_cart(ProductId::new(2), Quantity::new(3).unwrap())
        .await
        .unwrap();
    shelf.decrement(line.id(), 1).await.unwrap();
    shelf.increment(&CartItemId::from("a"), 2).await.unwrap();

    shelf
        .cart()
        .items()
        .iter()
        .map(|i| (i.product_name().to_string(), i.quantity().get(), i.total_price()))
        .collect()
}

#[tokio::test]
async fn test_http_and_memory_stores_agree() {
    let server = FixtureServer::start(demo_seed()).await;
    let mut over_http = server.coordinator("1");

    let seed = demo_seed();
    let store = MemoryStore::new()
        .with_products(serde_json::from_value(seed["products"].clone()).unwrap())
        .with_categories(serde_json::from_value(seed["categories"].clone()).unwrap())
        .with_cart_items(serde_json::from_value(seed["cartItems"].clone()).unwrap());
    let mut in_memory = Coordinator::new(store, UserId::new("1"));

    let http_lines = cart_flow(&mut over_http).await;
    let memory_lines = cart_flow(&mut in_memory).await;

    assert_eq!(http_lines, memory_lines);
    assert_eq!(
        http_lines,
        vec![
            ("Yo-yo".to_string(), 4, Price::from(40)),
            ("Hammer".to_string(), 2, Price::from(31)),
        ]
    );
}
