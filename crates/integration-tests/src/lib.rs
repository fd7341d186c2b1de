//! Integration tests for Shelf.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests (no external services)
//! cargo test -p shelf-integration-tests
//!
//! # Tests against a running store (e.g. `json-server --watch db.json --port 3000`)
//! SHELF_API_URL=http://localhost:3000/ cargo test -p shelf-integration-tests -- --ignored
//! ```
//!
//! # Fixture Server
//!
//! [`FixtureServer`] is a small JSON collection server in the style of
//! `json-server`, bound to an ephemeral port:
//!
//! - `GET /{collection}` with equality filters on any field plus `_limit`
//! - `GET|PUT|PATCH|DELETE /{collection}/{id}`
//! - `POST /{collection}` assigning a fresh id
//!
//! New ids are numbers, unless the collection already holds a string id, in
//! which case they are short strings. Any call can be made to fail with a
//! status or to answer with an arbitrary body, and every request is
//! recorded with its JSON body.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path, Query, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Map, Value, json};
use shelf_client::{Coordinator, RestClient};
use shelf_core::UserId;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A request as the fixture saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
enum Injected {
    Status(u16),
    Body(Value),
}

#[derive(Debug, Default)]
struct FixtureState {
    collections: HashMap<String, Vec<Value>>,
    injected: HashMap<(Method, String), Injected>,
    requests: Vec<RecordedRequest>,
    next_text_id: u64,
}

type Shared = Arc<Mutex<FixtureState>>;

fn lock(state: &Shared) -> MutexGuard<'_, FixtureState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Render a stored id the way it appears in a URL.
fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn has_id(item: &Value, id: &str) -> bool {
    item.get("id").and_then(id_text).as_deref() == Some(id)
}

fn reply(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn not_found() -> Response {
    reply(StatusCode::NOT_FOUND, json!({}))
}

impl FixtureState {
    /// Record the request; return the injected reply for it, if any.
    fn begin(
        &mut self,
        method: &Method,
        collection: &str,
        path: String,
        body: Option<&Value>,
    ) -> Option<Response> {
        self.requests.push(RecordedRequest {
            method: method.clone(),
            path,
            body: body.cloned(),
        });
        match self.injected.remove(&(method.clone(), collection.to_string()))? {
            Injected::Status(code) => {
                let status =
                    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                Some(reply(status, json!({ "error": "injected failure" })))
            }
            Injected::Body(body) => Some(reply(StatusCode::OK, body)),
        }
    }

    fn next_id(&mut self, collection: &str) -> Value {
        let items = self.collections.get(collection).map_or(&[][..], Vec::as_slice);
        let text_ids = items
            .iter()
            .any(|item| item.get("id").is_some_and(Value::is_string));
        let max_numeric = items
            .iter()
            .filter_map(|item| item.get("id").and_then(Value::as_i64))
            .max()
            .unwrap_or(0);
        let taken: Vec<String> = items
            .iter()
            .filter_map(|item| item.get("id").and_then(id_text))
            .collect();

        if !text_ids {
            return json!(max_numeric + 1);
        }
        loop {
            self.next_text_id += 1;
            let candidate = format!("{:04x}", self.next_text_id);
            if !taken.contains(&candidate) {
                return Value::String(candidate);
            }
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn list(
    State(state): State<Shared>,
    Path(collection): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
) -> Response {
    let mut state = lock(&state);
    let path = format!("/{collection}");
    if let Some(injected) = state.begin(&Method::GET, &collection, path, None) {
        return injected;
    }

    let Some(items) = state.collections.get(&collection) else {
        return not_found();
    };

    let mut limit = None;
    let mut filters = Vec::new();
    for (key, value) in query {
        if key == "_limit" {
            limit = value.parse::<usize>().ok();
        } else {
            filters.push((key, value));
        }
    }

    let matches: Vec<Value> = items
        .iter()
        .filter(|item| {
            filters.iter().all(|(key, expected)| {
                item.get(key).and_then(id_text).as_deref() == Some(expected.as_str())
            })
        })
        .take(limit.unwrap_or(usize::MAX))
        .cloned()
        .collect();

    reply(StatusCode::OK, Value::Array(matches))
}

async fn create(
    State(state): State<Shared>,
    Path(collection): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = lock(&state);
    let path = format!("/{collection}");
    if let Some(injected) = state.begin(&Method::POST, &collection, path, Some(&body)) {
        return injected;
    }

    let Value::Object(mut fields) = body else {
        return reply(StatusCode::BAD_REQUEST, json!({ "error": "expected object" }));
    };
    fields.insert("id".to_string(), state.next_id(&collection));
    let created = Value::Object(fields);

    state
        .collections
        .entry(collection)
        .or_default()
        .push(created.clone());
    reply(StatusCode::CREATED, created)
}

async fn fetch(
    State(state): State<Shared>,
    Path((collection, id)): Path<(String, String)>,
) -> Response {
    let mut state = lock(&state);
    let path = format!("/{collection}/{id}");
    if let Some(injected) = state.begin(&Method::GET, &collection, path, None) {
        return injected;
    }

    state
        .collections
        .get(&collection)
        .and_then(|items| items.iter().find(|item| has_id(item, &id)))
        .map_or_else(not_found, |item| reply(StatusCode::OK, item.clone()))
}

async fn replace(
    State(state): State<Shared>,
    Path((collection, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    write_item(&state, Method::PUT, collection, id, body, |item, body| {
        let stored_id = item.get("id").cloned();
        *item = Value::Object(body);
        if let (Some(stored_id), Value::Object(fields)) = (stored_id, item) {
            fields.insert("id".to_string(), stored_id);
        }
    })
}

async fn patch(
    State(state): State<Shared>,
    Path((collection, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    write_item(&state, Method::PATCH, collection, id, body, |item, body| {
        if let Value::Object(fields) = item {
            for (key, value) in body {
                if key != "id" {
                    fields.insert(key, value);
                }
            }
        }
    })
}

fn write_item(
    state: &Shared,
    method: Method,
    collection: String,
    id: String,
    body: Value,
    apply: impl FnOnce(&mut Value, Map<String, Value>),
) -> Response {
    let mut state = lock(state);
    let path = format!("/{collection}/{id}");
    if let Some(injected) = state.begin(&method, &collection, path, Some(&body)) {
        return injected;
    }

    let Value::Object(fields) = body else {
        return reply(StatusCode::BAD_REQUEST, json!({ "error": "expected object" }));
    };
    let Some(item) = state
        .collections
        .get_mut(&collection)
        .and_then(|items| items.iter_mut().find(|item| has_id(item, &id)))
    else {
        return not_found();
    };

    apply(item, fields);
    reply(StatusCode::OK, item.clone())
}

async fn remove(
    State(state): State<Shared>,
    Path((collection, id)): Path<(String, String)>,
) -> Response {
    let mut state = lock(&state);
    let path = format!("/{collection}/{id}");
    if let Some(injected) = state.begin(&Method::DELETE, &collection, path, None) {
        return injected;
    }

    let Some(items) = state.collections.get_mut(&collection) else {
        return not_found();
    };
    let before = items.len();
    items.retain(|item| !has_id(item, &id));
    if items.len() == before {
        return not_found();
    }
    reply(StatusCode::OK, json!({}))
}

// =============================================================================
// FixtureServer
// =============================================================================

/// In-process JSON collection server on `127.0.0.1`.
///
/// The server task is aborted when this value is dropped.
pub struct FixtureServer {
    addr: SocketAddr,
    state: Shared,
    task: JoinHandle<()>,
}

impl FixtureServer {
    /// Start a server seeded from a `db.json`-style object mapping
    /// collection names to arrays.
    ///
    /// # Panics
    ///
    /// Panics if the seed is not an object of arrays or the port cannot be
    /// bound.
    pub async fn start(seed: Value) -> Self {
        let Value::Object(seed) = seed else {
            panic!("fixture seed must be an object of collections");
        };

        let mut collections = HashMap::new();
        for (name, items) in seed {
            let Value::Array(items) = items else {
                panic!("fixture collection {name} must be an array");
            };
            collections.insert(name, items);
        }

        let state: Shared = Arc::new(Mutex::new(FixtureState {
            collections,
            ..FixtureState::default()
        }));

        let app = Router::new()
            .route("/{collection}", get(list).post(create))
            .route(
                "/{collection}/{id}",
                get(fetch).put(replace).patch(patch).delete(remove),
            )
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap_or_else(|e| panic!("failed to bind fixture server: {e}"));
        let addr = listener
            .local_addr()
            .unwrap_or_else(|e| panic!("fixture server has no address: {e}"));

        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                panic!("fixture server stopped: {e}");
            }
        });

        Self { addr, state, task }
    }

    /// Base URL with a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// A client pointed at this server.
    ///
    /// # Panics
    ///
    /// Panics if the base URL does not parse, which cannot happen for a
    /// socket address.
    #[must_use]
    pub fn client(&self) -> RestClient {
        let config = shelf_client::ApiConfig::new(&self.base_url(), UserId::new("1"))
            .unwrap_or_else(|e| panic!("fixture URL rejected: {e}"));
        RestClient::new(&config)
    }

    /// A fresh session against this server.
    #[must_use]
    pub fn coordinator(&self, user_id: &str) -> Coordinator<RestClient> {
        Coordinator::new(self.client(), UserId::new(user_id))
    }

    /// Make the next `method` request on `collection` fail with `status`.
    pub fn fail_next(&self, method: Method, collection: &str, status: u16) {
        lock(&self.state)
            .injected
            .insert((method, collection.to_string()), Injected::Status(status));
    }

    /// Make the next `method` request on `collection` answer 200 with `body`.
    pub fn respond_next(&self, method: Method, collection: &str, body: Value) {
        lock(&self.state)
            .injected
            .insert((method, collection.to_string()), Injected::Body(body));
    }

    /// Current contents of a collection.
    #[must_use]
    pub fn collection(&self, name: &str) -> Vec<Value> {
        lock(&self.state)
            .collections
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    /// Change one field of a stored item, as another client would.
    pub fn set_field(&self, collection: &str, id: &str, field: &str, value: Value) {
        let mut state = lock(&self.state);
        let item = state
            .collections
            .get_mut(collection)
            .and_then(|items| items.iter_mut().find(|item| has_id(item, id)));
        if let Some(Value::Object(fields)) = item {
            fields.insert(field.to_string(), value);
        }
    }

    /// Every request so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state).requests.clone()
    }
}

impl Drop for FixtureServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Seed in the shape of the demo store: two categories, four products and
/// one cart line with a string id.
#[must_use]
pub fn demo_seed() -> Value {
    json!({
        "categories": [
            { "id": 1, "name": "Tools" },
            { "id": 2, "name": "Toys" }
        ],
        "products": [
            {
                "id": 1, "name": "Widget", "description": "A widget", "price": 9.99,
                "stock": 0, "categoryId": 2, "imageUrl": "https://example.com/widget.png",
                "createdAt": "2024-05-01T10:00:00.000Z", "modifiedAt": "2024-05-01T10:00:00.000Z"
            },
            {
                "id": 2, "name": "Hammer", "description": "", "price": 15.5,
                "stock": 7, "categoryId": 1, "imageUrl": ""
            },
            {
                "id": 3, "name": "Yo-yo", "description": "", "price": 3,
                "stock": 40, "categoryId": 2, "imageUrl": ""
            },
            {
                "id": 4, "name": "Widget Deluxe", "description": "", "price": 24.99,
                "stock": 2, "categoryId": 2, "imageUrl": ""
            }
        ],
        "cartItems": [
            {
                "id": "a", "productId": 3, "productName": "Yo-yo", "unitPrice": 10,
                "quantity": 2, "totalPrice": 20, "userId": "1"
            }
        ]
    })
}
