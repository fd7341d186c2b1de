//! Remote resource client for a JSON collection store.
//!
//! Uses `reqwest` for HTTP. Every call issues exactly one request: no retries,
//! no caching, no fallback values. A non-success status is reported as
//! [`RestError::RequestFailed`] whatever the code; a success status with a body
//! of the wrong shape is [`RestError::InvalidResponseShape`].
//!
//! # Example
//!
//! ```rust,ignore
//! use shelf_client::rest::{Resource, RestClient};
//!
//! let client = RestClient::new(&config.api);
//! let products: Vec<Product> = client.list(Resource::Products).await?;
//! ```

mod shape;

use std::fmt;
use std::sync::Arc;

use reqwest::header::{ACCEPT, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::{ApiConfig, normalize_base_url};

/// Maximum characters of a response body included in error logs.
const LOG_BODY_LIMIT: usize = 500;

// =============================================================================
// Resources and Operations
// =============================================================================

/// A remote collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Products,
    Categories,
    CartItems,
}

impl Resource {
    /// Collection path segment.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Categories => "categories",
            Self::CartItems => "cartItems",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// A call against a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Patch,
    Remove,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::List => "list",
            Self::Get => "get",
            Self::Create => "create",
            Self::Update => "update",
            Self::Patch => "patch",
            Self::Remove => "remove",
        })
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Why a request did not produce a usable response.
#[derive(Debug, Error)]
pub enum FailureCause {
    /// The store answered with a non-success status.
    #[error("HTTP {0}")]
    Status(u16),

    /// The request never completed (connection refused, reset, TLS, ...).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The request URL could not be built from the base URL.
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),
}

/// Errors surfaced by the remote resource client.
#[derive(Debug, Error)]
pub enum RestError {
    /// Transport or status failure.
    #[error("{operation} {resource} failed: {cause}")]
    RequestFailed {
        resource: Resource,
        operation: Operation,
        #[source]
        cause: FailureCause,
    },

    /// Success status, but the body is not the expected JSON shape.
    #[error("{operation} {resource} returned an invalid response: {reason}")]
    InvalidResponseShape {
        resource: Resource,
        operation: Operation,
        reason: String,
    },
}

impl RestError {
    /// Build a `RequestFailed` for a status code.
    #[must_use]
    pub const fn status(resource: Resource, operation: Operation, status: u16) -> Self {
        Self::RequestFailed {
            resource,
            operation,
            cause: FailureCause::Status(status),
        }
    }

    /// The collection the failed call targeted.
    #[must_use]
    pub const fn resource(&self) -> Resource {
        match self {
            Self::RequestFailed { resource, .. } | Self::InvalidResponseShape { resource, .. } => {
                *resource
            }
        }
    }

    /// The failed operation.
    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self {
            Self::RequestFailed { operation, .. }
            | Self::InvalidResponseShape { operation, .. } => *operation,
        }
    }

    /// `true` for transport/status failures.
    #[must_use]
    pub const fn is_request_failed(&self) -> bool {
        matches!(self, Self::RequestFailed { .. })
    }

    /// `true` for bodies that failed structural validation.
    #[must_use]
    pub const fn is_invalid_shape(&self) -> bool {
        matches!(self, Self::InvalidResponseShape { .. })
    }
}

// =============================================================================
// RestClient
// =============================================================================

/// Client for a JSON resource store (`/products`, `/categories`, `/cartItems`).
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct RestClient {
    inner: Arc<RestClientInner>,
}

struct RestClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl RestClient {
    /// Create a new client for the configured store.
    #[must_use]
    pub fn new(config: &ApiConfig) -> Self {
        Self::with_base_url(config.base_url.clone())
    }

    /// Create a client for an explicit base URL.
    ///
    /// The URL gets the same trailing slash `ApiConfig` gives it, so a path
    /// prefix survives resource joins.
    #[must_use]
    pub fn with_base_url(base_url: Url) -> Self {
        Self {
            inner: Arc::new(RestClientInner {
                client: reqwest::Client::new(),
                base_url: normalize_base_url(base_url),
            }),
        }
    }

    /// The store's base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Build `<base>/<resource>[/<id>]`, percent-encoding the id.
    fn url(
        &self,
        resource: Resource,
        operation: Operation,
        id: Option<&str>,
    ) -> Result<Url, RestError> {
        let invalid = |reason: String| RestError::RequestFailed {
            resource,
            operation,
            cause: FailureCause::InvalidUrl(reason),
        };

        let mut url = self
            .inner
            .base_url
            .join(resource.path())
            .map_err(|e| invalid(e.to_string()))?;

        if let Some(id) = id {
            url.path_segments_mut()
                .map_err(|()| invalid(format!("{} cannot be a base", self.inner.base_url)))?
                .push(id);
        }

        Ok(url)
    }

    /// Send a request and return the body of a success response.
    async fn send(
        &self,
        resource: Resource,
        operation: Operation,
        request: reqwest::RequestBuilder,
    ) -> Result<String, RestError> {
        let failed = |cause: FailureCause| RestError::RequestFailed {
            resource,
            operation,
            cause,
        };

        let response = request
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Resource store request did not complete");
                failed(FailureCause::Transport(e))
            })?;

        let status = response.status();

        // Read the body before checking status for better error diagnostics
        let body = response
            .text()
            .await
            .map_err(|e| failed(FailureCause::Transport(e)))?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(LOG_BODY_LIMIT).collect::<String>(),
                "Resource store returned non-success status"
            );
            return Err(failed(FailureCause::Status(status.as_u16())));
        }

        Ok(body)
    }

    // =========================================================================
    // Collection Methods
    // =========================================================================

    /// List a whole collection.
    ///
    /// # Errors
    ///
    /// Returns `RequestFailed` on transport/status failure and
    /// `InvalidResponseShape` unless the body is an array of objects that
    /// decode as `T`. An empty array is a valid, empty result.
    #[instrument(skip(self), fields(resource = %resource))]
    pub async fn list<T: DeserializeOwned>(&self, resource: Resource) -> Result<Vec<T>, RestError> {
        self.list_where(resource, &[]).await
    }

    /// List a collection filtered by query parameters (e.g. `categoryId`,
    /// `_limit`).
    ///
    /// # Errors
    ///
    /// Same as [`RestClient::list`].
    #[instrument(skip(self), fields(resource = %resource))]
    pub async fn list_where<T: DeserializeOwned>(
        &self,
        resource: Resource,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, RestError> {
        let mut url = self.url(resource, Operation::List, None)?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        let request = self.inner.client.get(url);
        let body = self.send(resource, Operation::List, request).await?;
        let items = shape::decode_collection(resource, Operation::List, &body)?;
        debug!(count = items.len(), "Listed collection");
        Ok(items)
    }

    /// Fetch one item by id.
    ///
    /// # Errors
    ///
    /// Returns `RequestFailed` on transport/status failure (including a
    /// missing id) and `InvalidResponseShape` unless the body is one object.
    #[instrument(skip(self), fields(resource = %resource))]
    pub async fn get<T: DeserializeOwned>(&self, resource: Resource, id: &str) -> Result<T, RestError> {
        let url = self.url(resource, Operation::Get, Some(id))?;
        let request = self.inner.client.get(url);
        let body = self.send(resource, Operation::Get, request).await?;
        shape::decode_item(resource, Operation::Get, &body)
    }

    /// Create an item; returns the stored item with its server-assigned id.
    ///
    /// # Errors
    ///
    /// Returns `RequestFailed` on transport/status failure and
    /// `InvalidResponseShape` unless the body is one object.
    #[instrument(skip(self, body), fields(resource = %resource))]
    pub async fn create<T, B>(&self, resource: Resource, body: &B) -> Result<T, RestError>
    where
        T: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        let url = self.url(resource, Operation::Create, None)?;
        let request = self.inner.client.post(url).json(body);
        let body = self.send(resource, Operation::Create, request).await?;
        shape::decode_item(resource, Operation::Create, &body)
    }

    /// Replace an item wholesale (`PUT`).
    ///
    /// # Errors
    ///
    /// Returns `RequestFailed` on transport/status failure and
    /// `InvalidResponseShape` unless the body is one object.
    #[instrument(skip(self, body), fields(resource = %resource))]
    pub async fn update<T, B>(&self, resource: Resource, id: &str, body: &B) -> Result<T, RestError>
    where
        T: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        let url = self.url(resource, Operation::Update, Some(id))?;
        let request = self.inner.client.put(url).json(body);
        let body = self.send(resource, Operation::Update, request).await?;
        shape::decode_item(resource, Operation::Update, &body)
    }

    /// Update some fields of an item (`PATCH`).
    ///
    /// # Errors
    ///
    /// Returns `RequestFailed` on transport/status failure and
    /// `InvalidResponseShape` unless the body is one object.
    #[instrument(skip(self, body), fields(resource = %resource))]
    pub async fn patch<T, B>(&self, resource: Resource, id: &str, body: &B) -> Result<T, RestError>
    where
        T: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        let url = self.url(resource, Operation::Patch, Some(id))?;
        let request = self.inner.client.patch(url).json(body);
        let body = self.send(resource, Operation::Patch, request).await?;
        shape::decode_item(resource, Operation::Patch, &body)
    }

    /// Delete an item. Any success status counts; the body is ignored.
    ///
    /// # Errors
    ///
    /// Returns `RequestFailed` on transport/status failure.
    #[instrument(skip(self), fields(resource = %resource))]
    pub async fn remove(&self, resource: Resource, id: &str) -> Result<(), RestError> {
        let url = self.url(resource, Operation::Remove, Some(id))?;
        let request = self.inner.client.delete(url);
        self.send(resource, Operation::Remove, request).await?;
        Ok(())
    }
}

impl fmt::Debug for RestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}
