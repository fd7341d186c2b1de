//! Resource store configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `SHELF_API_URL` - Base URL of the JSON resource store (default: `http://localhost:3000/`)
//! - `SHELF_USER_ID` - User id stamped on new cart items (default: a random per-session id)

use shelf_core::UserId;
use thiserror::Error;
use url::Url;

/// Default resource store location (a local `json-server`).
pub const DEFAULT_API_URL: &str = "http://localhost:3000/";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Where the resource store lives and who this session is.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL; always ends with `/` so resource paths join beneath it
    pub base_url: Url,
    /// User id stamped on cart items created in this session
    pub user_id: UserId,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `SHELF_API_URL` is not an absolute `http(s)` URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let raw_url = get_env_or_default("SHELF_API_URL", DEFAULT_API_URL);
        let base_url = parse_base_url(&raw_url)
            .map_err(|reason| ConfigError::InvalidEnvVar("SHELF_API_URL".to_string(), reason))?;

        let user_id = get_optional_env("SHELF_USER_ID")
            .filter(|id| !id.trim().is_empty())
            .map_or_else(UserId::random_session, UserId::new);

        Ok(Self { base_url, user_id })
    }

    /// Build a configuration from explicit values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` (keyed as `SHELF_API_URL`) if the
    /// URL is not an absolute `http(s)` URL.
    pub fn new(base_url: &str, user_id: UserId) -> Result<Self, ConfigError> {
        let base_url = parse_base_url(base_url)
            .map_err(|reason| ConfigError::InvalidEnvVar("SHELF_API_URL".to_string(), reason))?;
        Ok(Self { base_url, user_id })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
#[must_use]
pub fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
#[must_use]
pub fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse and normalise a base URL.
fn parse_base_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    Ok(normalize_base_url(url))
}

/// Ensure a trailing slash so `Url::join` appends rather than replaces the
/// last path segment; drop any query or fragment.
pub(crate) fn normalize_base_url(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    url
}
