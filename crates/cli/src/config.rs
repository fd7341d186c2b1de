//! CLI configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `SHELF_API_URL` - Base URL of the resource store (default: `http://localhost:3000/`)
//! - `SHELF_USER_ID` - User id for cart lines (default: random per run)
//! - `SENTRY_DSN` - Sentry DSN for error tracking
//! - `SENTRY_ENVIRONMENT` - Sentry environment name (e.g. `staging`)

use shelf_client::config::get_optional_env;
use shelf_client::{ApiConfig, ConfigError};
use shelf_core::UserId;

/// Everything the `shelf` binary needs at startup.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub api: ApiConfig,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
}

impl CliConfig {
    /// Load configuration from the environment (and `.env`, if present).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `SHELF_API_URL` is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api = ApiConfig::from_env()?;
        Ok(Self {
            api,
            sentry_dsn: get_optional_env("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Apply command-line overrides on top of the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `api_url` is invalid.
    pub fn with_overrides(
        mut self,
        api_url: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let user_id = user_id.map_or_else(|| self.api.user_id.clone(), UserId::new);
        self.api = match api_url {
            Some(url) => ApiConfig::new(url, user_id)?,
            None => ApiConfig {
                user_id,
                ..self.api
            },
        };
        Ok(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn base() -> CliConfig {
        CliConfig {
            api: ApiConfig::new("http://localhost:3000", UserId::new("1")).unwrap(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    #[test]
    fn test_no_overrides_keeps_config() {
        let config = base().with_overrides(None, None).unwrap();
        assert_eq!(config.api.base_url.as_str(), "http://localhost:3000/");
        assert_eq!(config.api.user_id.as_str(), "1");
    }

    #[test]
    fn test_overrides_replace_url_and_user() {
        let config = base()
            .with_overrides(Some("http://127.0.0.1:4000/api"), Some("7"))
            .unwrap();
        assert_eq!(config.api.base_url.as_str(), "http://127.0.0.1:4000/api/");
        assert_eq!(config.api.user_id.as_str(), "7");
    }

    #[test]
    fn test_invalid_override_url() {
        assert!(base().with_overrides(Some("ftp://nope"), None).is_err());
    }
}
