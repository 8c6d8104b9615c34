//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `EMPORIUM_API_BASE_URL` - Remote service base URL (default: `http://localhost:8080/api`)
//! - `EMPORIUM_STATE_PATH` - File backing the persisted state (default: `.emporium/state.json`)
//! - `EMPORIUM_USER_AGENT` - User-Agent sent with every request
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//!
//! The development login fallback is never read from the environment. It is
//! only available with the `dev-auth-fallback` feature and must be switched
//! on explicitly with [`StorefrontConfig::with_dev_auth_fallback`].

use std::path::PathBuf;

use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
const DEFAULT_STATE_PATH: &str = ".emporium/state.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Base URL every request path is appended to (may carry a path prefix)
    pub api_base_url: Url,
    /// File backing the key-value store
    pub state_path: PathBuf,
    /// User-Agent header, if overridden
    pub user_agent: Option<String>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sign in by email lookup when the login endpoint is missing
    #[cfg(feature = "dev-auth-fallback")]
    pub dev_auth_fallback: bool,
}

impl StorefrontConfig {
    /// Configuration for `api_base_url` with every other setting at its
    /// default.
    #[must_use]
    pub fn new(api_base_url: Url) -> Self {
        Self {
            api_base_url,
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
            user_agent: None,
            sentry_dsn: None,
            sentry_environment: None,
            #[cfg(feature = "dev-auth-fallback")]
            dev_auth_fallback: false,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_base_url = parse_base_url(
            "EMPORIUM_API_BASE_URL",
            &get("EMPORIUM_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
        )?;
        let state_path = get("EMPORIUM_STATE_PATH")
            .map_or_else(|| PathBuf::from(DEFAULT_STATE_PATH), PathBuf::from);

        Ok(Self {
            api_base_url,
            state_path,
            user_agent: get("EMPORIUM_USER_AGENT"),
            sentry_dsn: get("SENTRY_DSN"),
            sentry_environment: get("SENTRY_ENVIRONMENT"),
            #[cfg(feature = "dev-auth-fallback")]
            dev_auth_fallback: false,
        })
    }

    /// Use `path` for the persisted state file.
    #[must_use]
    pub fn with_state_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_path = path.into();
        self
    }

    /// Enable or disable the development login fallback.
    #[cfg(feature = "dev-auth-fallback")]
    #[must_use]
    pub const fn with_dev_auth_fallback(mut self, enabled: bool) -> Self {
        self.dev_auth_fallback = enabled;
        self
    }
}

/// Parse and check a service base URL.
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{other}' (expected http or https)"),
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.api_base_url.as_str(), "http://localhost:8080/api");
        assert_eq!(config.state_path, PathBuf::from(".emporium/state.json"));
        assert!(config.user_agent.is_none());
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("EMPORIUM_API_BASE_URL", "https://shop.example.com/api/"),
            ("EMPORIUM_STATE_PATH", "/tmp/emporium.json"),
            ("EMPORIUM_USER_AGENT", "emporium-test"),
            ("SENTRY_ENVIRONMENT", "staging"),
        ])
        .unwrap();
        assert_eq!(config.api_base_url.host_str(), Some("shop.example.com"));
        assert_eq!(config.state_path, PathBuf::from("/tmp/emporium.json"));
        assert_eq!(config.user_agent.as_deref(), Some("emporium-test"));
        assert_eq!(config.sentry_environment.as_deref(), Some("staging"));
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = load(&[("EMPORIUM_API_BASE_URL", "  "), ("SENTRY_DSN", "")]).unwrap();
        assert_eq!(config.api_base_url.as_str(), "http://localhost:8080/api");
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_invalid_base_url() {
        let err = load(&[("EMPORIUM_API_BASE_URL", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "EMPORIUM_API_BASE_URL"));

        let err = load(&[("EMPORIUM_API_BASE_URL", "ftp://files.example.com")]).unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[cfg(feature = "dev-auth-fallback")]
    #[test]
    fn test_dev_fallback_is_opt_in() {
        let config = load(&[("EMPORIUM_DEV_AUTH_FALLBACK", "true")]).unwrap();
        assert!(!config.dev_auth_fallback);
        assert!(config.with_dev_auth_fallback(true).dev_auth_fallback);
    }
}
