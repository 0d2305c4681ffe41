//! Dashboard configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `MAPFOOD_API_BASE_URL` - Backend API root (default: `https://backmymapfood.onrender.com/api/`)
//! - `MAPFOOD_API_TIMEOUT_SECS` - Per-request timeout in seconds (default: 30)
//! - `MAPFOOD_SESSION_FILE` - Persisted session record (default: `session.json`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Sentry error sample rate (default: 1.0)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Backend used by the hosted dashboards.
pub const DEFAULT_API_BASE_URL: &str = "https://backmymapfood.onrender.com/api/";

const DEFAULT_TIMEOUT_SECS: &str = "30";
const DEFAULT_SESSION_FILE: &str = "session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Dashboard configuration.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Backend API configuration
    pub api: ApiConfig,
    /// Path of the persisted session record
    pub session_file: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
}

/// Backend API configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// API root; always ends with `/` so relative paths join under it.
    pub base_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl DashboardConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api = ApiConfig::from_env()?;
        let session_file = PathBuf::from(get_env_or_default(
            "MAPFOOD_SESSION_FILE",
            DEFAULT_SESSION_FILE,
        ));
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            api,
            session_file,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
        })
    }
}

impl ApiConfig {
    /// Replace the base URL, e.g. from a command-line override.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `raw` is not an http(s) URL.
    pub fn with_base_url(self, raw: &str) -> Result<Self, ConfigError> {
        let base_url = parse_base_url(raw)
            .map_err(|e| ConfigError::InvalidValue("api base URL".to_string(), e))?;
        Ok(Self { base_url, ..self })
    }

    fn from_env() -> Result<Self, ConfigError> {
        let base_url = parse_base_url(&get_env_or_default(
            "MAPFOOD_API_BASE_URL",
            DEFAULT_API_BASE_URL,
        ))
        .map_err(|e| ConfigError::InvalidEnvVar("MAPFOOD_API_BASE_URL".to_string(), e))?;

        let timeout_secs = get_env_or_default("MAPFOOD_API_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("MAPFOOD_API_TIMEOUT_SECS".to_string(), e.to_string())
            })?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "MAPFOOD_API_TIMEOUT_SECS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Parse an API root, normalising it to end with `/`.
///
/// Without the trailing slash `Url::join` would replace the last segment
/// (`.../api` + `orders` = `.../orders`).
fn parse_base_url(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme: {}", url.scheme()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_url_parses() {
        let url = parse_base_url(DEFAULT_API_BASE_URL).unwrap();
        assert_eq!(url.as_str(), DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_base_url_gains_trailing_slash() {
        let url = parse_base_url("http://localhost:9999/api").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9999/api/");
        assert_eq!(
            url.join("orders/history").unwrap().as_str(),
            "http://localhost:9999/api/orders/history"
        );
    }

    #[test]
    fn test_base_url_rejects_garbage() {
        assert!(parse_base_url("not a url").is_err());
        assert!(parse_base_url("ftp://files.example.com/api/").is_err());
    }

    #[test]
    fn test_env_or_default_falls_back() {
        assert_eq!(
            get_env_or_default("MAPFOOD_TEST_SURELY_UNSET_VARIABLE", "fallback"),
            "fallback"
        );
    }
}
