//! Adapter configuration types
//!
//! Parsed from raw TOML values provided by the host. Every field has a
//! default so an empty table is a valid (anonymous) configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::error::AdapterError;
use crate::resilience::ResilienceConfig;

/// Default query API base URL
pub const DEFAULT_API_URL: &str = "https://query.kissmetrics.com/v3";

/// Largest page the query API will return
pub const MAX_PAGE_SIZE: u32 = 10_000;

/// Server (connection) configuration
///
/// # Example
///
/// ```toml
/// user = "api_key"
/// password = "api_secret"
/// api_url = "https://query.kissmetrics.com/v3"  # optional
/// timeout_secs = 30                              # optional, per request
/// max_retries = 3                                # optional, GET requests only
/// page_size = 10000                              # optional
///
/// [poll]
/// interval_ms = 2000
/// max_wait_secs = 600
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// API key
    pub user: Option<String>,

    /// API secret
    pub password: Option<String>,

    /// API base URL (default: https://query.kissmetrics.com/v3)
    pub api_url: String,

    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,

    /// Maximum retry attempts for transient GET failures (default: 3)
    pub max_retries: u32,

    /// Rows / catalog entries requested per call (default: 10000)
    pub page_size: u32,

    /// Job polling settings
    pub poll: PollConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            user: None,
            password: None,
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: 30,
            max_retries: 3,
            page_size: MAX_PAGE_SIZE,
            poll: PollConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create a config with credentials and defaults for everything else
    pub fn with_credentials(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
            password: Some(password.into()),
            ..Default::default()
        }
    }

    /// Parse config from raw TOML value
    pub fn from_toml(value: &toml::Value) -> Result<Self, AdapterError> {
        let config: ServerConfig = value
            .clone()
            .try_into()
            .map_err(|e: toml::de::Error| {
                AdapterError::Config(format!("invalid server config: {}", e))
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), AdapterError> {
        if self.api_url.is_empty() {
            return Err(AdapterError::Config("api_url must not be empty".into()));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(AdapterError::Config(format!(
                "page_size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.page_size
            )));
        }
        if self.poll.interval_ms == 0 {
            return Err(AdapterError::Config("poll.interval_ms must be > 0".into()));
        }
        Ok(())
    }

    /// Build resilience config from these settings
    pub fn resilience_config(&self) -> ResilienceConfig {
        ResilienceConfig {
            timeout_secs: self.timeout_secs,
            max_retries: self.max_retries,
            ..Default::default()
        }
    }
}

impl std::str::FromStr for ServerConfig {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: toml::Value = toml::from_str(s)
            .map_err(|e| AdapterError::Config(format!("invalid server config: {}", e)))?;
        Self::from_toml(&value)
    }
}

/// Query job polling configuration
///
/// Leaving both `max_attempts` and `max_wait_secs` unset polls until the
/// service reports completion.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PollConfig {
    /// Fixed wait before every status check (default: 2000)
    pub interval_ms: u64,

    /// Maximum status checks per job
    pub max_attempts: Option<u32>,

    /// Maximum time spent polling one job (default: 600)
    pub max_wait_secs: Option<u64>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2000,
            max_attempts: None,
            max_wait_secs: Some(600),
        }
    }
}

impl PollConfig {
    /// Poll forever, as the service itself imposes no deadline
    pub fn unbounded() -> Self {
        Self {
            max_attempts: None,
            max_wait_secs: None,
            ..Default::default()
        }
    }

    /// Wait between status checks
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Total polling budget, if bounded
    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_secs.map(Duration::from_secs)
    }
}

/// Database selection for a connection
///
/// Products are exposed as databases; `database` is the product id used
/// when an operation does not name one explicitly.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Default product id
    pub database: Option<String>,
}

impl DatabaseConfig {
    /// Select a product by id
    pub fn product(id: impl Into<String>) -> Self {
        Self {
            database: Some(id.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::default();
        assert!(config.user.is_none());
        assert!(config.password.is_none());
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.page_size, 10_000);
        assert_eq!(config.poll.interval(), Duration::from_secs(2));
        assert_eq!(config.poll.max_wait(), Some(Duration::from_secs(600)));
        assert!(config.poll.max_attempts.is_none());
    }

    #[test]
    fn test_server_config_from_toml() {
        let toml_str = r#"
user = "key"
password = "secret"
timeout_secs = 10

[poll]
interval_ms = 500
max_attempts = 20
"#;
        let config: ServerConfig = toml_str.parse().unwrap();

        assert_eq!(config.user.as_deref(), Some("key"));
        assert_eq!(config.password.as_deref(), Some("secret"));
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.poll.interval_ms, 500);
        assert_eq!(config.poll.max_attempts, Some(20));
        // unspecified poll fields keep their defaults
        assert_eq!(config.poll.max_wait_secs, Some(600));
    }

    #[test]
    fn test_server_config_empty_is_valid() {
        let config: ServerConfig = "".parse().unwrap();
        assert!(config.user.is_none());
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_server_config_rejects_oversized_page() {
        let result: Result<ServerConfig, _> = "page_size = 20000".parse();
        assert!(matches!(result, Err(AdapterError::Config(_))));
    }

    #[test]
    fn test_server_config_rejects_zero_interval() {
        let result: Result<ServerConfig, _> = "[poll]\ninterval_ms = 0".parse();
        assert!(matches!(result, Err(AdapterError::Config(_))));
    }

    #[test]
    fn test_server_config_rejects_unknown_type() {
        let result: Result<ServerConfig, _> = "timeout_secs = \"soon\"".parse();
        assert!(matches!(result, Err(AdapterError::Config(_))));
    }

    #[test]
    fn test_resilience_config_from_server() {
        let config = ServerConfig {
            timeout_secs: 5,
            max_retries: 1,
            ..Default::default()
        };
        let resilience = config.resilience_config();
        assert_eq!(resilience.timeout_secs, 5);
        assert_eq!(resilience.max_retries, 1);
    }

    #[test]
    fn test_poll_unbounded() {
        let poll = PollConfig::unbounded();
        assert!(poll.max_wait().is_none());
        assert!(poll.max_attempts.is_none());
        assert_eq!(poll.interval_ms, 2000);
    }

    #[test]
    fn test_database_config() {
        assert!(DatabaseConfig::default().database.is_none());
        assert_eq!(DatabaseConfig::product("42").database.as_deref(), Some("42"));
    }
}
