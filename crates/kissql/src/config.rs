//! Configuration file for the kissql CLI
//!
//! ```toml
//! [server]
//! user = "api_key"
//! password = "api_secret"
//!
//! [server.poll]
//! max_wait_secs = 300
//!
//! [database]
//! database = "1234"
//!
//! [log]
//! level = "info"
//! format = "console"
//! ```
//!
//! Credentials may also come from `KISSQL_USER` / `KISSQL_PASSWORD`, which
//! take precedence over the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use kissql_adapter::{DatabaseConfig, ServerConfig};
use serde::Deserialize;

/// Paths tried, in order, when `--config` is not given
const DEFAULT_PATHS: [&str; 2] = ["kissql.toml", "configs/kissql.toml"];

/// Log level
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Convert to tracing level filter string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable console output (default)
    #[default]
    Console,
    /// JSON structured logging
    Json,
}

/// `[log]` section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
}

/// Whole configuration file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub log: LogConfig,
}

impl CliConfig {
    /// Load from `path`, or from the first default path that exists
    ///
    /// An explicit path that does not exist is an error. With no explicit
    /// path and no default file, defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) if p.exists() => p.to_path_buf(),
            Some(p) => anyhow::bail!("config file not found: {}", p.display()),
            None => match DEFAULT_PATHS.iter().map(PathBuf::from).find(|p| p.exists()) {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };
        Self::from_file(&path)
    }

    /// Read and parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Replace file credentials with the given ones, where present
    pub fn with_credentials(mut self, user: Option<String>, password: Option<String>) -> Self {
        if user.is_some() {
            self.server.user = user;
        }
        if password.is_some() {
            self.server.password = password;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: CliConfig = toml::from_str("").unwrap();
        assert!(config.server.user.is_none());
        assert!(config.database.database.is_none());
        assert_eq!(config.log.level, LogLevel::Info);
        assert_eq!(config.log.format, LogFormat::Console);
    }

    #[test]
    fn test_full_config() {
        let config: CliConfig = toml::from_str(
            r#"
[server]
user = "key"
password = "secret"
timeout_secs = 10

[server.poll]
interval_ms = 500
max_attempts = 20

[database]
database = "1234"

[log]
level = "debug"
format = "json"
"#,
        )
        .unwrap();

        assert_eq!(config.server.user.as_deref(), Some("key"));
        assert_eq!(config.server.timeout_secs, 10);
        assert_eq!(config.server.poll.interval_ms, 500);
        assert_eq!(config.server.poll.max_attempts, Some(20));
        assert_eq!(config.database.database.as_deref(), Some("1234"));
        assert_eq!(config.log.level.as_str(), "debug");
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    fn test_credentials_override_file() {
        let config: CliConfig = toml::from_str("[server]\nuser = \"file\"\npassword = \"file-secret\"").unwrap();

        let config = config.with_credentials(Some("env".to_string()), None);
        assert_eq!(config.server.user.as_deref(), Some("env"));
        assert_eq!(config.server.password.as_deref(), Some("file-secret"));
    }

    #[test]
    fn test_load_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[database]\ndatabase = \"42\"").unwrap();

        let config = CliConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.database.database.as_deref(), Some("42"));
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let err = CliConfig::load(Some(Path::new("/nonexistent/kissql.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn test_invalid_toml_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nuser = ").unwrap();

        assert!(CliConfig::from_file(file.path()).is_err());
    }
}
