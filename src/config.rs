//! Configuration module for Depot.

use serde::Deserialize;
use std::path::Path;

use crate::{DepotError, Result};

/// Web server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins (empty = same-origin only).
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Serve the bundled frontend from `static_path`.
    #[serde(default)]
    pub serve_static: bool,
    /// Path to the static frontend build.
    #[serde(default = "default_static_path")]
    pub static_path: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8990
}

fn default_static_path() -> String {
    "web/dist".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            serve_static: false,
            static_path: default_static_path(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
    /// Path to the legacy flat JSON export. Imported once, on first
    /// start against an empty database.
    #[serde(default = "default_legacy_path")]
    pub legacy_json_path: String,
}

fn default_db_path() -> String {
    "data/depot.db".to_string()
}

fn default_legacy_path() -> String {
    "data/files.json".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            legacy_json_path: default_legacy_path(),
        }
    }
}

/// File storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding stored blobs.
    #[serde(default = "default_uploads_path")]
    pub uploads_path: String,
    /// Directory holding per-upload chunk staging areas.
    #[serde(default = "default_staging_path")]
    pub staging_path: String,
    /// Maximum request body size in megabytes (whole file for
    /// single-shot uploads, one chunk for chunked uploads).
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
}

fn default_uploads_path() -> String {
    "data/files".to_string()
}

fn default_staging_path() -> String {
    "data/staging".to_string()
}

fn default_max_upload_size() -> u64 {
    50
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            uploads_path: default_uploads_path(),
            staging_path: default_staging_path(),
            max_upload_size_mb: default_max_upload_size(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/depot.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Web server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// File storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| DepotError::Config(e.to_string()))
    }

    /// Maximum request body size in bytes.
    pub fn max_upload_size_bytes(&self) -> u64 {
        self.storage.max_upload_size_mb * 1024 * 1024
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8990);
        assert_eq!(config.database.path, "data/depot.db");
        assert_eq!(config.storage.uploads_path, "data/files");
        assert_eq!(config.storage.staging_path, "data/staging");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_empty() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.server.port, 8990);
        assert_eq!(config.storage.max_upload_size_mb, 50);
    }

    #[test]
    fn test_parse_partial() {
        let config = Config::parse(
            r#"
[server]
host = "127.0.0.1"
port = 9000

[storage]
max_upload_size_mb = 10
"#,
        )
        .unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.storage.max_upload_size_mb, 10);
        // Unspecified sections fall back to defaults
        assert_eq!(config.database.path, "data/depot.db");
        assert_eq!(config.storage.uploads_path, "data/files");
    }

    #[test]
    fn test_parse_invalid() {
        let result = Config::parse("server = \"not a table\"");
        assert!(matches!(result, Err(DepotError::Config(_))));
    }

    #[test]
    fn test_max_upload_size_bytes() {
        let mut config = Config::default();
        config.storage.max_upload_size_mb = 2;
        assert_eq!(config.max_upload_size_bytes(), 2 * 1024 * 1024);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("does/not/exist.toml");
        assert!(matches!(result, Err(DepotError::Io(_))));
    }
}
