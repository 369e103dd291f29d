//! Configuration management for the blog API server.
//!
//! Sources, lowest precedence first:
//! 1. Default values (hardcoded)
//! 2. Configuration file (YAML)
//! 3. Environment variables prefixed with `BLOGAPI_`
//!
//! # Example
//!
//! ```ignore
//! use blogapi_server::config::ServerConfig;
//!
//! // Load from file with env overrides
//! let config = ServerConfig::load("config.yaml")?;
//!
//! // Or load from environment only
//! let config = ServerConfig::from_env()?;
//! ```

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Storage backends the binary knows how to build.
pub const STORAGE_BACKENDS: [&str; 3] = ["memory", "postgres", "mysql"];

const ENV_PREFIX: &str = "BLOGAPI";

/// Server configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ServerConfig {
    /// Server settings
    #[serde(default)]
    pub server: ServerSettings,

    /// Storage settings
    #[serde(default)]
    pub storage: StorageSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Metrics settings
    #[serde(default)]
    pub metrics: MetricsSettings,
}

/// Server network settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ServerSettings {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds; expired requests get 408
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Permissive CORS (any origin, method and header)
    #[serde(default = "default_true")]
    pub cors: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            cors: true,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_request_timeout() -> u64 {
    30
}

/// Storage backend settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct StorageSettings {
    /// Storage backend type: "memory", "postgres" or "mysql"
    #[serde(default = "default_storage_backend")]
    pub backend: String,

    /// Database connection URL (required if backend is "postgres" or "mysql")
    pub database_url: Option<String>,

    /// Connection pool size
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            database_url: None,
            pool_size: default_pool_size(),
            connection_timeout_secs: default_connection_timeout(),
        }
    }
}

fn default_storage_backend() -> String {
    "memory".to_string()
}

fn default_pool_size() -> u32 {
    10
}

fn default_connection_timeout() -> u64 {
    5
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Use JSON format (true for production, false for development)
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Metrics settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct MetricsSettings {
    /// Enable metrics endpoint
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_metrics_path(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

fn env_source() -> Environment {
    // BLOGAPI_SERVER__PORT -> server.port
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

impl ServerConfig {
    /// Load configuration from a YAML file with environment variable overrides.
    ///
    /// Environment variables are prefixed with `BLOGAPI_` and use `__` as separator:
    /// - `BLOGAPI_SERVER__PORT=9090` overrides `server.port`
    /// - `BLOGAPI_STORAGE__DATABASE_URL=...` overrides `storage.database_url`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigLoadError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let config = Config::builder()
            .add_source(Config::try_from(&ServerConfig::default())?)
            .add_source(File::from(path).format(FileFormat::Yaml))
            .add_source(env_source())
            .build()?;

        let server_config: ServerConfig = config.try_deserialize()?;
        server_config.validate()?;

        Ok(server_config)
    }

    /// Load configuration from environment variables only.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        let config = Config::builder()
            .add_source(Config::try_from(&ServerConfig::default())?)
            .add_source(env_source())
            .build()?;

        let server_config: ServerConfig = config.try_deserialize()?;
        server_config.validate()?;

        Ok(server_config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.server.port == 0 {
            return Err(ConfigLoadError::Invalid {
                message: "server.port must be greater than 0".to_string(),
            });
        }

        if self.server.request_timeout_secs == 0 {
            return Err(ConfigLoadError::Invalid {
                message: "server.request_timeout_secs must be greater than 0".to_string(),
            });
        }

        if !STORAGE_BACKENDS.contains(&self.storage.backend.as_str()) {
            return Err(ConfigLoadError::Invalid {
                message: format!(
                    "storage.backend must be one of: {:?}, got: {}",
                    STORAGE_BACKENDS, self.storage.backend
                ),
            });
        }

        if self.storage.backend != "memory"
            && self
                .storage
                .database_url
                .as_deref()
                .map_or(true, |s| s.trim().is_empty())
        {
            return Err(ConfigLoadError::Invalid {
                message: format!(
                    "storage.database_url is required when backend is '{}'",
                    self.storage.backend
                ),
            });
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigLoadError::Invalid {
                message: format!(
                    "logging.level must be one of: {:?}, got: {}",
                    valid_levels, self.logging.level
                ),
            });
        }

        if !self.metrics.path.starts_with('/') {
            return Err(ConfigLoadError::Invalid {
                message: format!("metrics.path must start with '/', got: {}", self.metrics.path),
            });
        }

        Ok(())
    }
}
