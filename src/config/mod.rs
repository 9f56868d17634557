//! # Configuration Management
//!
//! Environment-driven configuration for the Campanile backend. Every struct
//! has a sane `Default`, a `from_env()` constructor reading `CAMPANILE_*`
//! variables, and validation performed before the server starts.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Main application configuration
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub platform: PlatformConfig,
}

impl AppConfig {
    /// Load the full configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let config = Self {
            server: ServerConfig::from_env()?,
            database: DatabaseConfig::from_env(),
            platform: PlatformConfig::from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.database.validate()?;
        if self.server.bind_address.is_empty() {
            return Err(Error::validation("Server bind address cannot be empty"));
        }
        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_address: "127.0.0.1".to_string(), port: 8080 }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let port = std::env::var("CAMPANILE_API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|e| Error::config(format!("Invalid API port: {}", e)))?;

        let bind_address = std::env::var("CAMPANILE_API_BIND_ADDRESS")
            .unwrap_or_else(|_| "127.0.0.1".to_string());

        Ok(Self { bind_address, port })
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL (sqlite://)
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections in the pool
    pub min_connections: u32,
    /// Connection acquire timeout in seconds
    pub connect_timeout_seconds: u64,
    /// Idle connection timeout in seconds (0 disables)
    pub idle_timeout_seconds: u64,
    /// Run embedded migrations automatically on startup
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://campanile.db".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_seconds: 30,
            idle_timeout_seconds: 600,
            auto_migrate: true,
        }
    }
}

impl DatabaseConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            url: std::env::var("CAMPANILE_DATABASE_URL")
                .or_else(|_| std::env::var("DATABASE_URL"))
                .unwrap_or(defaults.url),
            max_connections: env_parse("CAMPANILE_DATABASE_MAX_CONNECTIONS", defaults.max_connections),
            min_connections: env_parse("CAMPANILE_DATABASE_MIN_CONNECTIONS", defaults.min_connections),
            connect_timeout_seconds: env_parse(
                "CAMPANILE_DATABASE_CONNECT_TIMEOUT",
                defaults.connect_timeout_seconds,
            ),
            idle_timeout_seconds: env_parse(
                "CAMPANILE_DATABASE_IDLE_TIMEOUT",
                defaults.idle_timeout_seconds,
            ),
            auto_migrate: env_parse("CAMPANILE_DATABASE_AUTO_MIGRATE", defaults.auto_migrate),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(Error::validation("Database URL cannot be empty"));
        }
        if !self.is_sqlite() {
            return Err(Error::validation("Database URL must start with 'sqlite://'"));
        }
        if self.max_connections == 0 {
            return Err(Error::validation("max_connections must be greater than 0"));
        }
        if self.min_connections > self.max_connections {
            return Err(Error::validation("min_connections cannot be greater than max_connections"));
        }
        Ok(())
    }

    pub fn is_sqlite(&self) -> bool {
        self.url.starts_with("sqlite://")
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        if self.idle_timeout_seconds == 0 {
            None
        } else {
            Some(Duration::from_secs(self.idle_timeout_seconds))
        }
    }
}

/// External collaborator configuration: blob storage root and the env-style
/// config mirror consumed by the mail/SMS/payment integrations.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    /// Root directory for stored blobs (uploaded images etc.)
    pub blob_root: String,
    /// Public base URL under which stored blobs are served
    pub blob_base_url: String,
    /// Path of the dotenv-style file mirroring gateway credentials
    pub env_file: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            blob_root: "storage/uploads".to_string(),
            blob_base_url: "/uploads".to_string(),
            env_file: ".env.gateways".to_string(),
        }
    }
}

impl PlatformConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            blob_root: std::env::var("CAMPANILE_BLOB_ROOT").unwrap_or(defaults.blob_root),
            blob_base_url: std::env::var("CAMPANILE_BLOB_BASE_URL").unwrap_or(defaults.blob_base_url),
            env_file: std::env::var("CAMPANILE_ENV_FILE").unwrap_or(defaults.env_file),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 8080);
        assert!(config.database.is_sqlite());
    }

    #[test]
    fn test_database_validation() {
        let config = DatabaseConfig { url: String::new(), ..Default::default() };
        assert!(config.validate().is_err());

        let config = DatabaseConfig { url: "postgresql://x".to_string(), ..Default::default() };
        assert!(config.validate().is_err());

        let config = DatabaseConfig { max_connections: 0, ..Default::default() };
        assert!(config.validate().is_err());

        let config =
            DatabaseConfig { min_connections: 20, max_connections: 10, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_idle_timeout_zero_disables() {
        let config = DatabaseConfig { idle_timeout_seconds: 0, ..Default::default() };
        assert!(config.idle_timeout().is_none());
    }
}
