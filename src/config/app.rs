//! Main application configuration
//!
//! This module defines the primary configuration structures for the podium
//! ledger service, including environment variable loading, TOML files and
//! validation.

use crate::error::PodiumError;
use crate::rating::validate_season_config;
use crate::types::SeasonConfig;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub storage: StorageSettings,
    /// Rating parameters used for seasons created without explicit ones
    pub seasons: SeasonConfig,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Interface the HTTP API binds to
    pub host: String,
    /// Port of the HTTP API
    pub http_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

/// Storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Name of the ledger table
    pub table_name: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "podium".to_string(),
            log_level: "info".to_string(),
            host: "0.0.0.0".to_string(),
            http_port: 8080,
            shutdown_timeout_seconds: 30,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            table_name: "podium-ledger".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;

        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let mut config = Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.apply_env()?;

        validate_config(&config)?;
        Ok(config)
    }

    /// Parse configuration from TOML text; missing keys keep their defaults
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Ok(host) = env::var("HTTP_HOST") {
            self.service.host = host;
        }
        if let Ok(port) = env::var("HTTP_PORT") {
            self.service.http_port = port
                .parse()
                .map_err(|_| anyhow!("Invalid HTTP_PORT value: {}", port))?;
        }
        if let Ok(timeout) = env::var("SHUTDOWN_TIMEOUT_SECONDS") {
            self.service.shutdown_timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid SHUTDOWN_TIMEOUT_SECONDS value: {}", timeout))?;
        }

        // Storage settings
        if let Ok(table) = env::var("TABLE_NAME") {
            self.storage.table_name = table;
        }

        // Season defaults
        if let Ok(elo) = env::var("DEFAULT_STARTING_ELO") {
            self.seasons.starting_elo = elo
                .parse()
                .map_err(|_| anyhow!("Invalid DEFAULT_STARTING_ELO value: {}", elo))?;
        }
        if let Ok(k) = env::var("DEFAULT_K_FACTOR") {
            self.seasons.k = k
                .parse()
                .map_err(|_| anyhow!("Invalid DEFAULT_K_FACTOR value: {}", k))?;
        }
        if let Ok(d) = env::var("DEFAULT_D_DIVISOR") {
            self.seasons.d = d
                .parse()
                .map_err(|_| anyhow!("Invalid DEFAULT_D_DIVISOR value: {}", d))?;
        }

        Ok(())
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Address the HTTP API listens on
    pub fn http_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.service.host, self.service.http_port)
            .parse()
            .map_err(|_| {
                anyhow!(
                    "Invalid HTTP address {}:{}",
                    self.service.host,
                    self.service.http_port
                )
            })
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.http_port == 0 {
        return Err(anyhow!("HTTP port cannot be 0"));
    }
    config.http_addr()?;

    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }

    if config.storage.table_name.trim().is_empty() {
        return Err(anyhow!("Table name cannot be empty"));
    }

    // Season defaults follow the same rules as explicit season configs
    validate_season_config(&config.seasons).map_err(|e| {
        PodiumError::configuration(format!("Invalid season defaults: {}", e))
    })?;

    Ok(())
}
