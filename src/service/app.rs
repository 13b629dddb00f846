//! Main application state and service coordination
//!
//! This module contains the AppState that wires storage, identifier
//! generation, metrics and the ledger together, and serves the HTTP API.

use crate::api;
use crate::config::AppConfig;
use crate::identity::{IdGenerator, TimeOrderedIdGenerator};
use crate::ledger::LedgerService;
use crate::metrics::MetricsCollector;
use crate::storage::{InMemoryStorage, StorageGateway};
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },

    #[error("HTTP server error: {message}")]
    Server { message: String },
}

/// Main application state containing all service components
pub struct AppState {
    /// Application configuration
    config: AppConfig,

    /// Season ledger
    ledger: Arc<LedgerService>,

    /// Metrics shared by the ledger and the HTTP layer
    metrics: Arc<MetricsCollector>,

    started_at: Instant,
}

impl AppState {
    /// Initialize the application with the in-memory table
    pub fn new(config: AppConfig) -> Result<Self, ServiceError> {
        info!(
            "Initializing podium ledger service with in-memory table '{}'",
            config.storage.table_name
        );

        Self::with_components(
            config,
            Arc::new(InMemoryStorage::new()),
            Arc::new(TimeOrderedIdGenerator::new()),
        )
    }

    /// Initialize the application around explicit storage and identifiers
    pub fn with_components(
        config: AppConfig,
        storage: Arc<dyn StorageGateway>,
        id_generator: Arc<dyn IdGenerator>,
    ) -> Result<Self, ServiceError> {
        crate::config::validate_config(&config).map_err(|e| ServiceError::Configuration {
            message: e.to_string(),
        })?;

        let metrics = Arc::new(MetricsCollector::new().map_err(|e| {
            ServiceError::Initialization {
                message: format!("Failed to create metrics collector: {}", e),
            }
        })?);

        let ledger = Arc::new(LedgerService::new(
            storage,
            id_generator,
            config.seasons,
            metrics.clone(),
        ));

        Ok(Self {
            config,
            ledger,
            metrics,
            started_at: Instant::now(),
        })
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn ledger(&self) -> Arc<LedgerService> {
        self.ledger.clone()
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    /// Time since the state was created
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Build the HTTP router over this state
    pub fn router(self: &Arc<Self>) -> Router {
        api::router(self.clone())
    }

    /// Serve the HTTP API until `shutdown` resolves
    pub async fn serve<F>(self: Arc<Self>, shutdown: F) -> Result<(), ServiceError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self
            .config
            .http_addr()
            .map_err(|e| ServiceError::Configuration {
                message: e.to_string(),
            })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServiceError::Server {
                message: format!("Failed to bind {}: {}", addr, e),
            })?;

        info!("HTTP API listening on http://{}", addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| {
                error!("HTTP server failed: {}", e);
                ServiceError::Server {
                    message: e.to_string(),
                }
            })?;

        info!("HTTP API stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::health::{HealthCheck, HealthStatus};

    #[tokio::test]
    async fn test_app_state_initialization() {
        let state = AppState::new(AppConfig::default()).unwrap();

        assert_eq!(state.config().service.name, "podium");
        let season = state.ledger().create_season("Opening", None).await.unwrap();
        assert_eq!(season.config, AppConfig::default().seasons);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = AppConfig::default();
        config.service.log_level = "verbose".to_string();

        assert!(matches!(
            AppState::new(config),
            Err(ServiceError::Configuration { .. })
        ));
    }

    #[tokio::test]
    async fn test_health_check_reports_storage() {
        let state = AppState::new(AppConfig::default()).unwrap();
        state.ledger().create_season("Opening", None).await.unwrap();

        let health = HealthCheck::check(&state).await.unwrap();
        assert_eq!(health.status, HealthStatus::Healthy);
        assert_eq!(health.checks[0].name, "storage");
        assert_eq!(health.stats.seasons_created, 1);
        assert!(health.to_json().unwrap().contains("\"healthy\""));
    }
}
