//! Health checks
//!
//! This module provides health check functionality for the podium ledger
//! service. The only external dependency is storage, so a health check is a
//! storage probe plus a summary of what the service has recorded.

use crate::service::app::AppState;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Health check status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Overall service status
    pub status: HealthStatus,
    /// Service name
    pub service: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Detailed component checks
    pub checks: Vec<ComponentCheck>,
    /// Service statistics
    pub stats: ServiceStats,
}

/// Individual component health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentCheck {
    pub name: String,
    pub status: HealthStatus,
    /// Error message if unhealthy
    pub message: Option<String>,
    /// Check duration in milliseconds
    pub duration_ms: u64,
}

/// Counts since service start
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStats {
    pub games_recorded: u64,
    pub players_created: u64,
    pub seasons_created: u64,
    pub uptime_seconds: u64,
}

impl HealthCheck {
    /// Probe every component and summarize service activity
    pub async fn check(app_state: &AppState) -> Result<Self> {
        let storage_check = Self::check_storage(app_state).await;
        let status = storage_check.status.clone();

        let metrics = app_state.metrics();
        metrics.update_health_status(status == HealthStatus::Healthy);

        let stats = ServiceStats {
            games_recorded: metrics.games().games_recorded_total.get(),
            players_created: metrics.roster().players_created_total.get(),
            seasons_created: metrics.roster().seasons_created_total.get(),
            uptime_seconds: app_state.uptime().as_secs(),
        };

        Ok(HealthCheck {
            status,
            service: app_state.config().service.name.clone(),
            version: crate::VERSION.to_string(),
            timestamp: chrono::Utc::now(),
            checks: vec![storage_check],
            stats,
        })
    }

    /// Check that storage answers reads
    async fn check_storage(app_state: &AppState) -> ComponentCheck {
        let start = std::time::Instant::now();

        let (status, message) = match app_state.ledger().check_storage().await {
            Ok(()) => {
                debug!("Storage probe succeeded");
                (HealthStatus::Healthy, None)
            }
            Err(e) => {
                error!("Storage probe failed: {}", e);
                (
                    HealthStatus::Unhealthy,
                    Some(format!("Storage probe failed: {}", e)),
                )
            }
        };

        ComponentCheck {
            name: "storage".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| anyhow::anyhow!("Failed to serialize health check: {}", e))
    }
}
