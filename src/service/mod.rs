//! Service layer for the podium ledger service
//!
//! This module contains the main application state, component wiring and
//! health checks for the production service.

pub mod app;
pub mod health;

pub use app::{AppState, ServiceError};
pub use health::{HealthCheck, HealthStatus};
