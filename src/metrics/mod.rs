//! Metrics and monitoring for the ledger service
//!
//! This module provides Prometheus metrics for game submissions, roster
//! growth and HTTP traffic.

pub mod collector;

pub use collector::{GameMetrics, MetricsCollector, MetricsTimer, RosterMetrics, ServiceMetrics};
