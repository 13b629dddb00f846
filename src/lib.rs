//! Podium - Seasonal multiplayer rating ledger
//!
//! This crate records multiplayer game results within seasons, rates every
//! participant with a pairwise multiplayer Elo update and persists each game
//! atomically together with its player writes.

pub mod api;
pub mod config;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod metrics;
pub mod rating;
pub mod records;
pub mod service;
pub mod storage;
pub mod types;

// Re-export commonly used types and traits
pub use error::{PodiumError, Result};
pub use types::*;

// Re-export key components
pub use ledger::LedgerService;
pub use rating::{compute_updated_ratings, MultiEloCalculator, RatingCalculator};
pub use storage::{InMemoryStorage, StorageGateway};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
