//! Rating system for recorded games
//!
//! This module provides the calculator interface and the multiplayer Elo
//! update every season uses. Nothing in here performs I/O.

pub mod calculator;
pub mod multi_elo;

// Re-export commonly used types
pub use calculator::{PlacementEntry, RatingCalculator, RatingChange};
pub use multi_elo::{
    compute_updated_ratings, validate_season_config, MultiEloCalculator, MultiEloConfig,
    RATING_LIMIT,
};
