//! Rating calculator trait and shared types
//!
//! This module defines the interface the ledger uses to turn a game's
//! placements into post-game ratings.

use crate::types::{Placement, PlayerId, Rating};
use serde::{Deserialize, Serialize};

/// One participant's input to a rating calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementEntry {
    pub participant_id: PlayerId,
    pub placement: Placement,
    pub rating_before: Rating,
}

impl PlacementEntry {
    pub fn new(participant_id: impl Into<PlayerId>, placement: Placement, rating_before: Rating) -> Self {
        Self {
            participant_id: participant_id.into(),
            placement,
            rating_before,
        }
    }
}

/// Rating change information for a participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingChange {
    pub participant_id: PlayerId,
    pub placement: Placement,
    pub rating_before: Rating,
    pub rating_after: Rating,
}

impl RatingChange {
    pub fn delta(&self) -> Rating {
        self.rating_after - self.rating_before
    }
}

/// Trait for calculating rating changes after games
pub trait RatingCalculator: Send + Sync {
    /// Calculate post-game ratings for every participant
    ///
    /// # Arguments
    /// * `entries` - participants with their placement (1 = first) and pre-game rating
    ///
    /// # Returns
    /// One change per participant, best placement first
    fn calculate_rating_changes(
        &self,
        entries: &[PlacementEntry],
    ) -> crate::error::Result<Vec<RatingChange>>;

    /// Get current configuration as JSON
    fn config(&self) -> serde_json::Value;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_change_delta() {
        let change = RatingChange {
            participant_id: "player#a".to_string(),
            placement: 1,
            rating_before: 1200,
            rating_after: 1216,
        };
        assert_eq!(change.delta(), 16);

        let entry = PlacementEntry::new("player#a", 1, 1200);
        assert_eq!(entry.participant_id, change.participant_id);
    }
}
