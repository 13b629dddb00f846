//! Multiplayer Elo rating system
//!
//! Every game is decomposed into all pairwise comparisons between its
//! participants. Each comparison scores like a chess game (win 1, draw 0.5,
//! loss 0) against the logistic expectation of the rating gap, and a
//! participant's total surplus is scaled by `k / (N - 1)`.
//!
//! Ratings are whole numbers, so every post-game rating is rounded to the
//! nearest integer before it leaves this module. A game is only rated when
//! each opponent is worth at least one rating point (`k / (N - 1) >= 1`);
//! below that, rounding would merge distinct placements.

use crate::error::PodiumError;
use crate::rating::calculator::{PlacementEntry, RatingCalculator, RatingChange};
use crate::types::{Placement, Rating, SeasonConfig};
use serde::{Deserialize, Serialize};
use skillratings::Outcomes;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Largest rating magnitude the ledger accepts
pub const RATING_LIMIT: Rating = 1_000_000_000;

/// Smallest usable `k`: one rating point per opponent in a two-player game
pub const MIN_K: f64 = 1.0;

/// Parameters of the multiplayer Elo update
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MultiEloConfig {
    /// Maximum rating swing per game
    pub k: f64,
    /// Rating gap at which the stronger side is expected to score ten times as often
    pub d: f64,
}

impl Default for MultiEloConfig {
    fn default() -> Self {
        Self { k: 32.0, d: 400.0 }
    }
}

impl From<&SeasonConfig> for MultiEloConfig {
    fn from(config: &SeasonConfig) -> Self {
        Self {
            k: config.k,
            d: config.d,
        }
    }
}

impl MultiEloConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> crate::error::Result<()> {
        if !self.k.is_finite() || self.k < MIN_K {
            return Err(PodiumError::invalid_input(format!(
                "k must be a finite number of at least {}, got {}",
                MIN_K, self.k
            ))
            .into());
        }

        if !self.d.is_finite() || self.d <= 0.0 {
            return Err(PodiumError::invalid_input(format!(
                "d must be a positive number, got {}",
                self.d
            ))
            .into());
        }

        Ok(())
    }
}

/// Validate a season's rating configuration, starting rating included
pub fn validate_season_config(config: &SeasonConfig) -> crate::error::Result<()> {
    if !(-RATING_LIMIT..=RATING_LIMIT).contains(&config.starting_elo) {
        return Err(PodiumError::invalid_input(format!(
            "startingElo must be between -{} and {}, got {}",
            RATING_LIMIT, RATING_LIMIT, config.starting_elo
        ))
        .into());
    }

    MultiEloConfig::from(config).validate()
}

/// Multiplayer Elo calculator configured for one season
#[derive(Debug, Clone)]
pub struct MultiEloCalculator {
    config: MultiEloConfig,
}

impl MultiEloCalculator {
    /// Create a new calculator, rejecting unusable parameters
    pub fn new(config: MultiEloConfig) -> crate::error::Result<Self> {
        config.validate()?;

        Ok(Self { config })
    }

    /// Create a calculator from a season's rating configuration
    pub fn for_season(config: &SeasonConfig) -> crate::error::Result<Self> {
        Self::new(MultiEloConfig::from(config))
    }

    pub fn settings(&self) -> MultiEloConfig {
        self.config
    }
}

impl RatingCalculator for MultiEloCalculator {
    fn calculate_rating_changes(
        &self,
        entries: &[PlacementEntry],
    ) -> crate::error::Result<Vec<RatingChange>> {
        compute_updated_ratings(entries, self.config.k, self.config.d)
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "multi_elo",
            "k": self.config.k,
            "d": self.config.d
        })
    }
}

/// Probability that a player rated `rating` beats one rated `opponent`
pub fn expected_score(rating: Rating, opponent: Rating, d: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((opponent as f64 - rating as f64) / d))
}

/// Outcome of a single pairing, from the point of view of `placement`
pub fn pairwise_outcome(placement: Placement, opponent: Placement) -> Outcomes {
    match placement.cmp(&opponent) {
        Ordering::Less => Outcomes::WIN,
        Ordering::Equal => Outcomes::DRAW,
        Ordering::Greater => Outcomes::LOSS,
    }
}

/// Compute post-game ratings for one game
///
/// The result is ordered best placement first, ties broken by participant
/// id, so the output depends only on the set of entries and never on their
/// order in `entries`.
///
/// Fails with [`PodiumError::InvalidInput`] when fewer than two participants
/// are given, a placement is zero, a participant appears twice, a rating
/// lies outside [`RATING_LIMIT`], `k`/`d` are unusable, or `k` is too small
/// to give each of the `N - 1` opponents a whole rating point.
pub fn compute_updated_ratings(
    entries: &[PlacementEntry],
    k: f64,
    d: f64,
) -> crate::error::Result<Vec<RatingChange>> {
    MultiEloConfig { k, d }.validate()?;
    validate_entries(entries)?;

    let mut sorted: Vec<&PlacementEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| {
        a.placement
            .cmp(&b.placement)
            .then_with(|| a.participant_id.cmp(&b.participant_id))
    });

    let opponents = (sorted.len() - 1) as f64;
    if k / opponents < 1.0 {
        return Err(PodiumError::invalid_input(format!(
            "k = {} is too small to rate {} participants; games with this k allow at most {}",
            k,
            sorted.len(),
            k.floor() as usize + 1
        ))
        .into());
    }

    sorted
        .iter()
        .map(|entry| {
            let (actual, expected) = sorted
                .iter()
                .filter(|opponent| opponent.participant_id != entry.participant_id)
                .fold((0.0, 0.0), |(actual, expected), opponent| {
                    (
                        actual
                            + pairwise_outcome(entry.placement, opponent.placement)
                                .to_chess_points(),
                        expected + expected_score(entry.rating_before, opponent.rating_before, d),
                    )
                });

            let delta = (k * (actual - expected) / opponents).round() as Rating;
            let rating_after = entry
                .rating_before
                .checked_add(delta)
                .filter(|rating| (-RATING_LIMIT..=RATING_LIMIT).contains(rating))
                .ok_or_else(|| {
                    anyhow::Error::from(PodiumError::invalid_input(format!(
                        "Rating of {} would leave the supported range of ±{}",
                        entry.participant_id, RATING_LIMIT
                    )))
                })?;

            Ok(RatingChange {
                participant_id: entry.participant_id.clone(),
                placement: entry.placement,
                rating_before: entry.rating_before,
                rating_after,
            })
        })
        .collect()
}

fn validate_entries(entries: &[PlacementEntry]) -> crate::error::Result<()> {
    if entries.len() < 2 {
        return Err(PodiumError::invalid_input(format!(
            "A game needs at least 2 participants, got {}",
            entries.len()
        ))
        .into());
    }

    let mut seen = HashSet::new();
    for entry in entries {
        if entry.placement == 0 {
            return Err(PodiumError::invalid_input(format!(
                "Placement of {} must be a positive integer",
                entry.participant_id
            ))
            .into());
        }

        if !(-RATING_LIMIT..=RATING_LIMIT).contains(&entry.rating_before) {
            return Err(PodiumError::invalid_input(format!(
                "Rating {} of {} is outside the supported range of ±{}",
                entry.rating_before, entry.participant_id, RATING_LIMIT
            ))
            .into());
        }

        if !seen.insert(entry.participant_id.as_str()) {
            return Err(PodiumError::invalid_input(format!(
                "Participant {} appears more than once",
                entry.participant_id
            ))
            .into());
        }
    }

    Ok(())
}
