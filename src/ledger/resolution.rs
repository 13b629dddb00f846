//! Player resolution for game submissions
//!
//! Every submitted participant becomes exactly one [`ResolvedParticipant`],
//! correlated by its position in the submission. Known players are fetched
//! concurrently; first-time players are minted as stubs that only reach
//! storage when the game is committed.

use crate::error::{PodiumError, Result};
use crate::identity::{EntityKind, IdGenerator};
use crate::records::{player_key, StoredRecord};
use crate::storage::StorageGateway;
use crate::types::{Placement, PlayerId, Season, SeasonPlayer, SubmittedResult};
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// A submitted participant matched to a player record
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParticipant {
    /// Position of the participant in the submission
    pub submission_index: usize,
    pub player: SeasonPlayer,
    pub placement: Placement,
    /// `true` when the record was minted for this submission
    pub is_new: bool,
}

/// Resolves submitted participants against a season's players
pub struct PlayerResolver {
    storage: Arc<dyn StorageGateway>,
    id_generator: Arc<dyn IdGenerator>,
}

impl PlayerResolver {
    pub fn new(storage: Arc<dyn StorageGateway>, id_generator: Arc<dyn IdGenerator>) -> Self {
        Self {
            storage,
            id_generator,
        }
    }

    /// Resolve every participant of a submission, in submission order
    ///
    /// Fails with `InvalidInput` for duplicate participants and with
    /// `PlayerResolutionFailed` when a known id is not a player of `season`.
    pub async fn resolve(
        &self,
        season: &Season,
        results: &[SubmittedResult],
        at: DateTime<Utc>,
    ) -> Result<Vec<ResolvedParticipant>> {
        check_participants(results)?;

        let known: Vec<(usize, &PlayerId)> = results
            .iter()
            .enumerate()
            .filter_map(|(index, result)| result.player_id.as_ref().map(|id| (index, id)))
            .collect();

        debug!(
            "Resolving {} participants for season {} ({} known)",
            results.len(),
            season.id,
            known.len()
        );

        let fetched = try_join_all(
            known
                .iter()
                .map(|(_, player_id)| self.fetch_player(season, player_id)),
        )
        .await?;

        let mut existing: HashMap<usize, SeasonPlayer> = HashMap::with_capacity(known.len());
        for ((index, player_id), player) in known.iter().zip(fetched) {
            match player {
                Some(player) => {
                    existing.insert(*index, player);
                }
                None => {
                    warn!(
                        "Player {} could not be found in season {}",
                        player_id, season.id
                    );
                    return Err(PodiumError::resolution_failed(format!(
                        "Player with id {} could not be found in season {}",
                        player_id, season.id
                    ))
                    .into());
                }
            }
        }

        results
            .iter()
            .enumerate()
            .map(|(index, submitted)| match &submitted.player_id {
                Some(player_id) => {
                    let player = existing
                        .remove(&index)
                        .filter(|player| &player.id == player_id)
                        .ok_or_else(|| {
                            PodiumError::resolution_failed(format!(
                                "Player with id {} could not be matched to a player record",
                                player_id
                            ))
                        })?;

                    Ok(ResolvedParticipant {
                        submission_index: index,
                        player,
                        placement: submitted.placement,
                        is_new: false,
                    })
                }
                None => Ok(ResolvedParticipant {
                    submission_index: index,
                    player: self.mint_player(season, &submitted.player_name, at),
                    placement: submitted.placement,
                    is_new: true,
                }),
            })
            .collect()
    }

    /// Create a player stub carrying the season's starting rating
    pub fn mint_player(&self, season: &Season, name: &str, at: DateTime<Utc>) -> SeasonPlayer {
        SeasonPlayer {
            id: self.id_generator.generate(EntityKind::Player, at),
            season: season.id.clone(),
            name: name.trim().to_string(),
            created_at: at,
            elo: season.config.starting_elo,
            games_played: 0,
        }
    }

    async fn fetch_player(&self, season: &Season, player_id: &str) -> Result<Option<SeasonPlayer>> {
        let item = self
            .storage
            .get(&player_key(player_id, &season.id))
            .await
            .map_err(|e| {
                PodiumError::persistence_failed(format!(
                    "Failed to read player {}: {}",
                    player_id, e
                ))
            })?;

        let player = item
            .map(SeasonPlayer::from_item)
            .transpose()
            .map_err(|e| {
                PodiumError::resolution_failed(format!(
                    "Player {} has an unreadable record: {}",
                    player_id, e
                ))
            })?;

        Ok(player)
    }
}

/// Reject submissions whose participants cannot be told apart
///
/// A known player may appear only once, and two first-time players may not
/// share a display name (compared trimmed and case-insensitively).
pub fn check_participants(results: &[SubmittedResult]) -> Result<()> {
    let mut known_ids = HashSet::new();
    let mut new_names = HashSet::new();

    for result in results {
        match &result.player_id {
            Some(player_id) => {
                if !known_ids.insert(player_id.as_str()) {
                    return Err(PodiumError::invalid_input(format!(
                        "Player {} appears more than once in the submission",
                        player_id
                    ))
                    .into());
                }
            }
            None => {
                let name = result.player_name.trim();
                if name.is_empty() {
                    return Err(PodiumError::invalid_input(
                        "New players must have a non-empty playerName",
                    )
                    .into());
                }

                if !new_names.insert(name.to_lowercase()) {
                    return Err(PodiumError::invalid_input(format!(
                        "More than one new player is named '{}'",
                        name
                    ))
                    .into());
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Item, MockStorageGateway};
    use crate::types::SeasonConfig;

    struct FixedIds;

    impl IdGenerator for FixedIds {
        fn generate(&self, kind: EntityKind, _at: DateTime<Utc>) -> String {
            format!("{}#new", kind.prefix())
        }
    }

    fn season() -> Season {
        Season {
            id: "season#001".to_string(),
            name: "Test season".to_string(),
            created_at: Utc::now(),
            start_date: Utc::now(),
            end_date: None,
            config: SeasonConfig {
                starting_elo: 1000,
                k: 32.0,
                d: 400.0,
            },
        }
    }

    fn stored_player(id: &str, elo: i64) -> Item {
        SeasonPlayer {
            id: id.to_string(),
            season: "season#001".to_string(),
            name: "Doug Judy".to_string(),
            created_at: Utc::now(),
            elo,
            games_played: 4,
        }
        .to_item()
        .unwrap()
    }

    #[tokio::test]
    async fn test_resolves_known_and_new_players_in_order() {
        let mut storage = MockStorageGateway::new();
        storage
            .expect_get()
            .withf(|key| key.partition == "player#001" && key.sort == "season#001")
            .times(1)
            .returning(|_| Ok(Some(stored_player("player#001", 1310))));

        let resolver = PlayerResolver::new(Arc::new(storage), Arc::new(FixedIds));
        let results = vec![
            SubmittedResult::unknown("  Trudy Judy ", 1),
            SubmittedResult::known("player#001", 2),
        ];

        let resolved = resolver
            .resolve(&season(), &results, Utc::now())
            .await
            .unwrap();

        assert_eq!(resolved.len(), 2);
        assert!(resolved[0].is_new);
        assert_eq!(resolved[0].player.id, "player#new");
        assert_eq!(resolved[0].player.name, "Trudy Judy");
        assert_eq!(resolved[0].player.elo, 1000);
        assert_eq!(resolved[0].player.games_played, 0);
        assert!(!resolved[1].is_new);
        assert_eq!(resolved[1].player.elo, 1310);
        assert_eq!(resolved[1].placement, 2);
        assert_eq!(resolved[1].submission_index, 1);
    }

    #[tokio::test]
    async fn test_missing_known_player_fails_resolution() {
        let mut storage = MockStorageGateway::new();
        storage.expect_get().returning(|_| Ok(None));

        let resolver = PlayerResolver::new(Arc::new(storage), Arc::new(FixedIds));
        let results = vec![
            SubmittedResult::known("player#ghost", 1),
            SubmittedResult::unknown("Abed Nadir", 2),
        ];

        let error = resolver
            .resolve(&season(), &results, Utc::now())
            .await
            .unwrap_err();

        assert!(matches!(
            error.downcast_ref::<PodiumError>(),
            Some(PodiumError::PlayerResolutionFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_storage_failure_is_persistence_error() {
        let mut storage = MockStorageGateway::new();
        storage
            .expect_get()
            .returning(|_| Err(anyhow::anyhow!("connection reset")));

        let resolver = PlayerResolver::new(Arc::new(storage), Arc::new(FixedIds));
        let results = vec![
            SubmittedResult::known("player#001", 1),
            SubmittedResult::unknown("Abed Nadir", 2),
        ];

        let error = resolver
            .resolve(&season(), &results, Utc::now())
            .await
            .unwrap_err();

        assert!(matches!(
            error.downcast_ref::<PodiumError>(),
            Some(PodiumError::PersistenceFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_duplicates_rejected_before_storage_access() {
        let mut storage = MockStorageGateway::new();
        storage.expect_get().never();
        let resolver = PlayerResolver::new(Arc::new(storage), Arc::new(FixedIds));

        let duplicate_names = vec![
            SubmittedResult::unknown("Abed", 1),
            SubmittedResult::unknown("abed ", 2),
        ];
        let duplicate_ids = vec![
            SubmittedResult::known("player#001", 1),
            SubmittedResult::known("player#001", 2),
        ];

        for results in [duplicate_names, duplicate_ids] {
            let error = resolver
                .resolve(&season(), &results, Utc::now())
                .await
                .unwrap_err();
            assert!(matches!(
                error.downcast_ref::<PodiumError>(),
                Some(PodiumError::InvalidInput { .. })
            ));
        }
    }

    #[test]
    fn test_new_player_needs_a_name() {
        let results = vec![
            SubmittedResult::unknown("   ", 1),
            SubmittedResult::unknown("Annie", 2),
        ];

        assert!(check_participants(&results).is_err());
    }
}
