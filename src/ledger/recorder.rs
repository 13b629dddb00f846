//! Game recording
//!
//! Turns a rated game into storage writes and commits them in a single
//! transaction: the game itself, a put for each first-time player and a
//! conditional update for each returning player.

use crate::error::{PodiumError, Result};
use crate::identity::{EntityKind, IdGenerator};
use crate::ledger::resolution::ResolvedParticipant;
use crate::rating::RatingChange;
use crate::records::{StoredRecord, ELO_ATTRIBUTE, GAMES_PLAYED_ATTRIBUTE};
use crate::storage::{Condition, Item, StorageGateway, WriteOp};
use crate::types::{Game, GameResultItem, GameResultItemPlayer, Season, SeasonPlayer};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Persists rated games
pub struct GameRecorder {
    storage: Arc<dyn StorageGateway>,
    id_generator: Arc<dyn IdGenerator>,
}

impl GameRecorder {
    pub fn new(storage: Arc<dyn StorageGateway>, id_generator: Arc<dyn IdGenerator>) -> Self {
        Self {
            storage,
            id_generator,
        }
    }

    /// Build the game record and commit it with every player write
    pub async fn record(
        &self,
        season: &Season,
        participants: &[ResolvedParticipant],
        changes: &[RatingChange],
        at: DateTime<Utc>,
    ) -> Result<Game> {
        let game_id = self.id_generator.generate(EntityKind::Game, at);
        let game = build_game(game_id, season, participants, changes, at)?;
        let operations = build_write_operations(&game, participants, changes)?;

        debug!(
            "Committing game {} with {} write operations",
            game.id,
            operations.len()
        );

        if let Err(e) = self.storage.transact_write(operations).await {
            error!("Failed to commit game {}: {}", game.id, e);
            return Err(PodiumError::persistence_failed(format!(
                "Game could not be saved: {}",
                e
            ))
            .into());
        }

        info!(
            "Recorded game {} in season {} with {} participants",
            game.id,
            season.id,
            game.results.len()
        );

        Ok(game)
    }
}

/// Pair every rating change with the participant it belongs to
fn match_changes<'a>(
    participants: &'a [ResolvedParticipant],
    changes: &'a [RatingChange],
) -> Result<Vec<(&'a ResolvedParticipant, &'a RatingChange)>> {
    if participants.len() != changes.len() {
        return Err(PodiumError::resolution_failed(format!(
            "{} participants were resolved but {} ratings were computed",
            participants.len(),
            changes.len()
        ))
        .into());
    }

    let mut by_id: HashMap<&str, &ResolvedParticipant> = participants
        .iter()
        .map(|participant| (participant.player.id.as_str(), participant))
        .collect();

    changes
        .iter()
        .map(|change| {
            by_id
                .remove(change.participant_id.as_str())
                .map(|participant| (participant, change))
                .ok_or_else(|| {
                    anyhow::Error::from(PodiumError::resolution_failed(format!(
                        "Rating change for {} has no matching participant",
                        change.participant_id
                    )))
                })
        })
        .collect()
}

/// Assemble a game record, results ordered like `changes`
pub fn build_game(
    game_id: String,
    season: &Season,
    participants: &[ResolvedParticipant],
    changes: &[RatingChange],
    at: DateTime<Utc>,
) -> Result<Game> {
    let results: Vec<GameResultItem> = match_changes(participants, changes)?
        .into_iter()
        .map(|(participant, change)| GameResultItem {
            player: GameResultItemPlayer {
                id: participant.player.id.clone(),
                name: participant.player.name.clone(),
            },
            placement: change.placement,
            elo_before_game: change.rating_before,
            elo_after_game: change.rating_after,
        })
        .collect();

    Ok(Game {
        id: game_id,
        created_at: at,
        player_ids: results.iter().map(|result| result.player.id.clone()).collect(),
        results,
        season: season.clone(),
    })
}

/// Writes that must commit together for `game` to be recorded
pub fn build_write_operations(
    game: &Game,
    participants: &[ResolvedParticipant],
    changes: &[RatingChange],
) -> Result<Vec<WriteOp>> {
    let mut operations = Vec::with_capacity(changes.len() + 1);

    for (participant, change) in match_changes(participants, changes)? {
        let operation = if participant.is_new {
            let player = SeasonPlayer {
                elo: change.rating_after,
                games_played: 1,
                ..participant.player.clone()
            };

            WriteOp::Put {
                item: player.to_item()?,
                conditions: vec![Condition::KeyAbsent],
            }
        } else {
            let mut set = Item::new();
            set.insert(ELO_ATTRIBUTE.to_string(), Value::from(change.rating_after));

            WriteOp::Update {
                key: participant.player.key(),
                set,
                increment: vec![(GAMES_PLAYED_ATTRIBUTE.to_string(), 1)],
                conditions: vec![
                    Condition::KeyPresent,
                    Condition::AttributeEquals {
                        name: GAMES_PLAYED_ATTRIBUTE.to_string(),
                        value: Value::from(participant.player.games_played),
                    },
                ],
            }
        };

        operations.push(operation);
    }

    operations.push(WriteOp::Put {
        item: game.to_item()?,
        conditions: vec![Condition::KeyAbsent],
    });

    Ok(operations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{ItemKey, MockStorageGateway};
    use crate::types::SeasonConfig;

    struct FixedIds;

    impl IdGenerator for FixedIds {
        fn generate(&self, kind: EntityKind, _at: DateTime<Utc>) -> String {
            format!("{}#fixed", kind.prefix())
        }
    }

    fn season() -> Season {
        Season {
            id: "season#001".to_string(),
            name: "Autumn".to_string(),
            created_at: Utc::now(),
            start_date: Utc::now(),
            end_date: None,
            config: SeasonConfig::default(),
        }
    }

    fn participant(index: usize, id: &str, placement: u32, is_new: bool) -> ResolvedParticipant {
        ResolvedParticipant {
            submission_index: index,
            player: SeasonPlayer {
                id: id.to_string(),
                season: "season#001".to_string(),
                name: format!("Player {}", index),
                created_at: Utc::now(),
                elo: 1200,
                games_played: if is_new { 0 } else { 7 },
            },
            placement,
            is_new,
        }
    }

    fn change(id: &str, placement: u32, after: i64) -> RatingChange {
        RatingChange {
            participant_id: id.to_string(),
            placement,
            rating_before: 1200,
            rating_after: after,
        }
    }

    #[test]
    fn test_game_follows_rating_order() {
        let participants = vec![
            participant(0, "player#b", 2, false),
            participant(1, "player#a", 1, true),
        ];
        let changes = vec![change("player#a", 1, 1216), change("player#b", 2, 1184)];

        let game = build_game(
            "game#1".to_string(),
            &season(),
            &participants,
            &changes,
            Utc::now(),
        )
        .unwrap();

        assert_eq!(game.player_ids, vec!["player#a", "player#b"]);
        assert_eq!(game.results[0].player.name, "Player 1");
        assert_eq!(game.results[0].elo_after_game, 1216);
        assert_eq!(game.results[1].elo_before_game, 1200);
        assert_eq!(game.season.id, "season#001");
    }

    #[test]
    fn test_unmatched_change_fails_resolution() {
        let participants = vec![
            participant(0, "player#a", 1, false),
            participant(1, "player#b", 2, false),
        ];
        let changes = vec![change("player#a", 1, 1216), change("player#z", 2, 1184)];

        let error = build_game(
            "game#1".to_string(),
            &season(),
            &participants,
            &changes,
            Utc::now(),
        )
        .unwrap_err();

        assert!(matches!(
            error.downcast_ref::<PodiumError>(),
            Some(PodiumError::PlayerResolutionFailed { .. })
        ));
    }

    #[test]
    fn test_write_operations_per_participant_kind() {
        let participants = vec![
            participant(0, "player#new", 1, true),
            participant(1, "player#old", 2, false),
        ];
        let changes = vec![
            change("player#new", 1, 1216),
            change("player#old", 2, 1184),
        ];
        let game = build_game(
            "game#1".to_string(),
            &season(),
            &participants,
            &changes,
            Utc::now(),
        )
        .unwrap();

        let operations = build_write_operations(&game, &participants, &changes).unwrap();
        assert_eq!(operations.len(), 3);

        match &operations[0] {
            WriteOp::Put { item, conditions } => {
                assert_eq!(item["pk1"], "player#new");
                assert_eq!(item["elo"], 1216);
                assert_eq!(item["gamesPlayed"], 1);
                assert_eq!(conditions, &vec![Condition::KeyAbsent]);
            }
            other => panic!("Expected put, got {:?}", other),
        }

        match &operations[1] {
            WriteOp::Update {
                key,
                set,
                increment,
                conditions,
            } => {
                assert_eq!(key, &ItemKey::new("player#old", "season#001"));
                assert_eq!(set["elo"], 1184);
                assert_eq!(increment, &vec![("gamesPlayed".to_string(), 1)]);
                assert!(conditions.contains(&Condition::AttributeEquals {
                    name: "gamesPlayed".to_string(),
                    value: Value::from(7),
                }));
            }
            other => panic!("Expected update, got {:?}", other),
        }

        match &operations[2] {
            WriteOp::Put { item, .. } => {
                assert_eq!(item["pk1"], "game#1");
                assert_eq!(item["type"], "game");
            }
            other => panic!("Expected game put, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transaction_failure_is_persistence_error() {
        let mut storage = MockStorageGateway::new();
        storage
            .expect_transact_write()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("transaction cancelled")));

        let recorder = GameRecorder::new(Arc::new(storage), Arc::new(FixedIds));
        let participants = vec![
            participant(0, "player#a", 1, false),
            participant(1, "player#b", 2, false),
        ];
        let changes = vec![change("player#a", 1, 1216), change("player#b", 2, 1184)];

        let error = recorder
            .record(&season(), &participants, &changes, Utc::now())
            .await
            .unwrap_err();

        assert!(matches!(
            error.downcast_ref::<PodiumError>(),
            Some(PodiumError::PersistenceFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_record_commits_once() {
        let mut storage = MockStorageGateway::new();
        storage
            .expect_transact_write()
            .withf(|operations| operations.len() == 3)
            .times(1)
            .returning(|_| Ok(()));

        let recorder = GameRecorder::new(Arc::new(storage), Arc::new(FixedIds));
        let participants = vec![
            participant(0, "player#a", 1, false),
            participant(1, "player#b", 2, true),
        ];
        let changes = vec![change("player#a", 1, 1216), change("player#b", 2, 1184)];

        let game = recorder
            .record(&season(), &participants, &changes, Utc::now())
            .await
            .unwrap();
        assert_eq!(game.id, "game#fixed");
    }
}
