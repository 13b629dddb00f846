//! Ledger service
//!
//! Entry point for every ledger operation. A game submission runs through
//! validation, season lookup, player resolution, rating and recording, and
//! either commits completely or returns an error.

use crate::error::{ErrorClass, PodiumError, Result};
use crate::identity::{current_timestamp, EntityKind, IdGenerator};
use crate::ledger::recorder::GameRecorder;
use crate::ledger::resolution::PlayerResolver;
use crate::metrics::MetricsCollector;
use crate::rating::{
    validate_season_config, MultiEloCalculator, PlacementEntry, RatingCalculator, RatingChange,
};
use crate::records::{
    player_key, season_key, StoredRecord, END_DATE_ATTRIBUTE, SEASON_SORT_KEY,
};
use crate::storage::{Condition, Index, Item, ItemKey, StorageGateway, WriteOp};
use crate::types::{Game, GameSubmission, Season, SeasonConfig, SeasonPlayer};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Season, player and game operations over one storage gateway
pub struct LedgerService {
    storage: Arc<dyn StorageGateway>,
    id_generator: Arc<dyn IdGenerator>,
    resolver: PlayerResolver,
    recorder: GameRecorder,
    default_config: SeasonConfig,
    metrics: Arc<MetricsCollector>,
}

impl LedgerService {
    pub fn new(
        storage: Arc<dyn StorageGateway>,
        id_generator: Arc<dyn IdGenerator>,
        default_config: SeasonConfig,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            resolver: PlayerResolver::new(storage.clone(), id_generator.clone()),
            recorder: GameRecorder::new(storage.clone(), id_generator.clone()),
            storage,
            id_generator,
            default_config,
            metrics,
        }
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    pub fn storage(&self) -> Arc<dyn StorageGateway> {
        self.storage.clone()
    }

    /// Record one game and update the rating of every participant
    ///
    /// Submitting the same game twice records it twice.
    pub async fn submit_game(&self, submission: GameSubmission) -> Result<Game> {
        let timer = self.metrics.start_timer();
        let participants = submission.results.len();

        match self.process_submission(submission).await {
            Ok((game, changes, new_players)) => {
                self.metrics.record_game(&changes, new_players, timer.stop());
                Ok(game)
            }
            Err(e) => {
                let kind = e
                    .downcast_ref::<PodiumError>()
                    .map(PodiumError::kind)
                    .unwrap_or("unclassified");
                let class = e
                    .downcast_ref::<PodiumError>()
                    .map(PodiumError::class)
                    .unwrap_or(ErrorClass::Server);

                match class {
                    ErrorClass::Server => error!(
                        "Game submission with {} participants failed: {}",
                        participants, e
                    ),
                    _ => warn!(
                        "Game submission with {} participants rejected: {}",
                        participants, e
                    ),
                }

                self.metrics.record_submission_failure(kind, timer.stop());
                Err(e)
            }
        }
    }

    async fn process_submission(
        &self,
        submission: GameSubmission,
    ) -> Result<(Game, Vec<RatingChange>, usize)> {
        validate_submission(&submission)?;

        let season = self.get_season(&submission.season_id).await?;
        let at = current_timestamp();

        let participants = self
            .resolver
            .resolve(&season, &submission.results, at)
            .await?;

        let entries: Vec<PlacementEntry> = participants
            .iter()
            .map(|participant| {
                PlacementEntry::new(
                    participant.player.id.clone(),
                    participant.placement,
                    participant.player.elo,
                )
            })
            .collect();

        let calculator = MultiEloCalculator::for_season(&season.config)?;
        let changes = calculator.calculate_rating_changes(&entries)?;

        debug!(
            "Computed ratings for season {} with {}",
            season.id,
            calculator.config()
        );

        let game = self
            .recorder
            .record(&season, &participants, &changes, at)
            .await?;
        let new_players = participants.iter().filter(|p| p.is_new).count();

        Ok((game, changes, new_players))
    }

    /// Create a season, falling back to the configured rating defaults
    pub async fn create_season(
        &self,
        name: &str,
        config: Option<SeasonConfig>,
    ) -> Result<Season> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PodiumError::invalid_input("A season needs a non-empty name").into());
        }

        let config = config.unwrap_or(self.default_config);
        validate_season_config(&config)?;

        let now = current_timestamp();
        let season = Season {
            id: self.id_generator.generate(EntityKind::Season, now),
            name: name.to_string(),
            created_at: now,
            start_date: now,
            end_date: None,
            config,
        };

        self.storage
            .transact_write(vec![WriteOp::Put {
                item: season.to_item()?,
                conditions: vec![Condition::KeyAbsent],
            }])
            .await
            .map_err(|e| persistence_error("save season", e))?;

        self.metrics.record_season_created();
        info!("Created season {} ('{}')", season.id, season.name);

        Ok(season)
    }

    pub async fn get_season(&self, season_id: &str) -> Result<Season> {
        let item = self
            .storage
            .get(&season_key(season_id))
            .await
            .map_err(|e| persistence_error("read season", e))?;

        match item {
            Some(item) => Ok(Season::from_item(item)?),
            None => Err(PodiumError::SeasonNotFound {
                season_id: season_id.to_string(),
            }
            .into()),
        }
    }

    /// All seasons, oldest first
    pub async fn list_seasons(&self) -> Result<Vec<Season>> {
        let items = self
            .storage
            .query(Index::Seasons, SEASON_SORT_KEY, &EntityKind::Season.key_prefix())
            .await
            .map_err(|e| persistence_error("list seasons", e))?;

        items
            .into_iter()
            .map(|item| Season::from_item(item).map_err(Into::into))
            .collect()
    }

    /// Close a season. A season can only be ended once.
    pub async fn end_season(&self, season_id: &str, at: DateTime<Utc>) -> Result<Season> {
        let mut season = self.get_season(season_id).await?;
        if let Some(end_date) = season.end_date {
            return Err(PodiumError::invalid_input(format!(
                "Season {} already ended at {}",
                season_id,
                end_date.to_rfc3339()
            ))
            .into());
        }

        season.end_date = Some(at);

        let mut set = Item::new();
        set.insert(END_DATE_ATTRIBUTE.to_string(), serde_json::to_value(at)?);

        self.storage
            .transact_write(vec![WriteOp::Update {
                key: season.key(),
                set,
                increment: Vec::new(),
                conditions: vec![
                    Condition::KeyPresent,
                    Condition::AttributeEquals {
                        name: END_DATE_ATTRIBUTE.to_string(),
                        value: Value::Null,
                    },
                ],
            }])
            .await
            .map_err(|e| persistence_error("end season", e))?;

        info!("Ended season {}", season_id);
        Ok(season)
    }

    /// Add a player to a season before their first game
    pub async fn register_player(&self, season_id: &str, name: &str) -> Result<SeasonPlayer> {
        if name.trim().is_empty() {
            return Err(PodiumError::invalid_input("A player needs a non-empty name").into());
        }

        let season = self.get_season(season_id).await?;
        let player = self.resolver.mint_player(&season, name, current_timestamp());

        self.storage
            .transact_write(vec![WriteOp::Put {
                item: player.to_item()?,
                conditions: vec![Condition::KeyAbsent],
            }])
            .await
            .map_err(|e| persistence_error("save player", e))?;

        self.metrics.record_player_registered();
        info!("Registered player {} in season {}", player.id, season.id);

        Ok(player)
    }

    pub async fn get_player(&self, season_id: &str, player_id: &str) -> Result<SeasonPlayer> {
        let item = self
            .storage
            .get(&player_key(player_id, season_id))
            .await
            .map_err(|e| persistence_error("read player", e))?;

        match item {
            Some(item) => Ok(SeasonPlayer::from_item(item)?),
            None => Err(PodiumError::PlayerNotFound {
                player_id: player_id.to_string(),
                season_id: season_id.to_string(),
            }
            .into()),
        }
    }

    /// All players of a season, oldest first
    pub async fn list_players(&self, season_id: &str) -> Result<Vec<SeasonPlayer>> {
        self.get_season(season_id).await?;

        let items = self
            .storage
            .query(
                Index::SeasonMembers,
                season_id,
                &EntityKind::Player.key_prefix(),
            )
            .await
            .map_err(|e| persistence_error("list players", e))?;

        items
            .into_iter()
            .map(|item| SeasonPlayer::from_item(item).map_err(Into::into))
            .collect()
    }

    /// Look up a game by id alone
    pub async fn get_game(&self, game_id: &str) -> Result<Game> {
        if !EntityKind::Game.owns(game_id) {
            return Err(PodiumError::GameNotFound {
                game_id: game_id.to_string(),
            }
            .into());
        }

        let items = self
            .storage
            .query(Index::Primary, game_id, &EntityKind::Season.key_prefix())
            .await
            .map_err(|e| persistence_error("read game", e))?;

        match items.into_iter().next() {
            Some(item) => Ok(Game::from_item(item)?),
            None => Err(PodiumError::GameNotFound {
                game_id: game_id.to_string(),
            }
            .into()),
        }
    }

    /// All games of a season, oldest first
    pub async fn list_games(&self, season_id: &str) -> Result<Vec<Game>> {
        self.get_season(season_id).await?;

        let items = self
            .storage
            .query(
                Index::SeasonMembers,
                season_id,
                &EntityKind::Game.key_prefix(),
            )
            .await
            .map_err(|e| persistence_error("list games", e))?;

        items
            .into_iter()
            .map(|item| Game::from_item(item).map_err(Into::into))
            .collect()
    }

    /// Probe storage with a cheap read
    pub async fn check_storage(&self) -> Result<()> {
        self.storage
            .get(&ItemKey::new("health#probe", SEASON_SORT_KEY))
            .await
            .map(|_| ())
    }
}

/// Reject submissions the rating engine could never accept
pub fn validate_submission(submission: &GameSubmission) -> Result<()> {
    if submission.season_id.trim().is_empty() {
        return Err(PodiumError::invalid_input("seasonId is required").into());
    }

    if submission.results.len() < 2 {
        return Err(PodiumError::invalid_input(format!(
            "A game needs at least 2 results, got {}",
            submission.results.len()
        ))
        .into());
    }

    if let Some(result) = submission.results.iter().find(|r| r.placement == 0) {
        return Err(PodiumError::invalid_input(format!(
            "Placements start at 1, got 0 for {}",
            result
                .player_id
                .clone()
                .unwrap_or_else(|| result.player_name.clone())
        ))
        .into());
    }

    Ok(())
}

fn persistence_error(action: &str, error: anyhow::Error) -> anyhow::Error {
    error!("Failed to {}: {}", action, error);
    PodiumError::persistence_failed(format!("Failed to {}: {}", action, error)).into()
}
