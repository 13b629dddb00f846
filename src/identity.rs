//! Identifier generation for ledger records
//!
//! Keys are `<kind>#<uuid v7 as 32 hex chars>`. UUIDv7 leads with the
//! millisecond timestamp followed by a counter, so identifiers from one
//! generator sort lexicographically in creation order within each kind,
//! including ids created in the same millisecond.

use chrono::{DateTime, Utc};
use std::sync::Mutex;
use uuid::{ContextV7, NoContext, Timestamp, Uuid};

/// Namespace prefix for an identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Player,
    Season,
    Game,
}

impl EntityKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            EntityKind::Player => "player",
            EntityKind::Season => "season",
            EntityKind::Game => "game",
        }
    }

    /// Prefix including the separator, as used in sort-key conditions
    pub fn key_prefix(&self) -> String {
        format!("{}#", self.prefix())
    }

    /// Check whether an identifier belongs to this namespace
    pub fn owns(&self, id: &str) -> bool {
        id.strip_prefix(self.prefix())
            .is_some_and(|rest| rest.starts_with('#'))
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

/// Source of record identifiers
pub trait IdGenerator: Send + Sync {
    /// Generate a unique identifier for `kind`, seeded by `at`
    fn generate(&self, kind: EntityKind, at: DateTime<Utc>) -> String;
}

/// Production generator backed by UUIDv7
///
/// The shared context keeps ids monotonic: within one millisecond, or when
/// `at` runs backwards, the counter advances instead.
pub struct TimeOrderedIdGenerator {
    context: Mutex<ContextV7>,
}

impl TimeOrderedIdGenerator {
    pub fn new() -> Self {
        Self {
            context: Mutex::new(ContextV7::new()),
        }
    }
}

impl Default for TimeOrderedIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for TimeOrderedIdGenerator {
    fn generate(&self, kind: EntityKind, at: DateTime<Utc>) -> String {
        // UUIDv7 cannot express instants before the epoch
        let seconds = u64::try_from(at.timestamp()).unwrap_or(0);
        let nanos = at.timestamp_subsec_nanos();
        let timestamp = match self.context.lock() {
            Ok(context) => Timestamp::from_unix(&*context, seconds, nanos),
            Err(_) => Timestamp::from_unix(NoContext, seconds, nanos),
        };
        let uuid = Uuid::new_v7(timestamp);

        format!("{}#{}", kind.prefix(), uuid.simple())
    }
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_generate_unique_ids() {
        let generator = TimeOrderedIdGenerator::new();
        let now = current_timestamp();

        let id1 = generator.generate(EntityKind::Game, now);
        let id2 = generator.generate(EntityKind::Game, now);
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_ids_carry_kind_prefix() {
        let generator = TimeOrderedIdGenerator::new();
        let now = current_timestamp();

        let player = generator.generate(EntityKind::Player, now);
        let season = generator.generate(EntityKind::Season, now);
        let game = generator.generate(EntityKind::Game, now);

        assert!(player.starts_with("player#"));
        assert!(season.starts_with("season#"));
        assert!(game.starts_with("game#"));
        assert_eq!(game.len(), "game#".len() + 32);
    }

    #[test]
    fn test_ids_sort_by_timestamp() {
        let generator = TimeOrderedIdGenerator::new();
        let earlier = current_timestamp();
        let later = earlier + Duration::milliseconds(5);

        let first = generator.generate(EntityKind::Player, earlier);
        let second = generator.generate(EntityKind::Player, later);
        assert!(first < second);
    }

    #[test]
    fn test_ids_in_one_millisecond_keep_creation_order() {
        let generator = TimeOrderedIdGenerator::new();
        let now = current_timestamp();

        let ids: Vec<String> = (0..500)
            .map(|_| generator.generate(EntityKind::Season, now))
            .collect();

        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_kind_ownership() {
        assert!(EntityKind::Player.owns("player#abc"));
        assert!(!EntityKind::Player.owns("players#abc"));
        assert!(!EntityKind::Game.owns("player#abc"));
        assert_eq!(EntityKind::Season.key_prefix(), "season#");
    }
}
