//! Mapping between typed ledger records and storage items
//!
//! | record | pk1 | sk1 | pk2 | sk2 | pk3 | sk3 |
//! |---|---|---|---|---|---|---|
//! | Season | season id | `season` | | | `season` | season id |
//! | SeasonPlayer | player id | season id | season id | player id | | |
//! | Game | game id | season id | season id | game id | | |

use crate::storage::{Item, ItemKey, StorageError, PK1, PK2, PK3, SK1, SK2, SK3};
use crate::types::{Game, Season, SeasonPlayer};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Sort key of season items, and partition key of the season listing index
pub const SEASON_SORT_KEY: &str = "season";

/// Attribute holding the record type
pub const TYPE_ATTRIBUTE: &str = "type";

pub const ELO_ATTRIBUTE: &str = "elo";
pub const GAMES_PLAYED_ATTRIBUTE: &str = "gamesPlayed";
pub const END_DATE_ATTRIBUTE: &str = "endDate";

/// A record that lives in the ledger table
pub trait StoredRecord: Serialize + DeserializeOwned {
    /// Value of the `type` attribute
    const TYPE: &'static str;

    /// Primary key of the record
    fn key(&self) -> ItemKey;

    /// Secondary index attributes of the record
    fn index_attributes(&self) -> Vec<(&'static str, String)>;

    /// Convert the record to a storage item, key attributes included
    fn to_item(&self) -> Result<Item, StorageError> {
        let mut item = match serde_json::to_value(self) {
            Ok(Value::Object(item)) => item,
            Ok(other) => {
                return Err(StorageError::Serialization {
                    message: format!("{} serialized to a non-object: {}", Self::TYPE, other),
                })
            }
            Err(e) => {
                return Err(StorageError::Serialization {
                    message: format!("Failed to serialize {}: {}", Self::TYPE, e),
                })
            }
        };

        let key = self.key();
        item.insert(PK1.to_string(), Value::from(key.partition));
        item.insert(SK1.to_string(), Value::from(key.sort));
        for (name, value) in self.index_attributes() {
            item.insert(name.to_string(), Value::from(value));
        }
        item.insert(TYPE_ATTRIBUTE.to_string(), Value::from(Self::TYPE));

        Ok(item)
    }

    /// Rebuild the record from a storage item
    fn from_item(item: Item) -> Result<Self, StorageError> {
        serde_json::from_value(Value::Object(item)).map_err(|e| StorageError::Serialization {
            message: format!("Failed to deserialize {}: {}", Self::TYPE, e),
        })
    }
}

pub fn season_key(season_id: &str) -> ItemKey {
    ItemKey::new(season_id, SEASON_SORT_KEY)
}

pub fn player_key(player_id: &str, season_id: &str) -> ItemKey {
    ItemKey::new(player_id, season_id)
}

impl StoredRecord for Season {
    const TYPE: &'static str = "season";

    fn key(&self) -> ItemKey {
        season_key(&self.id)
    }

    fn index_attributes(&self) -> Vec<(&'static str, String)> {
        vec![(PK3, SEASON_SORT_KEY.to_string()), (SK3, self.id.clone())]
    }
}

impl StoredRecord for SeasonPlayer {
    const TYPE: &'static str = "player";

    fn key(&self) -> ItemKey {
        player_key(&self.id, &self.season)
    }

    fn index_attributes(&self) -> Vec<(&'static str, String)> {
        vec![(PK2, self.season.clone()), (SK2, self.id.clone())]
    }
}

impl StoredRecord for Game {
    const TYPE: &'static str = "game";

    fn key(&self) -> ItemKey {
        ItemKey::new(self.id.clone(), self.season.id.clone())
    }

    fn index_attributes(&self) -> Vec<(&'static str, String)> {
        vec![(PK2, self.season.id.clone()), (SK2, self.id.clone())]
    }
}
