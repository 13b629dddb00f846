//! Storage gateway interface
//!
//! The ledger talks to a single table addressed by a partition/sort key pair
//! with two secondary indexes. Items are plain JSON objects; the `records`
//! module maps them to and from typed records.

pub mod memory;

pub use memory::InMemoryStorage;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// A stored item
pub type Item = serde_json::Map<String, Value>;

/// Primary partition key attribute
pub const PK1: &str = "pk1";
/// Primary sort key attribute
pub const SK1: &str = "sk1";
/// Season membership index partition key
pub const PK2: &str = "pk2";
/// Season membership index sort key
pub const SK2: &str = "sk2";
/// Season listing index partition key
pub const PK3: &str = "pk3";
/// Season listing index sort key
pub const SK3: &str = "sk3";

/// Primary key of an item
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey {
    pub partition: String,
    pub sort: String,
}

impl ItemKey {
    pub fn new(partition: impl Into<String>, sort: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            sort: sort.into(),
        }
    }

    /// Read the primary key attributes of an item
    pub fn of_item(item: &Item) -> Result<Self, StorageError> {
        match (string_attribute(item, PK1), string_attribute(item, SK1)) {
            (Some(partition), Some(sort)) => Ok(Self::new(partition, sort)),
            _ => Err(StorageError::MissingKey {
                reason: format!("item must carry string attributes {} and {}", PK1, SK1),
            }),
        }
    }
}

impl std::fmt::Display for ItemKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.partition, self.sort)
    }
}

/// Indexes that can be queried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Index {
    /// The table itself, keyed by (pk1, sk1)
    Primary,
    /// Everything that belongs to a season, keyed by (pk2, sk2)
    SeasonMembers,
    /// All seasons, keyed by (pk3, sk3)
    Seasons,
}

impl Index {
    /// Partition and sort key attribute names of the index
    pub fn key_attributes(&self) -> (&'static str, &'static str) {
        match self {
            Index::Primary => (PK1, SK1),
            Index::SeasonMembers => (PK2, SK2),
            Index::Seasons => (PK3, SK3),
        }
    }
}

/// Precondition attached to a write
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// No item may exist under the key yet
    KeyAbsent,
    /// An item must already exist under the key
    KeyPresent,
    /// The stored attribute must equal `value`
    AttributeEquals { name: String, value: Value },
}

/// One operation of an atomic write
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Store a whole item, replacing any previous version
    Put {
        item: Item,
        conditions: Vec<Condition>,
    },
    /// Overwrite `set` attributes and add to numeric `increment` attributes
    Update {
        key: ItemKey,
        set: Item,
        increment: Vec<(String, i64)>,
        conditions: Vec<Condition>,
    },
}

impl WriteOp {
    /// Primary key the operation targets
    pub fn key(&self) -> Result<ItemKey, StorageError> {
        match self {
            WriteOp::Put { item, .. } => ItemKey::of_item(item),
            WriteOp::Update { key, .. } => Ok(key.clone()),
        }
    }

    pub fn conditions(&self) -> &[Condition] {
        match self {
            WriteOp::Put { conditions, .. } | WriteOp::Update { conditions, .. } => conditions,
        }
    }
}

/// Storage-level failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StorageError {
    #[error("Transaction cancelled, condition failed for {key}: {reason}")]
    ConditionFailed { key: ItemKey, reason: String },

    #[error("Transaction cancelled, multiple operations target {key}")]
    DuplicateKey { key: ItemKey },

    #[error("Item key missing: {reason}")]
    MissingKey { reason: String },

    #[error("Item could not be converted: {message}")]
    Serialization { message: String },

    #[error("Storage unavailable: {message}")]
    Unavailable { message: String },
}

/// Key-value access to the ledger table
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Fetch a single item by primary key
    async fn get(&self, key: &ItemKey) -> crate::error::Result<Option<Item>>;

    /// Fetch every item of `index` whose partition key equals `partition` and
    /// whose sort key starts with `sort_prefix`, ordered by sort key
    async fn query(
        &self,
        index: Index,
        partition: &str,
        sort_prefix: &str,
    ) -> crate::error::Result<Vec<Item>>;

    /// Apply all operations or none of them
    async fn transact_write(&self, operations: Vec<WriteOp>) -> crate::error::Result<()>;
}

/// Read a string attribute from an item
pub fn string_attribute<'a>(item: &'a Item, name: &str) -> Option<&'a str> {
    item.get(name).and_then(Value::as_str)
}
