//! In-memory storage gateway
//!
//! Used for local runs and tests. Transactions evaluate every condition and
//! build every new item version under one write lock before anything is
//! applied, so a failed transaction leaves the table untouched and
//! overlapping transactions are serialized.

use crate::storage::{
    string_attribute, Condition, Index, Item, ItemKey, StorageError, StorageGateway, WriteOp,
    PK1, SK1,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::RwLock;
use tracing::{debug, warn};

/// In-memory table implementation
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    items: RwLock<BTreeMap<ItemKey, Item>>,
}

impl InMemoryStorage {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Get total number of stored items
    pub fn item_count(&self) -> crate::error::Result<usize> {
        let items = self.items.read().map_err(|_| StorageError::Unavailable {
            message: "Failed to acquire items read lock".to_string(),
        })?;

        Ok(items.len())
    }
}

fn check_condition(
    key: &ItemKey,
    current: Option<&Item>,
    condition: &Condition,
) -> Result<(), StorageError> {
    let failed = |reason: String| StorageError::ConditionFailed {
        key: key.clone(),
        reason,
    };

    match condition {
        Condition::KeyAbsent if current.is_some() => Err(failed("item already exists".to_string())),
        Condition::KeyPresent if current.is_none() => Err(failed("item does not exist".to_string())),
        Condition::AttributeEquals { name, value } => {
            let stored = current.and_then(|item| item.get(name));
            if stored == Some(value) {
                Ok(())
            } else {
                Err(failed(format!(
                    "expected {} = {}, found {}",
                    name,
                    value,
                    stored.map(Value::to_string).unwrap_or_else(|| "nothing".to_string())
                )))
            }
        }
        _ => Ok(()),
    }
}

/// Compute the version of an item an operation would produce
fn apply_operation(
    key: &ItemKey,
    current: Option<&Item>,
    operation: WriteOp,
) -> Result<Item, StorageError> {
    match operation {
        WriteOp::Put { item, .. } => Ok(item),
        WriteOp::Update { set, increment, .. } => {
            let mut item = current.cloned().unwrap_or_else(|| {
                let mut fresh = Item::new();
                fresh.insert(PK1.to_string(), Value::from(key.partition.clone()));
                fresh.insert(SK1.to_string(), Value::from(key.sort.clone()));
                fresh
            });

            for (name, value) in set {
                item.insert(name, value);
            }

            for (name, amount) in increment {
                let base = match item.get(&name) {
                    None => 0,
                    Some(value) => value.as_i64().ok_or_else(|| StorageError::Serialization {
                        message: format!("attribute {} of {} is not an integer", name, key),
                    })?,
                };
                item.insert(name, Value::from(base + amount));
            }

            Ok(item)
        }
    }
}

#[async_trait]
impl StorageGateway for InMemoryStorage {
    async fn get(&self, key: &ItemKey) -> crate::error::Result<Option<Item>> {
        let items = self.items.read().map_err(|_| StorageError::Unavailable {
            message: "Failed to acquire items read lock".to_string(),
        })?;

        Ok(items.get(key).cloned())
    }

    async fn query(
        &self,
        index: Index,
        partition: &str,
        sort_prefix: &str,
    ) -> crate::error::Result<Vec<Item>> {
        let items = self.items.read().map_err(|_| StorageError::Unavailable {
            message: "Failed to acquire items read lock".to_string(),
        })?;

        let (partition_attribute, sort_attribute) = index.key_attributes();

        let mut matching: Vec<(&str, &Item)> = items
            .values()
            .filter(|item| string_attribute(item, partition_attribute) == Some(partition))
            .filter_map(|item| {
                string_attribute(item, sort_attribute)
                    .filter(|sort| sort.starts_with(sort_prefix))
                    .map(|sort| (sort, item))
            })
            .collect();
        matching.sort_by(|a, b| a.0.cmp(b.0));

        debug!(
            "Query on {:?} for partition '{}' with prefix '{}' matched {} items",
            index,
            partition,
            sort_prefix,
            matching.len()
        );

        Ok(matching.into_iter().map(|(_, item)| item.clone()).collect())
    }

    async fn transact_write(&self, operations: Vec<WriteOp>) -> crate::error::Result<()> {
        let mut items = self.items.write().map_err(|_| StorageError::Unavailable {
            message: "Failed to acquire items write lock".to_string(),
        })?;

        let mut seen = HashSet::new();
        let mut staged = Vec::with_capacity(operations.len());

        for operation in operations {
            let key = operation.key()?;
            if !seen.insert(key.clone()) {
                warn!("Rejecting transaction with duplicate key {}", key);
                return Err(StorageError::DuplicateKey { key }.into());
            }

            let current = items.get(&key);
            for condition in operation.conditions() {
                if let Err(e) = check_condition(&key, current, condition) {
                    warn!("Transaction cancelled: {}", e);
                    return Err(e.into());
                }
            }

            let next = apply_operation(&key, current, operation)?;
            staged.push((key, next));
        }

        let count = staged.len();
        for (key, item) in staged {
            items.insert(key, item);
        }

        debug!("Committed transaction with {} operations", count);
        Ok(())
    }
}
