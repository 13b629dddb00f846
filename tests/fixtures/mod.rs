//! Test fixtures and storage doubles for integration testing

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use podium::config::AppConfig;
use podium::error::Result;
use podium::identity::{EntityKind, IdGenerator};
use podium::metrics::MetricsCollector;
use podium::service::AppState;
use podium::storage::{Index, InMemoryStorage, Item, ItemKey, StorageGateway, WriteOp};
use podium::types::{SeasonConfig, SubmittedResult};
use podium::LedgerService;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Deterministic identifiers: `<kind>#000001`, `<kind>#000002`, ...
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl IdGenerator for SequentialIdGenerator {
    fn generate(&self, kind: EntityKind, _at: DateTime<Utc>) -> String {
        let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}#{:06}", kind.prefix(), n)
    }
}

/// In-memory storage that can commit a foreign transaction right before
/// the next write, as if another request got there first
#[derive(Default)]
pub struct RacingStorage {
    inner: InMemoryStorage,
    interleaved: Mutex<Option<Vec<WriteOp>>>,
    writes: AtomicU64,
}

impl RacingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit `operations` just before the next transaction
    pub fn interleave(&self, operations: Vec<WriteOp>) {
        if let Ok(mut interleaved) = self.interleaved.lock() {
            *interleaved = Some(operations);
        }
    }

    /// Transactions attempted so far, interleaved ones excluded
    pub fn write_attempts(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn item_count(&self) -> usize {
        self.inner.item_count().unwrap_or_default()
    }
}

#[async_trait]
impl StorageGateway for RacingStorage {
    async fn get(&self, key: &ItemKey) -> Result<Option<Item>> {
        self.inner.get(key).await
    }

    async fn query(&self, index: Index, partition: &str, sort_prefix: &str) -> Result<Vec<Item>> {
        self.inner.query(index, partition, sort_prefix).await
    }

    async fn transact_write(&self, operations: Vec<WriteOp>) -> Result<()> {
        let interleaved = self
            .interleaved
            .lock()
            .map(|mut pending| pending.take())
            .unwrap_or_default();
        if let Some(foreign) = interleaved {
            self.inner.transact_write(foreign).await?;
        }

        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.transact_write(operations).await
    }
}

/// Storage that serves reads but refuses every write
#[derive(Default)]
pub struct ReadOnlyStorage {
    inner: InMemoryStorage,
}

impl ReadOnlyStorage {
    /// Wrap a table that was populated beforehand
    pub fn new(inner: InMemoryStorage) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl StorageGateway for ReadOnlyStorage {
    async fn get(&self, key: &ItemKey) -> Result<Option<Item>> {
        self.inner.get(key).await
    }

    async fn query(&self, index: Index, partition: &str, sort_prefix: &str) -> Result<Vec<Item>> {
        self.inner.query(index, partition, sort_prefix).await
    }

    async fn transact_write(&self, _operations: Vec<WriteOp>) -> Result<()> {
        Err(anyhow::anyhow!("ProvisionedThroughputExceeded"))
    }
}

/// Ledger over the given storage with deterministic identifiers
pub fn ledger_with(storage: Arc<dyn StorageGateway>) -> LedgerService {
    LedgerService::new(
        storage,
        Arc::new(SequentialIdGenerator::default()),
        SeasonConfig::default(),
        Arc::new(MetricsCollector::new().expect("Failed to create metrics collector")),
    )
}

/// Ledger over a fresh in-memory table
pub fn ledger() -> LedgerService {
    ledger_with(Arc::new(InMemoryStorage::new()))
}

/// Application state over a fresh in-memory table
pub fn app_state() -> Arc<AppState> {
    Arc::new(
        AppState::with_components(
            AppConfig::default(),
            Arc::new(InMemoryStorage::new()),
            Arc::new(SequentialIdGenerator::default()),
        )
        .expect("Failed to create app state"),
    )
}

/// Results for first-time players, placed in the given order
pub fn newcomers(names: &[&str]) -> Vec<SubmittedResult> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| SubmittedResult::unknown(*name, i as u32 + 1))
        .collect()
}
