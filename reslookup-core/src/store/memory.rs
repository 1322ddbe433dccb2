//! In-memory row store with the same observable semantics as the MySQL
//! store: auto-increment ids, missing/exists errors, no uniqueness on the
//! reservation id. Handles share state, so several "invocations" can race
//! against one store. Faults can be injected for tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{RowStore, StoreConnector, StoreError};
use crate::models::{ReservationRecord, TableName};

/// Failure raised by a fault armed on a `MemoryStore`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InjectedFault {
    #[error("count refused")]
    Count,
    #[error("create refused")]
    Create,
    #[error("insert refused")]
    Insert,
}

impl From<InjectedFault> for StoreError {
    fn from(fault: InjectedFault) -> Self {
        StoreError::Backend(Box::new(fault))
    }
}

#[derive(Default)]
struct MemoryTable {
    next_id: i64,
    rows: Vec<(i64, ReservationRecord)>,
}

#[derive(Default)]
struct MemoryState {
    tables: HashMap<String, MemoryTable>,
    /// Inserts allowed before every further insert fails.
    inserts_remaining: Option<usize>,
    /// Count queries still to fail.
    counts_to_fail: usize,
    fail_creates: bool,
    open_handles: usize,
    create_calls: usize,
}

/// Shared in-memory store handle.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let `n` more inserts succeed, then fail every insert after that.
    pub async fn fail_inserts_after(&self, n: usize) {
        self.state.lock().await.inserts_remaining = Some(n);
    }

    /// Make the next `n` count queries fail with a non-missing-table error.
    pub async fn fail_counts(&self, n: usize) {
        self.state.lock().await.counts_to_fail = n;
    }

    /// Make every create fail with a non-exists error.
    pub async fn fail_creates(&self, fail: bool) {
        self.state.lock().await.fail_creates = fail;
    }

    /// Rows of a table in insertion order, or `None` if it doesn't exist.
    pub async fn rows(&self, table: &TableName) -> Option<Vec<ReservationRecord>> {
        let state = self.state.lock().await;
        state
            .tables
            .get(table.as_str())
            .map(|t| t.rows.iter().map(|(_, r)| r.clone()).collect())
    }

    pub async fn table_exists(&self, table: &TableName) -> bool {
        self.state.lock().await.tables.contains_key(table.as_str())
    }

    /// Handles opened through a connector and not yet closed.
    pub async fn open_handles(&self) -> usize {
        self.state.lock().await.open_handles
    }

    /// Number of `create_table` calls, successful or not.
    pub async fn create_calls(&self) -> usize {
        self.state.lock().await.create_calls
    }

    fn missing(table: &TableName) -> StoreError {
        StoreError::TableMissing {
            table: table.to_string(),
        }
    }
}

#[async_trait]
impl RowStore for MemoryStore {
    async fn count_rows(&mut self, table: &TableName) -> Result<i64, StoreError> {
        let mut state = self.state.lock().await;
        if state.counts_to_fail > 0 {
            state.counts_to_fail -= 1;
            return Err(InjectedFault::Count.into());
        }
        state
            .tables
            .get(table.as_str())
            .map(|t| t.rows.len() as i64)
            .ok_or_else(|| Self::missing(table))
    }

    async fn create_table(&mut self, table: &TableName) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.create_calls += 1;
        if state.fail_creates {
            return Err(InjectedFault::Create.into());
        }
        if state.tables.contains_key(table.as_str()) {
            return Err(StoreError::TableExists {
                table: table.to_string(),
            });
        }
        state.tables.insert(
            table.as_str().to_owned(),
            MemoryTable {
                next_id: 1,
                rows: Vec::new(),
            },
        );
        Ok(())
    }

    async fn insert_record(
        &mut self,
        table: &TableName,
        record: &ReservationRecord,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if let Some(remaining) = state.inserts_remaining.as_mut() {
            if *remaining == 0 {
                return Err(InjectedFault::Insert.into());
            }
            *remaining -= 1;
        }
        let t = state
            .tables
            .get_mut(table.as_str())
            .ok_or_else(|| Self::missing(table))?;
        let id = t.next_id;
        t.next_id += 1;
        t.rows.push((id, record.clone()));
        Ok(())
    }

    async fn find_latest(
        &mut self,
        table: &TableName,
        reservation_id: &str,
    ) -> Result<Option<ReservationRecord>, StoreError> {
        let state = self.state.lock().await;
        let t = state
            .tables
            .get(table.as_str())
            .ok_or_else(|| Self::missing(table))?;
        Ok(t.rows
            .iter()
            .filter(|(_, r)| r.reservation_id == reservation_id)
            .max_by_key(|(id, _)| *id)
            .map(|(_, r)| r.clone()))
    }

    async fn drop_table(&mut self, table: &TableName) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state
            .tables
            .remove(table.as_str())
            .map(|_| ())
            .ok_or_else(|| Self::missing(table))
    }

    async fn delete_all(&mut self, table: &TableName) -> Result<u64, StoreError> {
        let mut state = self.state.lock().await;
        let t = state
            .tables
            .get_mut(table.as_str())
            .ok_or_else(|| Self::missing(table))?;
        let removed = t.rows.len() as u64;
        t.rows.clear();
        Ok(removed)
    }

    async fn close(self) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.open_handles = state.open_handles.saturating_sub(1);
        Ok(())
    }
}

/// Hands out handles onto one shared `MemoryStore`.
#[derive(Clone, Default)]
pub struct MemoryConnector {
    store: MemoryStore,
}

impl MemoryConnector {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }
}

#[async_trait]
impl StoreConnector for MemoryConnector {
    type Store = MemoryStore;

    async fn open(&self) -> Result<MemoryStore, StoreError> {
        self.store.state.lock().await.open_handles += 1;
        Ok(self.store.clone())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
