//! Row store adapter - connection lifecycle and the fixed statement set
//!
//! # Design Principles
//!
//! - One store handle per invocation, opened by a `StoreConnector`
//! - Handles are closed explicitly; dropping one also releases it
//! - No business logic here: absence and conflicts surface as typed errors
//!   and the engines decide what they mean

pub mod memory;
pub mod mysql;

use async_trait::async_trait;

use crate::models::{ReservationRecord, TableName};

pub use memory::{InjectedFault, MemoryConnector, MemoryStore};
pub use mysql::{MySqlConnector, MySqlStore};

/// Row store error type
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not connect to {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("timed out after {seconds}s connecting to {target}")]
    ConnectTimeout { target: String, seconds: u64 },

    #[error("table '{table}' does not exist")]
    TableMissing { table: String },

    #[error("table '{table}' already exists")]
    TableExists { table: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Failure reported by a non-SQL backend.
    #[error("store failure: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn is_table_missing(&self) -> bool {
        matches!(self, Self::TableMissing { .. })
    }

    pub fn is_table_exists(&self) -> bool {
        matches!(self, Self::TableExists { .. })
    }
}

/// Operations the provisioning, loading and lookup engines need from the
/// backing table.
#[async_trait]
pub trait RowStore: Send {
    /// `SELECT COUNT(*)` on the table.
    async fn count_rows(&mut self, table: &TableName) -> Result<i64, StoreError>;

    /// Create the table with the fixed reservation schema.
    async fn create_table(&mut self, table: &TableName) -> Result<(), StoreError>;

    /// Insert one record as a new row.
    async fn insert_record(
        &mut self,
        table: &TableName,
        record: &ReservationRecord,
    ) -> Result<(), StoreError>;

    /// The most recently inserted row whose id equals `reservation_id`
    /// exactly, if any.
    async fn find_latest(
        &mut self,
        table: &TableName,
        reservation_id: &str,
    ) -> Result<Option<ReservationRecord>, StoreError>;

    async fn drop_table(&mut self, table: &TableName) -> Result<(), StoreError>;

    /// Remove every row, keeping the table.
    async fn delete_all(&mut self, table: &TableName) -> Result<u64, StoreError>;

    /// Release the handle.
    async fn close(self) -> Result<(), StoreError>
    where
        Self: Sized;
}

/// Opens a fresh store handle for one invocation.
#[async_trait]
pub trait StoreConnector: Send + Sync + 'static {
    type Store: RowStore;

    async fn open(&self) -> Result<Self::Store, StoreError>;

    /// Human-readable target for logs. Never includes secrets.
    fn describe(&self) -> String;
}
