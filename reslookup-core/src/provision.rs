//! Provisioning engine
//!
//! Check, create-if-absent, load-if-empty. Re-evaluated on every invocation;
//! nothing is cached between invocations.

use tracing::{info, warn};

use crate::feed::FeedSource;
use crate::loader::{load_from_feed, LoadError, LoadSummary};
use crate::models::{TableName, TableState};
use crate::store::{RowStore, StoreError};

/// Provisioning error type
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("could not create table '{table}': {source}")]
    Create {
        table: String,
        #[source]
        source: StoreError,
    },

    #[error("could not populate table '{table}': {source}")]
    Load {
        table: String,
        #[source]
        source: LoadError,
    },
}

/// Result of `create_table`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableCreation {
    Created,
    /// Another invocation created it first.
    AlreadyExisted,
}

/// What provisioning had to do before lookups could run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioning {
    /// Table existed with rows; nothing done.
    Ready { rows: i64 },
    /// Table was absent, created here and seeded.
    Created(LoadSummary),
    /// Table existed but was empty and has been seeded.
    Repopulated(LoadSummary),
}

/// Existence and row count of `table`.
///
/// Any count failure reads as absent. Failures that are not a missing table
/// are logged with their cause; they normally resurface when creation is
/// attempted.
pub async fn table_state<S: RowStore>(store: &mut S, table: &TableName) -> TableState {
    match store.count_rows(table).await {
        Ok(rows) => {
            info!(table = %table, rows, "Table has {} entries", rows);
            TableState::present(rows)
        }
        Err(e) if e.is_table_missing() => {
            info!(table = %table, "Table does not exist");
            TableState::absent()
        }
        Err(e) => {
            warn!(table = %table, error = %e, "Count query failed, treating table as absent");
            TableState::absent()
        }
    }
}

/// Create `table` with the reservation schema.
///
/// A table that already exists is not an error.
pub async fn create_table<S: RowStore>(
    store: &mut S,
    table: &TableName,
) -> Result<TableCreation, StoreError> {
    info!(table = %table, "Creating table");
    match store.create_table(table).await {
        Ok(()) => Ok(TableCreation::Created),
        Err(e) if e.is_table_exists() => {
            info!(table = %table, "Table already exists, continuing");
            Ok(TableCreation::AlreadyExisted)
        }
        Err(e) => {
            warn!(table = %table, error = %e, "Could not create table");
            Err(e)
        }
    }
}

/// Make sure `table` exists and holds rows, seeding it from `feed` when it
/// is absent or empty.
pub async fn ensure_provisioned<S, F>(
    store: &mut S,
    feed: &F,
    table: &TableName,
) -> Result<Provisioning, ProvisionError>
where
    S: RowStore,
    F: FeedSource,
{
    let state = table_state(store, table).await;

    if state.exists {
        if !state.is_empty() {
            return Ok(Provisioning::Ready {
                rows: state.row_count,
            });
        }
        let summary = seed(store, feed, table, state.row_count).await?;
        return Ok(Provisioning::Repopulated(summary));
    }

    let creation = create_table(store, table)
        .await
        .map_err(|source| ProvisionError::Create {
            table: table.to_string(),
            source,
        })?;

    match creation {
        TableCreation::Created => {
            let summary = seed(store, feed, table, 0).await?;
            Ok(Provisioning::Created(summary))
        }
        TableCreation::AlreadyExisted => {
            // Lost a creation race; the winner may already have loaded.
            let state = table_state(store, table).await;
            if state.exists && !state.is_empty() {
                return Ok(Provisioning::Ready {
                    rows: state.row_count,
                });
            }
            let summary = seed(store, feed, table, state.row_count).await?;
            Ok(Provisioning::Repopulated(summary))
        }
    }
}

async fn seed<S, F>(
    store: &mut S,
    feed: &F,
    table: &TableName,
    rows_before: i64,
) -> Result<LoadSummary, ProvisionError>
where
    S: RowStore,
    F: FeedSource,
{
    let summary = load_from_feed(store, feed, table, rows_before)
        .await
        .map_err(|source| ProvisionError::Load {
            table: table.to_string(),
            source,
        })?;
    info!(table = %table, loaded = summary.loaded, "Populated {} rows", summary.loaded);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::failing::BrokenFeed;
    use crate::feed::StaticFeed;
    use crate::store::MemoryStore;

    const FEED: &str = "R100,2024-01-01,2024-01-05,DepotA,Spring Rental,AC99\n\
                        R101,2024-02-01,2024-02-03,DepotB,Winter,AC12\n";

    fn table() -> TableName {
        TableName::new("reservations").unwrap()
    }

    #[tokio::test]
    async fn absent_table_state() {
        let mut store = MemoryStore::new();
        assert_eq!(table_state(&mut store, &table()).await, TableState::absent());
    }

    #[tokio::test]
    async fn create_then_state_is_empty_and_present() {
        let mut store = MemoryStore::new();
        assert_eq!(
            create_table(&mut store, &table()).await.unwrap(),
            TableCreation::Created
        );
        assert_eq!(
            table_state(&mut store, &table()).await,
            TableState::present(0)
        );
    }

    #[tokio::test]
    async fn create_existing_is_not_fatal() {
        let mut store = MemoryStore::new();
        create_table(&mut store, &table()).await.unwrap();
        assert_eq!(
            create_table(&mut store, &table()).await.unwrap(),
            TableCreation::AlreadyExisted
        );
    }

    #[tokio::test]
    async fn count_failure_reads_as_absent() {
        let mut store = MemoryStore::new();
        store.create_table(&table()).await.unwrap();
        store.fail_counts(1).await;
        assert_eq!(table_state(&mut store, &table()).await, TableState::absent());
        assert_eq!(table_state(&mut store, &table()).await, TableState::present(0));
    }

    #[tokio::test]
    async fn provisions_absent_table() {
        let mut store = MemoryStore::new();
        let outcome = ensure_provisioned(&mut store, &StaticFeed::new(FEED), &table())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            Provisioning::Created(LoadSummary { loaded: 2, total: 2 })
        );
        assert_eq!(store.count_rows(&table()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn repopulates_empty_table_without_recreating() {
        let mut store = MemoryStore::new();
        store.create_table(&table()).await.unwrap();

        let outcome = ensure_provisioned(&mut store, &StaticFeed::new(FEED), &table())
            .await
            .unwrap();
        assert!(matches!(outcome, Provisioning::Repopulated(s) if s.loaded == 2));
        assert_eq!(store.create_calls().await, 1);
    }

    #[tokio::test]
    async fn second_run_is_a_no_op() {
        let mut store = MemoryStore::new();
        let feed = StaticFeed::new(FEED);
        ensure_provisioned(&mut store, &feed, &table()).await.unwrap();
        let first = store.rows(&table()).await.unwrap();

        let outcome = ensure_provisioned(&mut store, &feed, &table()).await.unwrap();
        assert_eq!(outcome, Provisioning::Ready { rows: 2 });
        assert_eq!(store.rows(&table()).await.unwrap(), first);
        assert_eq!(store.create_calls().await, 1);
    }

    #[tokio::test]
    async fn lost_creation_race_with_loaded_table_is_ready() {
        // The first count reads as absent, but another invocation has
        // created and loaded the table by the time we try to create it.
        let mut store = MemoryStore::new();
        let feed = StaticFeed::new(FEED);
        store.create_table(&table()).await.unwrap();
        load_from_feed(&mut store, &feed, &table(), 0).await.unwrap();
        store.fail_counts(1).await;

        let outcome = ensure_provisioned(&mut store, &feed, &table()).await.unwrap();
        assert_eq!(outcome, Provisioning::Ready { rows: 2 });
        assert_eq!(store.create_calls().await, 2);
        assert_eq!(store.rows(&table()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn concurrent_first_invocations_both_succeed() {
        let store = MemoryStore::new();
        let feed = StaticFeed::new(FEED);

        let t = table();

        let (mut a, mut b) = (store.clone(), store.clone());
        let (ra, rb) = tokio::join!(
            ensure_provisioned(&mut a, &feed, &t),
            ensure_provisioned(&mut b, &feed, &t),
        );
        assert!(ra.is_ok());
        assert!(rb.is_ok());
        assert!(store.table_exists(&t).await);
        assert!(store.rows(&t).await.unwrap().len() >= 2);
    }

    #[tokio::test]
    async fn malformed_feed_row_is_fatal() {
        let mut store = MemoryStore::new();
        let err = ensure_provisioned(&mut store, &StaticFeed::new("R1,a,b\n"), &table())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::Load {
                source: LoadError::MalformedRow { .. },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn unreachable_feed_is_fatal() {
        let mut store = MemoryStore::new();
        let err = ensure_provisioned(&mut store, &BrokenFeed::unreachable(), &table())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::Load {
                source: LoadError::Fetch(_),
                ..
            }
        ));
        // The table was created before the download was attempted.
        assert_eq!(store.rows(&table()).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn create_failure_other_than_exists_is_fatal() {
        let mut store = MemoryStore::new();
        store.fail_creates(true).await;
        let err = ensure_provisioned(&mut store, &StaticFeed::new(FEED), &table())
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::Create { .. }));
    }

    #[tokio::test]
    async fn count_failures_fall_through_to_load() {
        let mut store = MemoryStore::new();
        store.create_table(&table()).await.unwrap();
        // Count refused, create reports exists, recount refused again:
        // the table reads as absent with zero rows and gets loaded.
        store.fail_counts(2).await;
        let outcome = ensure_provisioned(&mut store, &StaticFeed::new(FEED), &table())
            .await
            .unwrap();
        assert!(matches!(outcome, Provisioning::Repopulated(s) if s.loaded == 2));
    }
}
