//! Administrative command gate
//!
//! Operator commands run against the backing table before the lookup path.
//! They are best-effort: the invocation logs their errors and carries on.

use std::fmt;
use std::str::FromStr;

use tracing::{info, warn};

use crate::feed::FeedSource;
use crate::loader::{load_into_existing, LoadError, LoadSummary};
use crate::models::TableName;
use crate::store::{RowStore, StoreError};

/// Operator command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminCommand {
    /// Drop the table entirely.
    DropTable,
    /// Delete every row, keep the table.
    DeleteTable,
    /// Load the feed into the table now.
    InsertTable,
}

impl AdminCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DropTable => "droptable",
            Self::DeleteTable => "deletetable",
            Self::InsertTable => "inserttable",
        }
    }
}

impl fmt::Display for AdminCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdminCommand {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "droptable" => Ok(Self::DropTable),
            "deletetable" => Ok(Self::DeleteTable),
            "inserttable" => Ok(Self::InsertTable),
            other => Err(CommandError::Unknown {
                command: other.to_owned(),
            }),
        }
    }
}

/// What a command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Dropped,
    Deleted { rows: u64 },
    Inserted(LoadSummary),
}

/// Command error type
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command '{command}'")]
    Unknown { command: String },

    #[error("{command} failed: {source}")]
    Store {
        command: AdminCommand,
        #[source]
        source: StoreError,
    },

    #[error("inserttable failed: {0}")]
    Load(#[from] LoadError),
}

/// Run one command against `table`.
pub async fn run_admin_command<S, F>(
    store: &mut S,
    feed: &F,
    table: &TableName,
    command: AdminCommand,
) -> Result<CommandOutcome, CommandError>
where
    S: RowStore,
    F: FeedSource,
{
    info!(command = %command, table = %table, "Received admin command");

    let store_error = |source| CommandError::Store { command, source };

    match command {
        AdminCommand::DropTable => {
            store.drop_table(table).await.map_err(store_error)?;
            Ok(CommandOutcome::Dropped)
        }
        AdminCommand::DeleteTable => {
            let rows = store.delete_all(table).await.map_err(store_error)?;
            Ok(CommandOutcome::Deleted { rows })
        }
        AdminCommand::InsertTable => {
            info!(feed = feed.location(), "Inserting feed data on request");
            let summary = load_into_existing(store, feed, table).await?;
            info!(command = %command, "Insert command results: {}", summary);
            Ok(CommandOutcome::Inserted(summary))
        }
    }
}

/// Parse and run an operator-supplied command string, logging instead of
/// returning errors. Blank strings are ignored.
pub async fn dispatch_best_effort<S, F>(store: &mut S, feed: &F, table: &TableName, raw: &str)
where
    S: RowStore,
    F: FeedSource,
{
    if raw.trim().is_empty() {
        return;
    }

    let command = match raw.parse::<AdminCommand>() {
        Ok(command) => command,
        Err(e) => {
            warn!(command = raw, error = %e, "Ignoring command");
            return;
        }
    };

    match run_admin_command(store, feed, table, command).await {
        Ok(outcome) => info!(command = %command, ?outcome, "Command completed"),
        Err(e) => warn!(command = %command, error = %e, "Command failed, continuing"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::StaticFeed;
    use crate::store::MemoryStore;

    const FEED: &str = "R1,a,b,c,d,e\nR2,a,b,c,d,e\n";

    fn table() -> TableName {
        TableName::new("reservations").unwrap()
    }

    async fn loaded() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.create_table(&table()).await.unwrap();
        load_into_existing(&mut store, &StaticFeed::new(FEED), &table())
            .await
            .unwrap();
        store
    }

    #[test]
    fn parses_known_commands() {
        assert_eq!("droptable".parse::<AdminCommand>().unwrap(), AdminCommand::DropTable);
        assert_eq!(
            "deletetable".parse::<AdminCommand>().unwrap(),
            AdminCommand::DeleteTable
        );
        assert_eq!(
            "inserttable".parse::<AdminCommand>().unwrap(),
            AdminCommand::InsertTable
        );
        assert!(matches!(
            "DropTable".parse::<AdminCommand>(),
            Err(CommandError::Unknown { .. })
        ));
    }

    #[tokio::test]
    async fn drop_removes_table() {
        let mut store = loaded().await;
        let outcome = run_admin_command(
            &mut store,
            &StaticFeed::new(FEED),
            &table(),
            AdminCommand::DropTable,
        )
        .await
        .unwrap();
        assert_eq!(outcome, CommandOutcome::Dropped);
        assert!(!store.table_exists(&table()).await);
    }

    #[tokio::test]
    async fn delete_keeps_table() {
        let mut store = loaded().await;
        let outcome = run_admin_command(
            &mut store,
            &StaticFeed::new(FEED),
            &table(),
            AdminCommand::DeleteTable,
        )
        .await
        .unwrap();
        assert_eq!(outcome, CommandOutcome::Deleted { rows: 2 });
        assert_eq!(store.rows(&table()).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn insert_appends_feed() {
        let mut store = loaded().await;
        let outcome = run_admin_command(
            &mut store,
            &StaticFeed::new(FEED),
            &table(),
            AdminCommand::InsertTable,
        )
        .await
        .unwrap();
        assert_eq!(
            outcome,
            CommandOutcome::Inserted(LoadSummary { loaded: 2, total: 4 })
        );
    }

    #[tokio::test]
    async fn drop_of_missing_table_reports_error() {
        let mut store = MemoryStore::new();
        let err = run_admin_command(
            &mut store,
            &StaticFeed::new(FEED),
            &table(),
            AdminCommand::DropTable,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CommandError::Store { command: AdminCommand::DropTable, .. }));
    }

    #[tokio::test]
    async fn best_effort_swallows_errors() {
        let mut store = MemoryStore::new();
        let feed = StaticFeed::new(FEED);
        dispatch_best_effort(&mut store, &feed, &table(), "deletetable").await;
        dispatch_best_effort(&mut store, &feed, &table(), "bogus").await;
        dispatch_best_effort(&mut store, &feed, &table(), "   ").await;
        assert!(!store.table_exists(&table()).await);
    }
}
