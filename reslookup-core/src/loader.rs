//! Bulk loader - seeds the backing table from the CSV feed
//!
//! The feed is parsed as it streams in and each row is inserted as soon as
//! it is complete. There is no surrounding transaction: rows committed
//! before a failing row stay.

use std::fmt;

use tracing::{error, info, instrument};

use crate::feed::{FeedError, FeedSource, FeedStream};
use crate::models::{ReservationRecord, TableName, ValidationError};
use crate::rows::RowParser;
use crate::store::{RowStore, StoreError};

/// Outcome of one load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    /// Rows inserted by this load.
    pub loaded: u64,
    /// Rows in the table before the load plus `loaded`.
    pub total: i64,
}

impl fmt::Display for LoadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Completed {} rows for a total of {} rows",
            self.loaded, self.total
        )
    }
}

/// Loader error type
///
/// Every variant raised after reading started carries the number of rows
/// already committed by this load. `line` is the feed line a row ended on.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("feed unavailable: {0}")]
    Fetch(#[from] FeedError),

    #[error("feed broke off after line {line}: {source} ({loaded} rows already loaded)")]
    Interrupted {
        line: u64,
        loaded: u64,
        #[source]
        source: FeedError,
    },

    #[error("table '{table}' does not exist, nothing to load into")]
    TableMissing { table: String },

    #[error("could not count rows before loading: {0}")]
    Count(#[source] StoreError),

    #[error("feed row at line {line} is malformed: {reason} ({loaded} rows already loaded)")]
    MalformedRow {
        line: u64,
        reason: ValidationError,
        loaded: u64,
    },

    #[error("feed line {line} is not valid UTF-8: {source} ({loaded} rows already loaded)")]
    Encoding {
        line: u64,
        loaded: u64,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("insert of feed row at line {line} failed: {source} ({loaded} rows already loaded)")]
    Insert {
        line: u64,
        loaded: u64,
        #[source]
        source: StoreError,
    },
}

impl LoadError {
    /// Rows this load committed before failing.
    pub fn rows_committed(&self) -> u64 {
        match self {
            Self::Interrupted { loaded, .. }
            | Self::MalformedRow { loaded, .. }
            | Self::Encoding { loaded, .. }
            | Self::Insert { loaded, .. } => *loaded,
            Self::Fetch(_) | Self::TableMissing { .. } | Self::Count(_) => 0,
        }
    }
}

/// Open the feed and insert every row into `table`.
///
/// `rows_before` is the table's row count as observed by the caller; it
/// only feeds the summary total.
#[instrument(skip_all, fields(table = %table, feed = feed.location()))]
pub async fn load_from_feed<S, F>(
    store: &mut S,
    feed: &F,
    table: &TableName,
    rows_before: i64,
) -> Result<LoadSummary, LoadError>
where
    S: RowStore,
    F: FeedSource,
{
    let stream = feed.open().await.inspect_err(|e| {
        error!(error = %e, "Could not download reservations feed");
    })?;

    let summary = load_stream(store, table, rows_before, stream).await?;
    info!(loaded = summary.loaded, total = summary.total, "{}", summary);
    Ok(summary)
}

/// Load into a table that must already exist, counting its rows first.
pub async fn load_into_existing<S, F>(
    store: &mut S,
    feed: &F,
    table: &TableName,
) -> Result<LoadSummary, LoadError>
where
    S: RowStore,
    F: FeedSource,
{
    let rows_before = match store.count_rows(table).await {
        Ok(n) => n,
        Err(e) if e.is_table_missing() => {
            return Err(LoadError::TableMissing {
                table: table.to_string(),
            })
        }
        Err(e) => return Err(LoadError::Count(e)),
    };
    load_from_feed(store, feed, table, rows_before).await
}

/// Parse CSV from `stream` and insert each six-column row as a new record.
///
/// No header row. A row with any other column count aborts the load.
async fn load_stream<S, T>(
    store: &mut S,
    table: &TableName,
    rows_before: i64,
    mut stream: T,
) -> Result<LoadSummary, LoadError>
where
    S: RowStore,
    T: FeedStream,
{
    let mut parser = RowParser::new();
    let mut loaded = 0u64;
    let mut last_line = 0u64;

    loop {
        let chunk = stream.next_chunk().await.map_err(|source| {
            error!(line = last_line, error = %source, "Feed download interrupted");
            LoadError::Interrupted {
                line: last_line,
                loaded,
                source,
            }
        })?;
        let finished = chunk.is_none();
        let chunk = chunk.unwrap_or_default();
        let mut input = chunk.as_slice();

        loop {
            // An empty slice tells the parser the feed has ended.
            if input.is_empty() && !finished {
                break;
            }
            let (consumed, row) = parser.push(input);
            input = &input[consumed..];

            let row = match row {
                Some(Ok(row)) => row,
                Some(Err(bad)) => {
                    error!(line = bad.line, error = %bad.error, "Feed row is not UTF-8");
                    return Err(LoadError::Encoding {
                        line: bad.line,
                        loaded,
                        source: bad.error,
                    });
                }
                None if finished => break,
                None => continue,
            };
            let line = row.line;
            last_line = line;

            let record = ReservationRecord::from_feed_row(row.fields.as_slice()).map_err(|reason| {
                error!(line, error = %reason, "Malformed feed row");
                LoadError::MalformedRow {
                    line,
                    reason,
                    loaded,
                }
            })?;

            if let Err(source) = store.insert_record(table, &record).await {
                error!(line, error = %source, "Insert failed, aborting load");
                return Err(LoadError::Insert {
                    line,
                    loaded,
                    source,
                });
            }
            loaded += 1;
        }

        if finished {
            break;
        }
    }

    Ok(LoadSummary {
        loaded,
        total: rows_before + loaded as i64,
    })
}
