//! Application state shared across handlers

use reslookup_core::{FeedSource, StoreConnector, TableName};

/// Shared application state
///
/// Holds what an invocation needs; store handles themselves are opened
/// per request by the connector.
pub struct AppState<C, F> {
    pub connector: C,
    pub feed: F,
    pub table: TableName,
}

impl<C, F> AppState<C, F>
where
    C: StoreConnector,
    F: FeedSource,
{
    pub fn new(connector: C, feed: F, table: TableName) -> Self {
        Self {
            connector,
            feed,
            table,
        }
    }
}
