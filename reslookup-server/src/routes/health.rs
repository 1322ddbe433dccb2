//! Liveness check for the lookup service
//!
//! Reports where lookups go without touching the store, so a slow or
//! absent database doesn't fail the probe.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use reslookup_core::{FeedSource, StoreConnector};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    /// Backing table lookups are served from.
    pub table: String,
    /// Store target, credentials redacted.
    pub store: String,
    /// Where the table is seeded from.
    pub feed: String,
}

/// GET /health
async fn health<C, F>(State(state): State<Arc<AppState<C, F>>>) -> Json<HealthStatus>
where
    C: StoreConnector,
    F: FeedSource,
{
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        table: state.table.to_string(),
        store: state.connector.describe(),
        feed: state.feed.location().to_owned(),
    })
}

pub fn router<C, F>() -> Router<Arc<AppState<C, F>>>
where
    C: StoreConnector,
    F: FeedSource,
{
    Router::new().route("/health", get(health::<C, F>))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reslookup_core::{MemoryConnector, StaticFeed, TableName};

    #[tokio::test]
    async fn reports_table_and_store() {
        let state = Arc::new(AppState::new(
            MemoryConnector::default(),
            StaticFeed::new(""),
            TableName::new("rentals").unwrap(),
        ));

        let Json(body) = health(State(state)).await;
        assert_eq!(body.status, "ok");
        assert_eq!(body.table, "rentals");
        assert_eq!(body.store, "memory");
        assert_eq!(body.feed, StaticFeed::new("").location());
    }
}
