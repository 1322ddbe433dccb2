//! Reservation lookup endpoint

use std::sync::Arc;

use axum::{body::Bytes, extract::State, routing::post, Json, Router};
use tracing::info;

use reslookup_core::{run_invocation, FeedSource, ReservationRecord, StoreConnector};

use crate::error::ApiError;
use crate::request::LookupRequest;
use crate::state::AppState;

/// POST / and POST /lookup
async fn lookup<C, F>(
    State(state): State<Arc<AppState<C, F>>>,
    body: Bytes,
) -> Result<Json<ReservationRecord>, ApiError>
where
    C: StoreConnector,
    F: FeedSource,
{
    let request = LookupRequest::from_body(&body)?;
    info!(request = ?request, "Full request");

    let invocation = request.into_invocation()?;
    let record = run_invocation(&state.connector, &state.feed, &state.table, &invocation).await?;
    Ok(Json(record))
}

/// Lookup routes
pub fn router<C, F>() -> Router<Arc<AppState<C, F>>>
where
    C: StoreConnector,
    F: FeedSource,
{
    Router::new()
        .route("/", post(lookup::<C, F>))
        .route("/lookup", post(lookup::<C, F>))
}
