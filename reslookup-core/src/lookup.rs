//! Lookup engine - point lookup by reservation id

use tracing::info;

use crate::models::{ReservationId, ReservationRecord, TableName};
use crate::store::{RowStore, StoreError};

/// Look up `id` in `table`.
///
/// Matching is exact. When several rows share the id the most recently
/// inserted one wins. A miss yields the not-found record. The returned
/// record always carries the requested id, not the stored one.
pub async fn lookup<S: RowStore>(
    store: &mut S,
    table: &TableName,
    id: &ReservationId,
) -> Result<ReservationRecord, StoreError> {
    match store.find_latest(table, id.as_str()).await? {
        Some(record) => {
            info!(reservation = %id, "Retrieved reservation");
            Ok(record.echoing(id))
        }
        None => {
            info!(reservation = %id, "No such reservation");
            Ok(ReservationRecord::not_found(id))
        }
    }
}
