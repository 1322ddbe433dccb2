//! One invocation: open a store handle, run the optional operator command,
//! provision, look up, release the handle.

use tracing::{info, warn};

use crate::admin::{
    dispatch_best_effort, run_admin_command, AdminCommand, CommandError, CommandOutcome,
};
use crate::error::{Error, Result};
use crate::feed::FeedSource;
use crate::lookup::lookup;
use crate::models::{ReservationId, ReservationRecord, TableName};
use crate::provision::{ensure_provisioned, Provisioning};
use crate::store::{RowStore, StoreConnector};

/// A validated lookup request as handed over by the framing layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub reservation_id: ReservationId,
    /// Operator command, run before provisioning when non-blank.
    pub command: Option<String>,
}

impl Invocation {
    pub fn new(reservation_id: ReservationId) -> Self {
        Self {
            reservation_id,
            command: None,
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }
}

/// Serve one lookup end to end.
///
/// The store handle is closed on every path; a close failure is logged and
/// does not change the outcome.
pub async fn run_invocation<C, F>(
    connector: &C,
    feed: &F,
    table: &TableName,
    invocation: &Invocation,
) -> Result<ReservationRecord>
where
    C: StoreConnector,
    F: FeedSource,
{
    let mut store = connector.open().await.map_err(Error::Open)?;
    let outcome = serve(&mut store, feed, table, invocation).await;
    release(store).await;
    outcome
}

async fn serve<S, F>(
    store: &mut S,
    feed: &F,
    table: &TableName,
    invocation: &Invocation,
) -> Result<ReservationRecord>
where
    S: RowStore,
    F: FeedSource,
{
    if let Some(command) = invocation.command.as_deref() {
        dispatch_best_effort(store, feed, table, command).await;
    }

    let provisioning = ensure_provisioned(store, feed, table).await?;
    info!(table = %table, ?provisioning, "Table ready");

    lookup(store, table, &invocation.reservation_id)
        .await
        .map_err(Error::Lookup)
}

/// Run provisioning alone on its own store handle.
pub async fn provision_once<C, F>(
    connector: &C,
    feed: &F,
    table: &TableName,
) -> Result<Provisioning>
where
    C: StoreConnector,
    F: FeedSource,
{
    let mut store = connector.open().await.map_err(Error::Open)?;
    let outcome = ensure_provisioned(&mut store, feed, table).await;
    release(store).await;
    Ok(outcome?)
}

/// Run one operator command on its own store handle.
///
/// Unlike the in-invocation pre-step, the error is returned to the caller.
pub async fn admin_once<C, F>(
    connector: &C,
    feed: &F,
    table: &TableName,
    command: AdminCommand,
) -> std::result::Result<CommandOutcome, CommandError>
where
    C: StoreConnector,
    F: FeedSource,
{
    let mut store = connector
        .open()
        .await
        .map_err(|source| CommandError::Store { command, source })?;
    let outcome = run_admin_command(&mut store, feed, table, command).await;
    release(store).await;
    outcome
}

async fn release<S: RowStore>(store: S) {
    if let Err(e) = store.close().await {
        warn!(error = %e, "Failed to close store handle");
    }
}
