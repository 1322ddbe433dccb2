//! reslookup-core: reservation table provisioning and lookup
//!
//! Each invocation makes sure the backing table exists and holds rows
//! (creating and seeding it from the CSV feed when needed), then answers a
//! single point lookup by reservation id.

pub mod admin;
pub mod config;
pub mod error;
pub mod feed;
pub mod invocation;
pub mod loader;
pub mod lookup;
pub mod models;
pub mod provision;
mod rows;
pub mod store;

pub use admin::{AdminCommand, CommandError, CommandOutcome};
pub use config::{ConfigError, ServiceConfig};
pub use error::{Error, Result};
pub use feed::{FeedError, FeedSource, FeedStream, HttpFeed, StaticFeed};
pub use invocation::{admin_once, provision_once, run_invocation, Invocation};
pub use loader::{LoadError, LoadSummary};
pub use models::{ReservationId, ReservationRecord, TableName, TableState};
pub use provision::{Provisioning, ProvisionError};
pub use store::{
    MemoryConnector, MemoryStore, MySqlConnector, MySqlStore, RowStore, StoreConnector, StoreError,
};
