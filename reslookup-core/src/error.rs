//! Structured error type for a whole invocation.
//!
//! Each engine has its own error enum; this one says which step of the
//! invocation failed. Binaries wrap it with `anyhow`, the HTTP layer maps
//! it to a status code.

use thiserror::Error;

use crate::provision::ProvisionError;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum Error {
    /// The store could not be reached.
    #[error("could not open store: {0}")]
    Open(#[source] StoreError),

    /// The table could not be created or seeded.
    #[error(transparent)]
    Provision(#[from] ProvisionError),

    /// The point lookup itself failed.
    #[error("lookup failed: {0}")]
    Lookup(#[source] StoreError),
}

/// Result type alias for invocation-level operations
pub type Result<T> = std::result::Result<T, Error>;
