//! reslookup-server: HTTP framing for reservation lookups
//!
//! Decodes the inbound request, hands it to the core as an `Invocation`,
//! and serializes the resulting record. Every response carries a
//! wildcard `Access-Control-Allow-Origin` header.

pub mod error;
pub mod request;
pub mod routes;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use request::LookupRequest;
pub use server::{build_router, run_server, ServerConfig, ServerError};
pub use state::AppState;
