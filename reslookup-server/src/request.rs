//! Inbound request decoding
//!
//! Bodies arrive either as base64-encoded JSON or as raw JSON. Base64 is
//! tried first, ignoring line breaks and other ASCII whitespace; anything
//! that doesn't decode is taken as-is.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;
use tracing::debug;

use reslookup_core::{Invocation, ReservationId};

use crate::error::ApiError;

/// Lookup request body
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LookupRequest {
    /// Testing/debugging marker. Logged, otherwise unused.
    #[serde(default, alias = "Test")]
    pub test: Option<String>,

    /// Reservation id to look up.
    #[serde(default, alias = "Resid")]
    pub resid: Option<String>,

    /// Operator command run before the lookup.
    #[serde(default, alias = "Command")]
    pub command: Option<String>,
}

impl LookupRequest {
    /// Decode a raw request body.
    pub fn from_body(body: &[u8]) -> Result<Self, ApiError> {
        let compact: Vec<u8> = body
            .iter()
            .copied()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();

        let decoded = match STANDARD.decode(&compact) {
            Ok(decoded) => {
                debug!("Request body was base64 encoded");
                decoded
            }
            Err(_) => {
                debug!("Request body is not base64 encoded, using it as-is");
                body.to_vec()
            }
        };

        serde_json::from_slice(&decoded).map_err(|e| ApiError::Unprocessable {
            message: format!("cannot parse request: {}", e),
        })
    }

    /// Validate into an invocation. An absent or empty id is rejected.
    pub fn into_invocation(self) -> Result<Invocation, ApiError> {
        let id = ReservationId::new(self.resid.as_deref().unwrap_or_default())?;
        let mut invocation = Invocation::new(id);
        if let Some(command) = self.command.filter(|c| !c.trim().is_empty()) {
            invocation = invocation.with_command(command);
        }
        Ok(invocation)
    }
}
