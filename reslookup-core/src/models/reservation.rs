//! Reservation records and lookup keys

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Marker written into every non-id field of a not-found record.
pub const NOT_FOUND_MARKER: &str = "EMPTY";

/// Number of positional columns in a bulk feed row.
pub const FEED_COLUMNS: usize = 6;

/// Width of the `reservationid` column, in characters.
const MAX_RESERVATION_ID_LEN: usize = 255;

/// One reservation, as stored in the backing table and returned to callers.
///
/// Serialized with the field names clients of the lookup endpoint expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationRecord {
    #[serde(rename = "ConfirmationCode")]
    pub reservation_id: String,

    #[serde(rename = "ReservationStartDate")]
    pub start: String,

    #[serde(rename = "ReservationEndDate")]
    pub end: String,

    #[serde(rename = "UnicornAccessCode")]
    pub access_code: String,

    #[serde(rename = "UnicornPickupLocation")]
    pub pickup_location: String,

    #[serde(rename = "UnicornResTitle")]
    pub title: String,
}

impl ReservationRecord {
    /// Build a record from one feed row.
    ///
    /// Columns are positional: reservation id, start, end, pickup location,
    /// title, access code. No header, no per-column checks.
    pub fn from_feed_row<S: AsRef<str>>(columns: &[S]) -> Result<Self, ValidationError> {
        match columns {
            [id, start, end, pickup, title, code] => Ok(Self {
                reservation_id: id.as_ref().to_owned(),
                start: start.as_ref().to_owned(),
                end: end.as_ref().to_owned(),
                pickup_location: pickup.as_ref().to_owned(),
                title: title.as_ref().to_owned(),
                access_code: code.as_ref().to_owned(),
            }),
            _ => Err(ValidationError::ColumnCount {
                expected: FEED_COLUMNS,
                found: columns.len(),
            }),
        }
    }

    /// The canonical not-found record: the requested id echoed back, every
    /// other field set to [`NOT_FOUND_MARKER`].
    pub fn not_found(id: &ReservationId) -> Self {
        Self {
            reservation_id: id.as_str().to_owned(),
            start: NOT_FOUND_MARKER.to_owned(),
            end: NOT_FOUND_MARKER.to_owned(),
            pickup_location: NOT_FOUND_MARKER.to_owned(),
            title: NOT_FOUND_MARKER.to_owned(),
            access_code: NOT_FOUND_MARKER.to_owned(),
        }
    }

    /// Replace the id with the one the caller asked for.
    pub fn echoing(mut self, id: &ReservationId) -> Self {
        self.reservation_id = id.as_str().to_owned();
        self
    }

    pub fn is_not_found(&self) -> bool {
        [
            &self.start,
            &self.end,
            &self.pickup_location,
            &self.title,
            &self.access_code,
        ]
        .iter()
        .all(|field| field.as_str() == NOT_FOUND_MARKER)
    }
}

/// Validated reservation id (confirmation code).
///
/// Matched exactly: no trimming, no case folding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReservationId(String);

impl ReservationId {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError::Empty {
                field: "reservation id",
            });
        }

        if s.chars().count() > MAX_RESERVATION_ID_LEN {
            return Err(ValidationError::TooLong {
                field: "reservation id",
                max: MAX_RESERVATION_ID_LEN,
            });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
