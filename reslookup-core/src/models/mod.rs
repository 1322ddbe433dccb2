//! Domain models with validation at construction
//!
//! Identifiers that end up in SQL text or in a lookup are validated when
//! these types are built. Invalid input returns ValidationError, not panic.

pub mod reservation;
pub mod table;
pub mod validation;

pub use reservation::{ReservationId, ReservationRecord, FEED_COLUMNS, NOT_FOUND_MARKER};
pub use table::{TableName, TableState};
pub use validation::ValidationError;
