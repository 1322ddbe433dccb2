//! Validation error types

use std::fmt;

/// Validation error for domain models
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Field is empty when it shouldn't be
    Empty { field: &'static str },

    /// Field exceeds maximum length
    TooLong { field: &'static str, max: usize },

    /// String doesn't match required format
    InvalidFormat { field: &'static str, reason: &'static str },

    /// Wrong number of columns in a feed row
    ColumnCount { expected: usize, found: usize },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{} cannot be empty", field),
            Self::TooLong { field, max } => {
                write!(f, "{} exceeds maximum length of {} characters", field, max)
            }
            Self::InvalidFormat { field, reason } => write!(f, "{}: {}", field, reason),
            Self::ColumnCount { expected, found } => {
                write!(f, "expected {} columns, found {}", expected, found)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ValidationError::TooLong {
            field: "table name",
            max: 64,
        };
        assert_eq!(
            err.to_string(),
            "table name exceeds maximum length of 64 characters"
        );

        let err = ValidationError::ColumnCount {
            expected: 6,
            found: 4,
        };
        assert_eq!(err.to_string(), "expected 6 columns, found 4");
    }
}
