//! Table identity and derived table state

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use super::ValidationError;

/// MySQL identifier length limit.
const MAX_TABLE_NAME_LEN: usize = 64;

/// Unquoted identifier: letter or underscore, then word characters.
/// Table names are interpolated into DDL, so nothing else gets through.
static IDENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("invalid identifier regex"));

/// Validated backing table name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(String);

impl TableName {
    /// Create a table name, validating identifier format.
    ///
    /// # Example
    /// ```
    /// use reslookup_core::models::TableName;
    ///
    /// assert!(TableName::new("reservations").is_ok());
    /// assert!(TableName::new("reservations; drop").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError::Empty {
                field: "table name",
            });
        }

        if s.len() > MAX_TABLE_NAME_LEN {
            return Err(ValidationError::TooLong {
                field: "table name",
                max: MAX_TABLE_NAME_LEN,
            });
        }

        if !IDENT_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "table name",
                reason: "must start with a letter or underscore and contain only letters, digits, underscores",
            });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Backtick-quoted form for SQL text.
    pub fn quoted(&self) -> String {
        format!("`{}`", self.0)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Existence and row count of the backing table.
///
/// Recomputed on every invocation, never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableState {
    pub exists: bool,
    pub row_count: i64,
}

impl TableState {
    pub fn absent() -> Self {
        Self {
            exists: false,
            row_count: 0,
        }
    }

    pub fn present(row_count: i64) -> Self {
        Self {
            exists: true,
            row_count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.row_count < 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_identifiers() {
        assert!(TableName::new("reservations").is_ok());
        assert!(TableName::new("_res_2024").is_ok());
        assert!(TableName::new("Reservations").is_ok());
    }

    #[test]
    fn rejects_injection_and_junk() {
        assert!(matches!(
            TableName::new(""),
            Err(ValidationError::Empty { .. })
        ));
        assert!(matches!(
            TableName::new("1table"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(TableName::new("res`ervations").is_err());
        assert!(TableName::new("res; DROP TABLE x").is_err());
        assert!(matches!(
            TableName::new(&"a".repeat(65)),
            Err(ValidationError::TooLong { max: 64, .. })
        ));
    }

    #[test]
    fn quoted_uses_backticks() {
        let table = TableName::new("reservations").unwrap();
        assert_eq!(table.quoted(), "`reservations`");
    }

    #[test]
    fn table_state_constructors() {
        assert_eq!(
            TableState::absent(),
            TableState {
                exists: false,
                row_count: 0
            }
        );
        assert!(TableState::present(0).is_empty());
        assert!(!TableState::present(3).is_empty());
    }
}
