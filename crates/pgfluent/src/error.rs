//! Error types for pgfluent

use thiserror::Error;

/// Result type alias for pgfluent operations
pub type FluentResult<T> = Result<T, FluentError>;

/// Error types for joined query building, execution and row access
#[derive(Debug, Error)]
pub enum FluentError {
    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Statement preparation or execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Unique constraint violation
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    /// More than one row matched a query that may match at most one.
    ///
    /// `count_hint` is a lower bound: fetching stops once the second row arrives.
    #[error("Multiple rows returned: expected at most 1 row, got at least {count_hint}")]
    MultipleRowsReturned { count_hint: usize },

    /// A result column could not be matched to any remaining alias
    #[error("Unresolvable column '{column}' from table '{table}'")]
    UnresolvableColumn { column: String, table: String },

    /// A result column appeared twice and the next alias is not the same table
    #[error("Duplicate column '{column}' for alias '{alias}'")]
    DuplicateColumn { column: String, alias: String },

    /// Column requested from a row view that the alias does not expose
    #[error("Column '{column}' not found for '{alias}' (known columns: {})", known.join(", "))]
    UnknownColumn {
        alias: String,
        column: String,
        known: Vec<String>,
    },

    /// Alias is not part of the executed query
    #[error("Unknown alias: {0}")]
    UnknownAlias(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Builder validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl FluentError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a cardinality error after observing at least `count_hint` rows
    pub fn multiple_rows(count_hint: usize) -> Self {
        Self::MultipleRowsReturned { count_hint }
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// Check if this is a cardinality error
    pub fn is_multiple_rows(&self) -> bool {
        matches!(self, Self::MultipleRowsReturned { .. })
    }

    /// Check if the declared join structure did not match the result metadata
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            Self::UnresolvableColumn { .. } | Self::DuplicateColumn { .. }
        )
    }

    /// Check if this error indicates API misuse rather than bad data
    pub fn is_programming_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownColumn { .. } | Self::UnknownAlias(_) | Self::Validation(_)
        )
    }

    /// Parse a tokio_postgres error into a more specific FluentError
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            let message = db_err.message();

            match db_err.code().code() {
                "23505" => return Self::UniqueViolation(format!("{}: {}", constraint, message)),
                "23503" => {
                    return Self::ForeignKeyViolation(format!("{}: {}", constraint, message));
                }
                "23514" => return Self::CheckViolation(format!("{}: {}", constraint, message)),
                _ => {}
            }
        }
        if err.is_closed() {
            return Self::Connection(err.to_string());
        }
        Self::Query(err)
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for FluentError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Connection(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_column_lists_known_columns() {
        let err = FluentError::UnknownColumn {
            alias: "p".to_string(),
            column: "NAMEE".to_string(),
            known: vec!["ID".to_string(), "NAME".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Column 'NAMEE' not found for 'p' (known columns: ID, NAME)"
        );
        assert!(err.is_programming_error());
        assert!(!err.is_resolution_error());
    }

    #[test]
    fn resolution_errors_are_classified() {
        let err = FluentError::DuplicateColumn {
            column: "ID".to_string(),
            alias: "o".to_string(),
        };
        assert!(err.is_resolution_error());
        assert!(!err.is_programming_error());
    }

    #[test]
    fn multiple_rows_message() {
        let err = FluentError::multiple_rows(2);
        assert!(err.is_multiple_rows());
        assert!(matches!(err, FluentError::MultipleRowsReturned { count_hint: 2 }));
        assert_eq!(
            err.to_string(),
            "Multiple rows returned: expected at most 1 row, got at least 2"
        );
    }
}
