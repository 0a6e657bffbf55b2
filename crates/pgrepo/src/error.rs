//! Error types for pgrepo

use thiserror::Error;

/// Result type alias for pgrepo operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Error types for statement generation and database access
#[derive(Debug, Error)]
pub enum RepoError {
    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint violation
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// A condition map that cannot be rendered into valid SQL
    #[error("Validation error: {0}")]
    Validation(String),

    /// An insert row whose ordered column list differs from the first row of the batch
    #[error("Schema mismatch in insert row {row}: expected columns {expected:?}, found {found:?}")]
    SchemaMismatch {
        row: usize,
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl RepoError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// Check if this is a schema mismatch error
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self, Self::SchemaMismatch { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Parse a tokio_postgres error into a more specific RepoError.
    ///
    /// Only constraint violations are classified; every other driver error is passed through
    /// unchanged as [`RepoError::Query`].
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
        Self::Query(err)
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for RepoError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_mismatch_message_names_columns() {
        let err = RepoError::SchemaMismatch {
            row: 1,
            expected: vec!["email".into(), "pass".into()],
            found: vec!["pass".into(), "email".into()],
        };
        assert!(err.is_schema_mismatch());
        assert_eq!(
            err.to_string(),
            r#"Schema mismatch in insert row 1: expected columns ["email", "pass"], found ["pass", "email"]"#
        );
    }

    #[test]
    fn validation_helper() {
        let err = RepoError::validation("empty insert batch");
        assert!(err.is_validation());
        assert!(!err.is_unique_violation());
        assert_eq!(err.to_string(), "Validation error: empty insert batch");
    }
}
