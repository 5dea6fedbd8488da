//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)        ValidationError (stockroom-core)    │
//! │       │                                   │                             │
//! │       ▼                                   ▼                             │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Web layer decides what the user sees                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Constraint Violations
//! Unique, foreign-key, not-null and check failures are all reported by
//! SQLite as constraint errors. They get their own variants here and are
//! grouped by [`DbError::is_constraint_violation`].

use stockroom_core::{CoreError, ValidationError};
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Duplicate user email or username
    /// - Duplicate category name
    /// - Duplicate unit name or abbreviation
    /// - Second staff/customer/admin extension for the same user
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Deleting a unit of measurement still used by a product
    /// - Referencing a product, category, unit or user that does not exist
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// NOT NULL constraint violation.
    ///
    /// ## When This Occurs
    /// - Creating a product without a category or unit
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// CHECK constraint violation (decimal range, role/target agreement).
    #[error("Check constraint failed: {message}")]
    CheckViolation { message: String },

    /// Field validation failed before the write was attempted.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Domain error other than validation (e.g., password hashing).
    #[error("{0}")]
    Core(CoreError),

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// The live schema differs from the declared one.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Whether this error is a constraint violation: unique, foreign key,
    /// not-null or check, plus required fields left blank (caught before
    /// the write, same meaning as a NOT NULL failure).
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            DbError::UniqueViolation { .. }
                | DbError::ForeignKeyViolation { .. }
                | DbError::MissingField { .. }
                | DbError::CheckViolation { .. }
                | DbError::Validation(ValidationError::Required { .. })
        )
    }

    /// Attaches the offending value to a UniqueViolation; other errors pass
    /// through unchanged.
    pub(crate) fn with_value(self, value: &str) -> Self {
        match self {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: value.to_string(),
            },
            other => other,
        }
    }
}

/// Validation errors surface as [`DbError::Validation`]; everything else
/// as [`DbError::Core`].
impl From<CoreError> for DbError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(v) => DbError::Validation(v),
            other => DbError::Core(other),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite constraint messages:
                //   "UNIQUE constraint failed: <table>.<column>"
                //   "FOREIGN KEY constraint failed"
                //   "NOT NULL constraint failed: <table>.<column>"
                //   "CHECK constraint failed: <name or expression>"
                if let Some(field) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::UniqueViolation {
                        field: field.to_string(),
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if let Some(field) = msg.strip_prefix("NOT NULL constraint failed: ") {
                    DbError::MissingField {
                        field: field.to_string(),
                    }
                } else if msg.contains("CHECK constraint failed") {
                    DbError::CheckViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Invalid value in a `STOCKROOM_DB_*` environment variable.
#[derive(Debug, Error)]
#[error("Invalid value for {var}: '{value}' ({reason})")]
pub struct ConfigError {
    pub var: String,
    pub value: String,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_violation_kind() {
        assert!(DbError::duplicate("users.email", "a@b.co").is_constraint_violation());
        assert!(DbError::MissingField {
            field: "products.category_id".to_string()
        }
        .is_constraint_violation());
        assert!(DbError::Validation(ValidationError::Required {
            field: "name".to_string()
        })
        .is_constraint_violation());
        assert!(!DbError::Validation(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "missing @".to_string()
        })
        .is_constraint_violation());
        assert!(!DbError::not_found("Product", "p1").is_constraint_violation());
        assert!(!DbError::PoolExhausted.is_constraint_violation());
    }

    #[test]
    fn test_with_value_only_touches_unique_violations() {
        let err = DbError::duplicate("product_categories.name", "unknown").with_value("Tools");
        assert_eq!(
            err.to_string(),
            "Duplicate product_categories.name: 'Tools' already exists"
        );

        let err = DbError::PoolExhausted.with_value("Tools");
        assert!(matches!(err, DbError::PoolExhausted));
    }

    #[test]
    fn test_core_error_conversion() {
        let err: DbError = CoreError::Validation(ValidationError::Required {
            field: "name".to_string(),
        })
        .into();
        assert!(matches!(err, DbError::Validation(_)));

        let err: DbError = CoreError::PasswordHash("boom".to_string()).into();
        assert!(matches!(err, DbError::Core(_)));
    }
}
