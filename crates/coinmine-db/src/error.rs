//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`] which wraps the underlying
//! [`sqlx`] errors. [`StoreError`] conversion happens at the
//! [`LedgerStore`](coinmine_economy::LedgerStore) boundary.

use coinmine_economy::StoreError;

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored value does not fit the domain type, or the reverse.
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DbError {
    /// Whether a table `CHECK` constraint rejected the write.
    pub fn is_check_violation(&self) -> bool {
        match self {
            Self::Postgres(sqlx::Error::Database(db)) => {
                db.kind() == sqlx::error::ErrorKind::CheckViolation
            }
            _ => false,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        if err.is_check_violation() {
            Self::Constraint(err.to_string())
        } else {
            Self::Backend(err.to_string())
        }
    }
}

/// Build a [`DbError::Conversion`] for an out-of-range column value.
pub(crate) fn out_of_range(column: &str, err: impl core::fmt::Display) -> DbError {
    DbError::Conversion(format!("{column} is out of range: {err}"))
}
