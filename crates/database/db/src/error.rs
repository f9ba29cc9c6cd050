use sea_orm::{DbErr, RuntimeErr};

/// The error type for database operations.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// A database error occurred.
    #[error("database error: {0}")]
    DatabaseError(#[from] DbErr),
    /// A batch was not found in the database.
    #[error("batch {0} not found in database")]
    BatchNotFound(u64),
    /// A row holds a value which can't be converted back into its domain type.
    #[error("invalid {column} value in {table} table")]
    InvalidColumn {
        /// The table name.
        table: &'static str,
        /// The column name.
        column: &'static str,
    },
}

impl DatabaseError {
    /// Returns true if the error is a serialization failure reported by the database: a write
    /// conflict between concurrent transactions, or a busy database for SQLite.
    pub fn is_serialization_failure(&self) -> bool {
        let Self::DatabaseError(err) = self else { return false };
        let message = match err {
            DbErr::Conn(RuntimeErr::SqlxError(err)) |
            DbErr::Exec(RuntimeErr::SqlxError(err)) |
            DbErr::Query(RuntimeErr::SqlxError(err)) => err.to_string(),
            DbErr::Conn(RuntimeErr::Internal(msg)) |
            DbErr::Exec(RuntimeErr::Internal(msg)) |
            DbErr::Query(RuntimeErr::Internal(msg)) => msg.clone(),
            _ => return false,
        };
        // postgres serialization_failure, sqlite busy and locked errors.
        message.contains("40001") ||
            message.contains("could not serialize access") ||
            message.contains("is locked") ||
            message.contains("database is busy")
    }
}

/// A trait for errors that can indicate whether an operation can be retried.
pub trait CanRetry {
    /// Returns true if the implementer can be retried.
    fn can_retry(&self) -> bool;
}

impl CanRetry for DatabaseError {
    fn can_retry(&self) -> bool {
        self.is_serialization_failure() || matches!(self, Self::DatabaseError(DbErr::ConnectionAcquire(_)))
    }
}
