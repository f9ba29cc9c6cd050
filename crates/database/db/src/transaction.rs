use crate::{DatabaseConnectionProvider, DatabaseError};

use std::time::Instant;
use tokio::sync::OwnedMutexGuard;

/// A type that represents a mutable database transaction.
///
/// The transaction holds the guard of the database writer lock for its whole lifetime, which
/// serializes writers of the batch ledger.
#[derive(Debug)]
pub struct TXMut {
    /// The underlying database transaction.
    tx: sea_orm::DatabaseTransaction,
    /// A guard for the writer mutex.
    _guard: OwnedMutexGuard<()>,
    /// When the writer lock was acquired.
    locked_at: Instant,
}

impl TXMut {
    /// Wraps the transaction opened while holding the writer lock.
    pub fn new(tx: sea_orm::DatabaseTransaction, guard: OwnedMutexGuard<()>) -> Self {
        Self { tx, _guard: guard, locked_at: Instant::now() }
    }

    /// Commits the transaction.
    pub async fn commit(self) -> Result<(), DatabaseError> {
        tracing::trace!(target: "zkevm::db", held = ?self.locked_at.elapsed(), "Committing transaction");
        self.tx.commit().await?;
        Ok(())
    }

    /// Rolls back the transaction.
    pub async fn rollback(self) -> Result<(), DatabaseError> {
        tracing::trace!(target: "zkevm::db", held = ?self.locked_at.elapsed(), "Rolling back transaction");
        self.tx.rollback().await?;
        Ok(())
    }
}

impl DatabaseConnectionProvider for TXMut {
    type Connection = sea_orm::DatabaseTransaction;

    fn get_connection(&self) -> &Self::Connection {
        &self.tx
    }
}
