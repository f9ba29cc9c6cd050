use crate::{ForkIdError, ResponseError};

use alloy_primitives::B256;
use zkevm_codec::{CodecError, DecodingError};
use zkevm_db::{CanRetry, DatabaseError, LedgerError};
use zkevm_executor::{ExecutorClientError, ExecutorError};

/// An error of the [`crate::State`].
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// The batch is not the latest one.
    #[error("invalid batch number: expected {expected}, got {got}")]
    InvalidBatchNumber {
        /// The latest batch number.
        expected: u64,
        /// The requested batch number.
        got: u64,
    },
    /// The batch does not exist.
    #[error("batch {0} not found")]
    BatchNotFound(u64),
    /// The batch is closed and can't be processed again.
    #[error("batch {0} is already closed")]
    BatchAlreadyClosed(u64),
    /// The executor rejected the whole batch.
    #[error("executor rejected batch {batch_number}: {error}")]
    Executor {
        /// The batch number.
        batch_number: u64,
        /// The executor error.
        error: ExecutorError,
    },
    /// The executor could not be called.
    #[error(transparent)]
    ExecutorClient(#[from] ExecutorClientError),
    /// The executor response holds an invalid field.
    #[error("invalid executor response: {0}")]
    Response(#[from] ResponseError),
    /// A transaction processed without error could not be decoded.
    #[error("transaction {tx_hash} of batch {batch_number} could not be decoded: {source}")]
    TransactionDecoding {
        /// The batch number.
        batch_number: u64,
        /// The transaction hash.
        tx_hash: B256,
        /// The decoding error.
        #[source]
        source: DecodingError,
    },
    /// The stored accumulated input hash of the batch does not match its recomputed value.
    #[error("acc input hash mismatch for batch {batch_number}: stored {stored}, computed {computed}")]
    AccInputHashMismatch {
        /// The batch number.
        batch_number: u64,
        /// The stored value.
        stored: B256,
        /// The recomputed value.
        computed: B256,
    },
    /// The batch data could not be decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// The fork id could not be resolved.
    #[error(transparent)]
    ForkId(#[from] ForkIdError),
    /// A ledger operation failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    /// A database read failed.
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl CanRetry for StateError {
    fn can_retry(&self) -> bool {
        match self {
            Self::Ledger(err) => err.can_retry(),
            Self::Database(err) => err.can_retry(),
            Self::ExecutorClient(err) => err.is_resource_exhausted(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_retry() {
        assert!(StateError::Ledger(LedgerError::Conflict { expected: Some(1), found: Some(2) })
            .can_retry());
        assert!(StateError::ExecutorClient(ExecutorClientError::Status(
            zkevm_executor::Status::resource_exhausted("busy")
        ))
        .can_retry());
        assert!(!StateError::ExecutorClient(ExecutorClientError::Status(
            zkevm_executor::Status::unavailable("down")
        ))
        .can_retry());
        assert!(StateError::Ledger(LedgerError::BatchChanged(1)).can_retry());
        assert!(!StateError::BatchAlreadyClosed(1).can_retry());
        assert!(!StateError::Ledger(LedgerError::BatchAlreadyClosed(1)).can_retry());
    }
}
