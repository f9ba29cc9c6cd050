use crate::Key;

use alloy_primitives::{Bytes, B256, U256};
use std::time::Duration;

/// An error of a hash db.
#[derive(Debug, thiserror::Error)]
pub enum HashDbError {
    /// No leaf or program exists for the key.
    #[error("key not found")]
    KeyNotFound,
    /// The hash db failed to access its storage.
    #[error("hash db storage error")]
    Storage,
    /// The hash db failed internally.
    #[error("hash db internal error")]
    Internal,
    /// The size of the data is invalid.
    #[error("invalid data size")]
    InvalidDataSize,
    /// A result code not known to this node.
    #[error("unknown hash db result code {0}")]
    UnknownResultCode(i32),
    /// The value returned by the hash db is malformed.
    #[error("malformed value: {0}")]
    MalformedValue(String),
    /// The URI of the hash db is invalid.
    #[error("invalid hash db uri {0}")]
    InvalidUri(String),
    /// The hash db could not be reached before the dial timeout.
    #[error("hash db at {uri} unreachable after {timeout:?}")]
    DialTimeout {
        /// The URI of the hash db.
        uri: String,
        /// The dial timeout.
        timeout: Duration,
        /// The last connection error.
        #[source]
        source: tonic::transport::Error,
    },
    /// The call to the hash db failed.
    #[error("hash db call failed: {0}")]
    Status(#[from] tonic::Status),
}

impl HashDbError {
    /// Returns the result of the provided wire result code. A missing code is a success.
    pub(crate) const fn from_result_code(code: i32) -> Result<(), Self> {
        match code {
            0 | 1 => Ok(()),
            2 => Err(Self::KeyNotFound),
            3 => Err(Self::Storage),
            4 => Err(Self::Internal),
            14 => Err(Self::InvalidDataSize),
            code => Err(Self::UnknownResultCode(code)),
        }
    }
}

/// Implementers of the trait serve the leaves and the bytecodes of the state tree.
#[async_trait::async_trait]
#[auto_impl::auto_impl(&, Arc)]
pub trait HashDb: Send + Sync {
    /// Returns the value of the leaf at the key in the tree of the provided root.
    async fn get(&self, root: B256, key: Key) -> Result<U256, HashDbError>;

    /// Returns the bytecode with the provided hash.
    async fn get_program(&self, code_hash: B256) -> Result<Bytes, HashDbError>;
}
