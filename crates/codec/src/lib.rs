//! The batch data codec of the zkEVM rollup.
//!
//! Etrog batches are a stream of records: either a L2 block header starting with
//! [`CHANGE_L2_BLOCK_MARKER`], or a transaction made of its RLP list, its signature and an
//! effective gas price percentage byte. Forced batches and pre-etrog batches carry the
//! transaction records only.

pub use block::{BatchRawV2, ForcedBatchRawV2, L2BlockRaw, L2TxRaw, RawTransaction};
mod block;

pub mod decoding;
pub use decoding::{
    decode_batch_v2, decode_forced_batch_v2, decode_rlp_list_length, decode_rlp_transaction,
    decode_transactions,
    transaction::{LegacyTransaction, SignedLegacyTransaction},
};

pub mod encoding;
pub use encoding::{encode_batch_v2, encode_forced_batch_v2, encode_transactions};

pub use error::{CodecError, DecodingError};
mod error;

pub use payload::BatchPayload;
mod payload;

use alloy_primitives::Bytes;
use rollup_node_primitives::FORK_ID_ETROG;

/// The byte starting a L2 block header in etrog batches.
pub const CHANGE_L2_BLOCK_MARKER: u8 = 0x0b;

/// The length of a L2 block header: marker, delta timestamp and L1 info tree index.
pub const L2_BLOCK_HEADER_LENGTH: usize = 1 + 4 + 4;

/// The length of the `r`, `s` and `v` signature fields following a transaction.
pub const SIGNATURE_LENGTH: usize = 32 + 32 + 1;

/// The length of the effective gas price percentage field.
pub const EFFICIENCY_PERCENTAGE_LENGTH: usize = 1;

/// The batch data codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// Concatenated transaction records, used before etrog.
    Legacy {
        /// The fork id, which decides the presence of the efficiency percentage byte.
        fork_id: u64,
    },
    /// Transaction records grouped under L2 block headers.
    V2,
}

impl Codec {
    /// Returns the codec of batches executed under the provided fork id.
    pub const fn for_fork_id(fork_id: u64) -> Self {
        if fork_id >= FORK_ID_ETROG {
            Self::V2
        } else {
            Self::Legacy { fork_id }
        }
    }

    /// Decodes the batch data into a [`BatchPayload`].
    pub fn decode(&self, data: &[u8]) -> Result<BatchPayload, CodecError> {
        let payload = match self {
            Self::Legacy { fork_id } => decode_transactions(data, *fork_id)?.into(),
            Self::V2 => decode_batch_v2(data)?.into(),
        };
        Ok(payload)
    }

    /// Encodes the [`BatchPayload`] into batch data.
    pub fn encode(&self, payload: &BatchPayload) -> Bytes {
        match (self, payload) {
            (Self::V2, BatchPayload::V2(batch)) => encode_batch_v2(batch),
            (Self::V2, BatchPayload::Legacy(txs)) => {
                encode_batch_v2(&BatchRawV2::new(vec![L2BlockRaw::new(0, 0, txs.clone())]))
            }
            (Self::Legacy { fork_id }, payload) => {
                let txs = payload.transactions().cloned().collect::<Vec<_>>();
                encode_transactions(&txs, *fork_id)
            }
        }
    }
}
