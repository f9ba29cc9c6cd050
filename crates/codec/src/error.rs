/// An error occurring during the codec process.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// An error occurring at the decoding state.
    #[error(transparent)]
    Decoding(#[from] DecodingError),
}

/// An error occurring during the decoding of batch data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodingError {
    /// A transaction record was found before the first L2 block header.
    #[error("batch v2 doesn't start with a change L2 block header (offset {offset})")]
    BatchV2DontStartWithChangeL2Block {
        /// The offset of the offending record.
        offset: usize,
    },
    /// The data ran out in the middle of a record.
    #[error("invalid batch v2: {reason} at offset {offset}")]
    InvalidBatchV2 {
        /// The offset of the truncated record.
        offset: usize,
        /// What was being read.
        reason: &'static str,
    },
    /// The data ran out in the middle of a record of a pre-etrog batch.
    #[error("invalid legacy batch: {reason} at offset {offset}")]
    InvalidLegacyBatch {
        /// The offset of the truncated record.
        offset: usize,
        /// What was being read.
        reason: &'static str,
    },
    /// The length prefix of a transaction is not a valid RLP list marker.
    #[error("invalid rlp list marker {marker:#04x} at offset {offset}")]
    InvalidRlp {
        /// The offset of the marker.
        offset: usize,
        /// The marker byte.
        marker: u8,
    },
    /// The two values following the chain id of an unsigned EIP-155 transaction are not zero.
    #[error("non-zero eip-155 placeholder {value} after chain id")]
    NonZeroEip155Placeholder {
        /// The offending value.
        value: u64,
    },
    /// The RLP payload of a transaction could not be decoded.
    #[error(transparent)]
    Rlp(#[from] alloy_rlp::Error),
}

impl DecodingError {
    /// Returns true if the error is caused by the data ending mid-record.
    pub const fn is_truncation(&self) -> bool {
        matches!(self, Self::InvalidBatchV2 { .. } | Self::InvalidLegacyBatch { .. })
    }
}
