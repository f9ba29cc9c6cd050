//! Decoding implementations for the batch data.
//!
//! The decoders thread an explicit offset through functions returning `(next_offset, value)`.

/// Decoding implementation for the pre-etrog batch data.
pub mod legacy;
pub use legacy::decode_transactions;

/// Decoding implementation for the etrog and forced batch data.
pub mod v2;
pub use v2::{decode_batch_v2, decode_forced_batch_v2};

/// Decoding implementation for a transaction.
pub mod transaction;

#[cfg(test)]
pub(crate) mod test_utils;

use crate::{
    error::DecodingError, L2TxRaw, RawTransaction, EFFICIENCY_PERCENTAGE_LENGTH, SIGNATURE_LENGTH,
};
use transaction::SignedLegacyTransaction;

use alloy_primitives::B256;

/// The smallest RLP list marker.
const RLP_LIST_SHORT: u8 = 0xc0;
/// The largest RLP list marker of a short list.
const RLP_LIST_LONG: u8 = 0xf7;
/// Lists with a payload above this length use the long form.
const RLP_SHORT_LIST_MAX_PAYLOAD: usize = 55;

/// Returns the total length, marker included, of the RLP list starting at `offset`.
///
/// Only the marker and the length bytes of a long list are read, the payload itself is not
/// required to be present.
pub fn decode_rlp_list_length(data: &[u8], offset: usize) -> Result<usize, DecodingError> {
    let marker = *data
        .get(offset)
        .ok_or(DecodingError::InvalidBatchV2 { offset, reason: "missing rlp list marker" })?;
    if marker < RLP_LIST_SHORT {
        return Err(DecodingError::InvalidRlp { offset, marker })
    }

    let mut length = (marker - RLP_LIST_SHORT) as usize;
    if length > RLP_SHORT_LIST_MAX_PAYLOAD {
        let size_of_length = (marker - RLP_LIST_LONG) as usize;
        if size_of_length > core::mem::size_of::<u64>() {
            return Err(DecodingError::InvalidRlp { offset, marker })
        }
        let start = offset + 1;
        let size_bytes = data.get(start..start + size_of_length).ok_or(
            DecodingError::InvalidBatchV2 { offset, reason: "not enough data for rlp list length" },
        )?;

        let mut arr = [0u8; 8];
        arr[8 - size_of_length..].copy_from_slice(size_bytes);
        let payload_length = usize::try_from(u64::from_be_bytes(arr))
            .map_err(|_| DecodingError::InvalidRlp { offset, marker })?;

        length = payload_length
            .checked_add(size_of_length)
            .ok_or(DecodingError::InvalidRlp { offset, marker })?;
    }

    length.checked_add(1).ok_or(DecodingError::InvalidRlp { offset, marker })
}

/// Reads a big-endian u32 at `offset`.
pub(crate) fn read_u32(data: &[u8], offset: usize) -> Option<(usize, u32)> {
    let end = offset.checked_add(4)?;
    let bytes: [u8; 4] = data.get(offset..end)?.try_into().ok()?;
    Some((end, u32::from_be_bytes(bytes)))
}

/// Decodes the transaction record starting at `offset`. The `truncated` closure builds the error
/// returned when the data ends before the record does.
pub(crate) fn decode_tx_record(
    data: &[u8],
    offset: usize,
    with_efficiency_percentage: bool,
    truncated: impl Fn(usize, &'static str) -> DecodingError,
) -> Result<(usize, L2TxRaw), DecodingError> {
    let rlp_length = decode_rlp_list_length(data, offset)?;
    let percentage_length =
        if with_efficiency_percentage { EFFICIENCY_PERCENTAGE_LENGTH } else { 0 };
    let end = rlp_length
        .checked_add(SIGNATURE_LENGTH + percentage_length)
        .and_then(|length| offset.checked_add(length))
        .filter(|end| *end <= data.len())
        .ok_or_else(|| truncated(offset, "not enough data for transaction"))?;

    let rlp_end = offset + rlp_length;
    let rlp = data[offset..rlp_end].to_vec().into();
    let r = B256::from_slice(&data[rlp_end..rlp_end + 32]);
    let s = B256::from_slice(&data[rlp_end + 32..rlp_end + 64]);
    let v = data[rlp_end + 64];
    let efficiency_percentage = if with_efficiency_percentage {
        data[rlp_end + SIGNATURE_LENGTH]
    } else {
        rollup_node_primitives::MAX_EFFECTIVE_PERCENTAGE
    };

    Ok((end, L2TxRaw::new(RawTransaction::new(rlp, r, s, v), efficiency_percentage)))
}

/// Decodes a signed transaction returned by the executor.
pub fn decode_rlp_transaction(data: &[u8]) -> Result<SignedLegacyTransaction, DecodingError> {
    SignedLegacyTransaction::decode(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rlp_list_length_boundaries() -> eyre::Result<()> {
        assert_eq!(decode_rlp_list_length(&[0xc0], 0)?, 1);
        assert_eq!(decode_rlp_list_length(&[0xc1, 0x80], 0)?, 2);
        assert_eq!(decode_rlp_list_length(&[0xf7], 0)?, 56);
        assert_eq!(decode_rlp_list_length(&[0xf8, 0x01], 0)?, 3);
        assert_eq!(decode_rlp_list_length(&[0xf9, 0x01, 0x00], 0)?, 259);
        assert_eq!(decode_rlp_list_length(&[0x0b, 0xf8, 0x38], 1)?, 58);
        Ok(())
    }

    #[test]
    fn test_rlp_list_length_rejects_non_list_marker() {
        for marker in [0x00, 0x0b, 0x80, 0xbf] {
            assert_eq!(
                decode_rlp_list_length(&[marker], 0),
                Err(DecodingError::InvalidRlp { offset: 0, marker })
            );
        }
    }

    #[test]
    fn test_rlp_list_length_truncated_size() {
        let err = decode_rlp_list_length(&[0xfa, 0x01], 0).unwrap_err();
        assert!(err.is_truncation());
        let err = decode_rlp_list_length(&[], 0).unwrap_err();
        assert!(err.is_truncation());
    }

    #[test]
    fn test_read_u32() {
        assert_eq!(read_u32(&[0, 0, 1, 0, 7], 0), Some((4, 256)));
        assert_eq!(read_u32(&[0, 0, 1, 0, 7], 1), Some((5, 65_543)));
        assert_eq!(read_u32(&[0, 0, 1], 0), None);
    }
}
