use super::{decode_tx_record, read_u32};
use crate::{
    error::DecodingError, BatchRawV2, ForcedBatchRawV2, L2BlockRaw, CHANGE_L2_BLOCK_MARKER,
};

/// Decodes the etrog batch data into a [`BatchRawV2`].
pub fn decode_batch_v2(data: &[u8]) -> Result<BatchRawV2, DecodingError> {
    let mut blocks: Vec<L2BlockRaw> = Vec::new();
    let mut offset = 0;

    while offset < data.len() {
        if data[offset] == CHANGE_L2_BLOCK_MARKER {
            let (next, block) = decode_block_header(data, offset + 1)?;
            blocks.push(block);
            offset = next;
            continue
        }

        let Some(block) = blocks.last_mut() else {
            return Err(DecodingError::BatchV2DontStartWithChangeL2Block { offset })
        };
        let (next, tx) = decode_tx_record(data, offset, true, invalid_batch_v2)?;
        block.transactions.push(tx);
        offset = next;
    }

    tracing::trace!(target: "zkevm::codec", blocks = blocks.len(), bytes = data.len(), "decoded batch v2");

    Ok(BatchRawV2::new(blocks))
}

/// Decodes the forced batch data into a [`ForcedBatchRawV2`]. Block headers are not allowed.
pub fn decode_forced_batch_v2(data: &[u8]) -> Result<ForcedBatchRawV2, DecodingError> {
    let mut transactions = Vec::new();
    let mut offset = 0;

    while offset < data.len() {
        let (next, tx) = decode_tx_record(data, offset, true, invalid_batch_v2)?;
        transactions.push(tx);
        offset = next;
    }

    Ok(ForcedBatchRawV2 { transactions })
}

/// Decodes the delta timestamp and L1 info tree index of a block header. The offset points past
/// the marker.
fn decode_block_header(data: &[u8], offset: usize) -> Result<(usize, L2BlockRaw), DecodingError> {
    let (offset, delta_timestamp) = read_u32(data, offset)
        .ok_or(DecodingError::InvalidBatchV2 { offset, reason: "not enough data for delta timestamp" })?;
    let (offset, index_l1_info_tree) = read_u32(data, offset).ok_or(
        DecodingError::InvalidBatchV2 { offset, reason: "not enough data for l1 info tree index" },
    )?;

    Ok((offset, L2BlockRaw::new(delta_timestamp, index_l1_info_tree, Vec::new())))
}

const fn invalid_batch_v2(offset: usize, reason: &'static str) -> DecodingError {
    DecodingError::InvalidBatchV2 { offset, reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{decoding::test_utils::random_tx, encode_batch_v2, encode_forced_batch_v2};

    use alloy_primitives::hex;

    #[test]
    fn test_empty_input_decodes_to_no_blocks() -> eyre::Result<()> {
        assert_eq!(decode_batch_v2(&[])?, BatchRawV2::default());
        assert_eq!(decode_forced_batch_v2(&[])?, ForcedBatchRawV2::default());
        Ok(())
    }

    #[test]
    fn test_bare_headers_decode_to_empty_blocks() -> eyre::Result<()> {
        let data = hex!("0b0000000a000000010b0000000200000003");
        let batch = decode_batch_v2(&data)?;

        assert_eq!(
            batch,
            BatchRawV2::new(vec![L2BlockRaw::new(10, 1, vec![]), L2BlockRaw::new(2, 3, vec![])])
        );
        Ok(())
    }

    #[test]
    fn test_round_trip() -> eyre::Result<()> {
        let batches = [
            BatchRawV2::default(),
            BatchRawV2::new(vec![L2BlockRaw::new(0, 0, vec![])]),
            BatchRawV2::new(vec![L2BlockRaw::new(5, 2, vec![random_tx(0, 0), random_tx(1, 400)])]),
            BatchRawV2::new(vec![
                L2BlockRaw::new(1, 0, vec![random_tx(2, 3)]),
                L2BlockRaw::new(u32::MAX, u32::MAX, vec![]),
                L2BlockRaw::new(3, 7, vec![random_tx(3, 60), random_tx(4, 1_000), random_tx(5, 0)]),
            ]),
        ];

        for batch in batches {
            let data = encode_batch_v2(&batch);
            assert_eq!(decode_batch_v2(&data)?, batch);
            assert_eq!(encode_batch_v2(&decode_batch_v2(&data)?), data);
        }
        Ok(())
    }

    #[test]
    fn test_transaction_before_header_fails() {
        let tx = random_tx(0, 10);
        let forced = encode_forced_batch_v2(&ForcedBatchRawV2 { transactions: vec![tx.clone()] });
        assert_eq!(
            decode_batch_v2(&forced),
            Err(DecodingError::BatchV2DontStartWithChangeL2Block { offset: 0 })
        );

        // invalid rlp is rejected by the header check first.
        assert_eq!(
            decode_batch_v2(&[0x01, 0x02]),
            Err(DecodingError::BatchV2DontStartWithChangeL2Block { offset: 0 })
        );
    }

    #[test]
    fn test_truncated_header_fails() {
        for len in 1..crate::L2_BLOCK_HEADER_LENGTH {
            let data = &hex!("0b0000000a00000001")[..len];
            let err = decode_batch_v2(data).unwrap_err();
            assert!(matches!(err, DecodingError::InvalidBatchV2 { .. }), "length {len}: {err}");
        }
    }

    #[test]
    fn test_truncated_transaction_fails() {
        let batch = BatchRawV2::new(vec![L2BlockRaw::new(1, 1, vec![random_tx(0, 100)])]);
        let data = encode_batch_v2(&batch);

        for cut in [1, 32, 66] {
            let err = decode_batch_v2(&data[..data.len() - cut]).unwrap_err();
            assert!(matches!(err, DecodingError::InvalidBatchV2 { offset: 9, .. }), "{err}");
        }
    }

    #[test]
    fn test_oversized_rlp_length_fails() {
        let mut data = hex!("0b0000000000000000ff").to_vec();
        data.extend_from_slice(&(u64::MAX - 9).to_be_bytes());
        data.extend_from_slice(&[0; 80]);

        let err = decode_batch_v2(&data).unwrap_err();
        assert!(
            matches!(
                err,
                DecodingError::InvalidBatchV2 { offset: 9, .. } |
                    DecodingError::InvalidRlp { offset: 9, marker: 0xff }
            ),
            "{err}"
        );

        let err = decode_forced_batch_v2(&data[9..]).unwrap_err();
        assert!(
            matches!(
                err,
                DecodingError::InvalidBatchV2 { offset: 0, .. } |
                    DecodingError::InvalidRlp { offset: 0, marker: 0xff }
            ),
            "{err}"
        );
    }

    #[test]
    fn test_invalid_rlp_marker_fails() {
        let data = hex!("0b000000010000000180");
        assert_eq!(
            decode_batch_v2(&data),
            Err(DecodingError::InvalidRlp { offset: 9, marker: 0x80 })
        );
    }

    #[test]
    fn test_forced_batch_rejects_headers() -> eyre::Result<()> {
        let forced = ForcedBatchRawV2 { transactions: vec![random_tx(0, 1), random_tx(1, 2)] };
        let data = encode_forced_batch_v2(&forced);
        assert_eq!(decode_forced_batch_v2(&data)?, forced);

        let data = hex!("0b0000000a00000001");
        assert_eq!(
            decode_forced_batch_v2(&data),
            Err(DecodingError::InvalidRlp { offset: 0, marker: CHANGE_L2_BLOCK_MARKER })
        );
        Ok(())
    }
}
