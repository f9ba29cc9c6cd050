//! Encoding implementations for the batch data.

use crate::{
    decoding::legacy::has_efficiency_percentage, BatchRawV2, ForcedBatchRawV2, L2BlockRaw,
    L2TxRaw, CHANGE_L2_BLOCK_MARKER, L2_BLOCK_HEADER_LENGTH,
};

use alloy_primitives::{bytes::BufMut, Bytes};

/// Encodes the [`BatchRawV2`] into etrog batch data.
pub fn encode_batch_v2(batch: &BatchRawV2) -> Bytes {
    let len = batch
        .blocks
        .iter()
        .map(|block| {
            L2_BLOCK_HEADER_LENGTH +
                block.transactions.iter().map(L2TxRaw::encoded_len).sum::<usize>()
        })
        .sum();
    let mut out = Vec::with_capacity(len);

    for block in &batch.blocks {
        encode_block_header(block, &mut out);
        for tx in &block.transactions {
            encode_tx_record(tx, true, &mut out);
        }
    }

    out.into()
}

/// Encodes the [`ForcedBatchRawV2`] into forced batch data.
pub fn encode_forced_batch_v2(batch: &ForcedBatchRawV2) -> Bytes {
    let len = batch.transactions.iter().map(L2TxRaw::encoded_len).sum();
    let mut out = Vec::with_capacity(len);
    for tx in &batch.transactions {
        encode_tx_record(tx, true, &mut out);
    }
    out.into()
}

/// Encodes the transactions into pre-etrog batch data for the provided fork.
pub fn encode_transactions(transactions: &[L2TxRaw], fork_id: u64) -> Bytes {
    let with_percentage = has_efficiency_percentage(fork_id);
    let mut out = Vec::with_capacity(transactions.iter().map(L2TxRaw::encoded_len).sum());
    for tx in transactions {
        encode_tx_record(tx, with_percentage, &mut out);
    }
    out.into()
}

fn encode_block_header(block: &L2BlockRaw, out: &mut dyn BufMut) {
    out.put_u8(CHANGE_L2_BLOCK_MARKER);
    out.put_u32(block.delta_timestamp);
    out.put_u32(block.index_l1_info_tree);
}

fn encode_tx_record(tx: &L2TxRaw, with_efficiency_percentage: bool, out: &mut dyn BufMut) {
    out.put_slice(&tx.tx.rlp);
    out.put_slice(tx.tx.r.as_slice());
    out.put_slice(tx.tx.s.as_slice());
    out.put_u8(tx.tx.v);
    if with_efficiency_percentage {
        out.put_u8(tx.efficiency_percentage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use alloy_primitives::{bytes, B256};

    #[test]
    fn test_encode_block_header() {
        let batch = BatchRawV2::new(vec![L2BlockRaw::new(0x6fafe673, 0, vec![])]);
        assert_eq!(encode_batch_v2(&batch), bytes!("0b6fafe67300000000"));
    }

    #[test]
    fn test_encode_record_layout() {
        let tx = crate::RawTransaction::new(
            bytes!("c0"),
            B256::repeat_byte(0x11),
            B256::repeat_byte(0x22),
            0x1b,
        );
        let batch = BatchRawV2::new(vec![L2BlockRaw::new(1, 2, vec![L2TxRaw::new(tx, 0xff)])]);
        let data = encode_batch_v2(&batch);

        assert_eq!(data.len(), L2_BLOCK_HEADER_LENGTH + 1 + 65 + 1);
        assert_eq!(&data[..L2_BLOCK_HEADER_LENGTH], &[0x0b, 0, 0, 0, 1, 0, 0, 0, 2]);
        assert_eq!(data[9], 0xc0);
        assert_eq!(&data[10..42], &[0x11; 32]);
        assert_eq!(&data[42..74], &[0x22; 32]);
        assert_eq!(&data[74..], &[0x1b, 0xff]);
    }
}
