use super::decode_tx_record;
use crate::{error::DecodingError, L2TxRaw};

use rollup_node_primitives::FORK_ID_DRAGONFRUIT;

/// Returns true if the transaction records of the fork carry the efficiency percentage byte.
pub const fn has_efficiency_percentage(fork_id: u64) -> bool {
    fork_id >= FORK_ID_DRAGONFRUIT
}

/// Decodes the pre-etrog batch data into its transactions. Records of forks without the
/// efficiency percentage byte are assigned the maximum percentage.
pub fn decode_transactions(data: &[u8], fork_id: u64) -> Result<Vec<L2TxRaw>, DecodingError> {
    let with_percentage = has_efficiency_percentage(fork_id);
    let mut transactions = Vec::new();
    let mut offset = 0;

    while offset < data.len() {
        let (next, tx) = decode_tx_record(data, offset, with_percentage, |offset, reason| {
            DecodingError::InvalidLegacyBatch { offset, reason }
        })?;
        transactions.push(tx);
        offset = next;
    }

    tracing::trace!(target: "zkevm::codec", fork_id, transactions = transactions.len(), "decoded legacy batch");

    Ok(transactions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{decoding::test_utils::random_tx, encode_transactions};

    use rollup_node_primitives::MAX_EFFECTIVE_PERCENTAGE;

    #[test]
    fn test_round_trip_with_efficiency_percentage() -> eyre::Result<()> {
        let txs = vec![random_tx(1, 0), random_tx(2, 70), random_tx(3, 300)];
        let data = encode_transactions(&txs, FORK_ID_DRAGONFRUIT);

        assert_eq!(data.len(), txs.iter().map(L2TxRaw::encoded_len).sum::<usize>());
        assert_eq!(decode_transactions(&data, FORK_ID_DRAGONFRUIT)?, txs);
        Ok(())
    }

    #[test]
    fn test_fork_without_efficiency_percentage() -> eyre::Result<()> {
        let txs = vec![random_tx(4, 10), random_tx(5, 20)];
        let data = encode_transactions(&txs, 4);

        assert_eq!(data.len(), txs.iter().map(|tx| tx.encoded_len() - 1).sum::<usize>());

        let decoded = decode_transactions(&data, 4)?;
        assert_eq!(decoded.len(), 2);
        for (decoded, tx) in decoded.iter().zip(&txs) {
            assert_eq!(decoded.tx, tx.tx);
            assert_eq!(decoded.efficiency_percentage, MAX_EFFECTIVE_PERCENTAGE);
        }
        Ok(())
    }

    #[test]
    fn test_truncated_record_fails() {
        let data = encode_transactions(&[random_tx(6, 5)], FORK_ID_DRAGONFRUIT);
        let err = decode_transactions(&data[..data.len() - 1], FORK_ID_DRAGONFRUIT).unwrap_err();
        assert!(matches!(err, DecodingError::InvalidLegacyBatch { offset: 0, .. }));

        // the same bytes are a complete record when the percentage byte is not expected.
        assert!(decode_transactions(&data[..data.len() - 1], 4).is_ok());
    }
}
