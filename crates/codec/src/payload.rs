//! Decoded batch payload.

use crate::{BatchRawV2, L2TxRaw};
use std::vec::Vec;

/// The decoded content of a batch.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::From)]
pub enum BatchPayload {
    /// Transactions of a pre-etrog batch.
    Legacy(Vec<L2TxRaw>),
    /// Blocks of an etrog batch.
    V2(BatchRawV2),
}

impl BatchPayload {
    /// Returns an iterator over the transactions of the payload, in order.
    pub fn transactions(&self) -> Box<dyn Iterator<Item = &L2TxRaw> + '_> {
        match self {
            Self::Legacy(txs) => Box::new(txs.iter()),
            Self::V2(batch) => Box::new(batch.transactions()),
        }
    }

    /// Returns the number of transactions in the payload.
    pub fn transactions_count(&self) -> usize {
        match self {
            Self::Legacy(txs) => txs.len(),
            Self::V2(batch) => batch.blocks.iter().map(|b| b.transactions.len()).sum(),
        }
    }

    /// Returns true if the payload has no transactions.
    pub fn is_empty(&self) -> bool {
        self.transactions_count() == 0
    }
}
