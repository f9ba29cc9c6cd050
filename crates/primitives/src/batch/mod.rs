use crate::BatchResources;
use alloy_primitives::{Address, Bytes, B256};

mod hash;
pub use hash::{calculate_acc_input_hash, AccInputHashInput};

/// A batch is the unit of settlement to L1 for the rollup.
///
/// A batch groups an ordered list of L2 blocks, encoded in [`Batch::batch_l2_data`], which are
/// applied atomically on top of the previous batch's state root. The sequencer creates a batch in
/// the [`BatchStatus::Open`] state, appends transactions to it and closes it exactly once. The L1
/// synchronizer later marks it as virtualized and consolidated.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct Batch {
    /// The number of the batch.
    pub batch_number: u64,
    /// The address receiving the fees of the batch.
    pub coinbase: Address,
    /// The encoded L2 blocks and transactions of the batch.
    pub batch_l2_data: Bytes,
    /// The state root after applying the batch.
    pub state_root: B256,
    /// The local exit root after applying the batch.
    pub local_exit_root: B256,
    /// The accumulated input hash, chaining the inputs of all previous batches.
    pub acc_input_hash: B256,
    /// The global exit root of the batch. Holds the L1 info root for etrog and later forks.
    pub global_exit_root: B256,
    /// The batch timestamp, in seconds. Used as the timestamp limit for etrog and later forks.
    pub timestamp: u64,
    /// The number of the forced batch, if the batch was forced on L1.
    pub forced_batch_number: Option<u64>,
    /// The resources used by the batch.
    pub resources: BatchResources,
    /// The lifecycle status of the batch.
    pub status: BatchStatus,
    /// The L1 sequencing reference, set once the batch is virtualized.
    pub virtualized: Option<L1Reference>,
    /// The L1 verification reference, set once the batch is consolidated.
    pub consolidated: Option<L1Reference>,
}

impl Batch {
    /// Returns a new open batch with empty data on top of the provided roots.
    pub fn new_open(
        batch_number: u64,
        coinbase: Address,
        global_exit_root: B256,
        timestamp: u64,
        state_root: B256,
        acc_input_hash: B256,
    ) -> Self {
        Self {
            batch_number,
            coinbase,
            batch_l2_data: Bytes::new(),
            state_root,
            local_exit_root: B256::ZERO,
            acc_input_hash,
            global_exit_root,
            timestamp,
            forced_batch_number: None,
            resources: BatchResources::default(),
            status: BatchStatus::Open,
            virtualized: None,
            consolidated: None,
        }
    }

    /// Returns true if the batch is still accepting transactions.
    pub const fn is_open(&self) -> bool {
        matches!(self.status, BatchStatus::Open)
    }

    /// Returns true if the batch contains encoded transaction data.
    pub fn has_transactions(&self) -> bool {
        !self.batch_l2_data.is_empty()
    }
}

/// The lifecycle status of a [`Batch`].
///
/// Transitions are monotonic and one-way, each status can only move to its direct successor.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub enum BatchStatus {
    /// The batch is accepting transactions.
    #[default]
    #[display("open")]
    Open,
    /// The batch is sealed and ready to be sequenced on L1.
    #[display("closed")]
    Closed,
    /// The batch was sequenced on L1.
    #[display("virtualized")]
    Virtualized,
    /// The batch was proven on L1.
    #[display("consolidated")]
    Consolidated,
}

impl BatchStatus {
    /// Returns the status as stored in the database.
    pub const fn as_u8(&self) -> u8 {
        match self {
            Self::Open => 0,
            Self::Closed => 1,
            Self::Virtualized => 2,
            Self::Consolidated => 3,
        }
    }

    /// Returns the status for the provided database value.
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Open),
            1 => Some(Self::Closed),
            2 => Some(Self::Virtualized),
            3 => Some(Self::Consolidated),
            _ => None,
        }
    }

    /// Returns true if the status can move to `next`.
    pub const fn can_transition_to(&self, next: Self) -> bool {
        next.as_u8() == self.as_u8() + 1
    }
}

/// A reference to the L1 transaction which sequenced or verified a batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct L1Reference {
    /// The L1 transaction hash.
    pub tx_hash: B256,
    /// The L1 block number containing the transaction.
    pub block_number: u64,
}

impl L1Reference {
    /// Returns a new instance of [`L1Reference`].
    pub const fn new(tx_hash: B256, block_number: u64) -> Self {
        Self { tx_hash, block_number }
    }
}

/// The outcome of processing a batch, used to close it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingReceipt {
    /// The number of the processed batch.
    pub batch_number: u64,
    /// The state root after the batch.
    pub state_root: B256,
    /// The local exit root after the batch.
    pub local_exit_root: B256,
    /// The accumulated input hash after the batch.
    pub acc_input_hash: B256,
    /// The final encoded transactions of the batch.
    pub batch_l2_data: Bytes,
    /// The resources used by the batch.
    pub resources: BatchResources,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions_are_one_way() {
        assert!(BatchStatus::Open.can_transition_to(BatchStatus::Closed));
        assert!(BatchStatus::Closed.can_transition_to(BatchStatus::Virtualized));
        assert!(BatchStatus::Virtualized.can_transition_to(BatchStatus::Consolidated));

        assert!(!BatchStatus::Closed.can_transition_to(BatchStatus::Open));
        assert!(!BatchStatus::Open.can_transition_to(BatchStatus::Virtualized));
        assert!(!BatchStatus::Consolidated.can_transition_to(BatchStatus::Consolidated));
    }

    #[test]
    fn test_status_database_representation() {
        for status in [
            BatchStatus::Open,
            BatchStatus::Closed,
            BatchStatus::Virtualized,
            BatchStatus::Consolidated,
        ] {
            assert_eq!(BatchStatus::from_u8(status.as_u8()), Some(status));
        }
        assert_eq!(BatchStatus::from_u8(4), None);
    }
}
