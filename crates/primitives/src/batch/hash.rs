use crate::FORK_ID_ETROG;
use alloy_primitives::{bytes::BufMut, keccak256, Address, B256};

/// The inputs of a batch chained into the accumulated input hash.
#[derive(Debug, Clone, Copy)]
pub struct AccInputHashInput<'a> {
    /// The accumulated input hash of the previous batch.
    pub old_acc_input_hash: B256,
    /// The encoded transactions of the batch.
    pub batch_l2_data: &'a [u8],
    /// The global exit root before etrog, the L1 info root from etrog onward.
    pub global_exit_root: B256,
    /// The batch timestamp before etrog, the timestamp limit from etrog onward.
    pub timestamp: u64,
    /// The sequencer address.
    pub sequencer: Address,
    /// The L1 block hash of a forced batch. Ignored before etrog.
    pub forced_block_hash_l1: B256,
}

/// Computes the accumulated input hash of a batch for the provided fork id.
///
/// `keccak256(old_acc_input_hash ‖ keccak256(batch_l2_data) ‖ global_exit_root ‖ timestamp ‖
/// sequencer [‖ forced_block_hash_l1])`, the timestamp encoded as a big endian `u64`.
pub fn calculate_acc_input_hash(fork_id: u64, input: &AccInputHashInput<'_>) -> B256 {
    let mut buf = Vec::with_capacity(32 * 4 + 8 + 20);
    buf.put_slice(input.old_acc_input_hash.as_slice());
    buf.put_slice(keccak256(input.batch_l2_data).as_slice());
    buf.put_slice(input.global_exit_root.as_slice());
    buf.put_u64(input.timestamp);
    buf.put_slice(input.sequencer.as_slice());
    if fork_id >= FORK_ID_ETROG {
        buf.put_slice(input.forced_block_hash_l1.as_slice());
    }

    keccak256(buf)
}
