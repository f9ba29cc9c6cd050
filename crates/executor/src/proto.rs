//! Messages of the `executor.v1.ExecutorService` gRPC service.
//!
//! Enumerations are carried as raw `int32` values, see [`crate::ExecutorError`] and
//! [`crate::RomError`] for their interpretation.

use crate::{ExecutorError, RomError};
use std::collections::HashMap;

/// Request to process a batch of transactions.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ProcessBatchRequestV2 {
    /// The state root before the batch.
    #[prost(bytes = "vec", tag = "1")]
    pub old_state_root: Vec<u8>,
    /// The accumulated input hash before the batch.
    #[prost(bytes = "vec", tag = "2")]
    pub old_acc_input_hash: Vec<u8>,
    /// The number of the previous batch.
    #[prost(uint64, tag = "3")]
    pub old_batch_num: u64,
    /// The L2 chain id.
    #[prost(uint64, tag = "4")]
    pub chain_id: u64,
    /// The fork id the batch is executed under.
    #[prost(uint64, tag = "5")]
    pub fork_id: u64,
    /// The encoded batch data.
    #[prost(bytes = "vec", tag = "6")]
    pub batch_l2_data: Vec<u8>,
    /// The L1 info tree root.
    #[prost(bytes = "vec", tag = "7")]
    pub l1_info_root: Vec<u8>,
    /// The maximum timestamp allowed for the L2 blocks of the batch.
    #[prost(uint64, tag = "8")]
    pub timestamp_limit: u64,
    /// The hex encoded sequencer address.
    #[prost(string, tag = "9")]
    pub coinbase: String,
    /// The L1 block hash of a forced batch.
    #[prost(bytes = "vec", tag = "10")]
    pub forced_blockhash_l1: Vec<u8>,
    /// 1 to persist the resulting state in the Merkle tree.
    #[prost(uint32, tag = "11")]
    pub update_merkle_tree: u32,
    /// 1 to skip the counters verification.
    #[prost(uint64, tag = "12")]
    pub no_counters: u64,
    /// The sender of an unsigned transaction.
    #[prost(string, tag = "13")]
    pub from: String,
    /// 1 to skip the first change L2 block transaction.
    #[prost(uint32, tag = "14")]
    pub skip_first_change_l2_block: u32,
    /// 1 to skip writing the block info root.
    #[prost(uint32, tag = "15")]
    pub skip_write_block_info_root: u32,
    /// The L1 info tree leaves referenced by the batch, keyed by index.
    #[prost(map = "uint32, message", tag = "16")]
    pub l1_info_tree_data: HashMap<u32, L1DataV2>,
    /// An identifier of the request, used to correlate executor logs.
    #[prost(string, tag = "20")]
    pub context_id: String,
}

/// A leaf of the L1 info tree.
#[derive(Clone, PartialEq, prost::Message)]
pub struct L1DataV2 {
    /// The global exit root.
    #[prost(bytes = "vec", tag = "1")]
    pub global_exit_root: Vec<u8>,
    /// The L1 block hash.
    #[prost(bytes = "vec", tag = "2")]
    pub block_hash_l1: Vec<u8>,
    /// The minimum timestamp of the leaf.
    #[prost(uint64, tag = "3")]
    pub min_timestamp: u64,
    /// The Merkle proof of the leaf.
    #[prost(bytes = "vec", repeated, tag = "4")]
    pub smt_proof: Vec<Vec<u8>>,
}

/// Result of processing a batch.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ProcessBatchResponseV2 {
    /// The state root after the batch.
    #[prost(bytes = "vec", tag = "1")]
    pub new_state_root: Vec<u8>,
    /// The accumulated input hash after the batch.
    #[prost(bytes = "vec", tag = "2")]
    pub new_acc_input_hash: Vec<u8>,
    /// The local exit root after the batch.
    #[prost(bytes = "vec", tag = "3")]
    pub new_local_exit_root: Vec<u8>,
    /// The number of the processed batch.
    #[prost(uint64, tag = "4")]
    pub new_batch_num: u64,
    /// The keccak hashes used by the batch.
    #[prost(uint32, tag = "5")]
    pub cnt_keccak_hashes: u32,
    /// The poseidon hashes used by the batch.
    #[prost(uint32, tag = "6")]
    pub cnt_poseidon_hashes: u32,
    /// The poseidon paddings used by the batch.
    #[prost(uint32, tag = "7")]
    pub cnt_poseidon_paddings: u32,
    /// The mem aligns used by the batch.
    #[prost(uint32, tag = "8")]
    pub cnt_mem_aligns: u32,
    /// The arithmetics used by the batch.
    #[prost(uint32, tag = "9")]
    pub cnt_arithmetics: u32,
    /// The binaries used by the batch.
    #[prost(uint32, tag = "10")]
    pub cnt_binaries: u32,
    /// The steps used by the batch.
    #[prost(uint32, tag = "11")]
    pub cnt_steps: u32,
    /// The sha256 hashes used by the batch.
    #[prost(uint32, tag = "12")]
    pub cnt_sha256_hashes: u32,
    /// The per L2 block results.
    #[prost(message, repeated, tag = "13")]
    pub block_responses: Vec<ProcessBlockResponseV2>,
    /// The executor level error, see [`ExecutorError`].
    #[prost(int32, tag = "14")]
    pub error: i32,
    /// The id of the last flush of the Merkle tree.
    #[prost(uint64, tag = "16")]
    pub flush_id: u64,
    /// The id of the last stored flush of the Merkle tree.
    #[prost(uint64, tag = "17")]
    pub stored_flush_id: u64,
    /// The id of the executor instance.
    #[prost(string, tag = "18")]
    pub prover_id: String,
    /// The gas used by the batch.
    #[prost(uint64, tag = "19")]
    pub gas_used: u64,
    /// The fork id the batch was executed under.
    #[prost(uint64, tag = "22")]
    pub fork_id: u64,
    /// 1 if the batch is invalid and was processed as empty.
    #[prost(uint32, tag = "23")]
    pub invalid_batch: u32,
    /// The ROM level error, see [`RomError`].
    #[prost(int32, tag = "24")]
    pub error_rom: i32,
    /// The keccak hashes reserved by the batch.
    #[prost(uint32, tag = "25")]
    pub cnt_reserve_keccak_hashes: u32,
    /// The poseidon hashes reserved by the batch.
    #[prost(uint32, tag = "26")]
    pub cnt_reserve_poseidon_hashes: u32,
    /// The poseidon paddings reserved by the batch.
    #[prost(uint32, tag = "27")]
    pub cnt_reserve_poseidon_paddings: u32,
    /// The mem aligns reserved by the batch.
    #[prost(uint32, tag = "28")]
    pub cnt_reserve_mem_aligns: u32,
    /// The arithmetics reserved by the batch.
    #[prost(uint32, tag = "29")]
    pub cnt_reserve_arithmetics: u32,
    /// The binaries reserved by the batch.
    #[prost(uint32, tag = "30")]
    pub cnt_reserve_binaries: u32,
    /// The steps reserved by the batch.
    #[prost(uint32, tag = "31")]
    pub cnt_reserve_steps: u32,
    /// The sha256 hashes reserved by the batch.
    #[prost(uint32, tag = "32")]
    pub cnt_reserve_sha256_hashes: u32,
}

impl ProcessBatchResponseV2 {
    /// Returns the executor level error of the response.
    pub const fn executor_error(&self) -> ExecutorError {
        ExecutorError::from_code(self.error)
    }

    /// Returns the ROM level error of the response.
    pub const fn rom_error(&self) -> RomError {
        RomError::from_code(self.error_rom)
    }
}

/// Result of processing an L2 block.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ProcessBlockResponseV2 {
    /// The hash of the parent block.
    #[prost(bytes = "vec", tag = "1")]
    pub parent_hash: Vec<u8>,
    /// The hex encoded coinbase.
    #[prost(string, tag = "2")]
    pub coinbase: String,
    /// The block gas limit.
    #[prost(uint64, tag = "3")]
    pub gas_limit: u64,
    /// The L2 block number.
    #[prost(uint64, tag = "4")]
    pub block_number: u64,
    /// The block timestamp.
    #[prost(uint64, tag = "5")]
    pub timestamp: u64,
    /// The global exit root used by the block.
    #[prost(bytes = "vec", tag = "6")]
    pub ger: Vec<u8>,
    /// The L1 block hash of the L1 info tree leaf used by the block.
    #[prost(bytes = "vec", tag = "7")]
    pub block_hash_l1: Vec<u8>,
    /// The gas used by the block.
    #[prost(uint64, tag = "8")]
    pub gas_used: u64,
    /// The block info root.
    #[prost(bytes = "vec", tag = "9")]
    pub block_info_root: Vec<u8>,
    /// The block hash.
    #[prost(bytes = "vec", tag = "10")]
    pub block_hash: Vec<u8>,
    /// The per transaction results.
    #[prost(message, repeated, tag = "11")]
    pub responses: Vec<ProcessTransactionResponseV2>,
    /// The ROM level error of the block, see [`RomError`].
    #[prost(int32, tag = "13")]
    pub error: i32,
}

/// Result of processing a transaction.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ProcessTransactionResponseV2 {
    /// The transaction hash.
    #[prost(bytes = "vec", tag = "1")]
    pub tx_hash: Vec<u8>,
    /// The L2 specific transaction hash.
    #[prost(bytes = "vec", tag = "2")]
    pub tx_hash_l2: Vec<u8>,
    /// The RLP encoded signed transaction.
    #[prost(bytes = "vec", tag = "3")]
    pub rlp_tx: Vec<u8>,
    /// The hash of the block including the transaction.
    #[prost(bytes = "vec", tag = "4")]
    pub block_hash: Vec<u8>,
    /// The number of the block including the transaction.
    #[prost(uint64, tag = "5")]
    pub block_number: u64,
    /// The transaction type.
    #[prost(uint32, tag = "6")]
    pub r#type: u32,
    /// The data returned by the transaction.
    #[prost(bytes = "vec", tag = "7")]
    pub return_value: Vec<u8>,
    /// The gas left after the transaction.
    #[prost(uint64, tag = "8")]
    pub gas_left: u64,
    /// The gas used by the transaction.
    #[prost(uint64, tag = "9")]
    pub gas_used: u64,
    /// The gas refunded to the sender.
    #[prost(uint64, tag = "10")]
    pub gas_refunded: u64,
    /// The ROM level error of the transaction, see [`RomError`].
    #[prost(int32, tag = "11")]
    pub error: i32,
    /// The hex encoded address of a created contract.
    #[prost(string, tag = "12")]
    pub create_address: String,
    /// The state root after the transaction.
    #[prost(bytes = "vec", tag = "13")]
    pub state_root: Vec<u8>,
    /// The decimal effective gas price.
    #[prost(string, tag = "16")]
    pub effective_gas_price: String,
    /// The effective gas price percentage.
    #[prost(uint32, tag = "17")]
    pub effective_percentage: u32,
    /// 1 if the transaction executed the `GASPRICE` opcode.
    #[prost(uint32, tag = "18")]
    pub has_gasprice_opcode: u32,
    /// 1 if the transaction executed the `BALANCE` opcode.
    #[prost(uint32, tag = "19")]
    pub has_balance_opcode: u32,
    /// The receipt status.
    #[prost(uint32, tag = "20")]
    pub status: u32,
}

impl ProcessTransactionResponseV2 {
    /// Returns the ROM level error of the transaction.
    pub const fn rom_error(&self) -> RomError {
        RomError::from_code(self.error)
    }
}

/// Request to process a batch of a fork before etrog.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ProcessBatchRequest {
    /// The state root before the batch.
    #[prost(bytes = "vec", tag = "1")]
    pub old_state_root: Vec<u8>,
    /// The accumulated input hash before the batch.
    #[prost(bytes = "vec", tag = "2")]
    pub old_acc_input_hash: Vec<u8>,
    /// The number of the previous batch.
    #[prost(uint64, tag = "3")]
    pub old_batch_num: u64,
    /// The L2 chain id.
    #[prost(uint64, tag = "4")]
    pub chain_id: u64,
    /// The fork id the batch is executed under.
    #[prost(uint64, tag = "5")]
    pub fork_id: u64,
    /// The encoded batch data.
    #[prost(bytes = "vec", tag = "6")]
    pub batch_l2_data: Vec<u8>,
    /// The global exit root of the batch.
    #[prost(bytes = "vec", tag = "7")]
    pub global_exit_root: Vec<u8>,
    /// The timestamp of the batch.
    #[prost(uint64, tag = "8")]
    pub eth_timestamp: u64,
    /// The hex encoded sequencer address.
    #[prost(string, tag = "9")]
    pub coinbase: String,
    /// 1 to persist the resulting state in the Merkle tree.
    #[prost(uint32, tag = "10")]
    pub update_merkle_tree: u32,
    /// 1 to skip the counters verification.
    #[prost(uint64, tag = "11")]
    pub no_counters: u64,
    /// The sender of an unsigned transaction.
    #[prost(string, tag = "12")]
    pub from: String,
    /// An identifier of the request, used to correlate executor logs.
    #[prost(string, tag = "16")]
    pub context_id: String,
}

/// Result of processing a batch of a fork before etrog.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ProcessBatchResponse {
    /// The state root after the batch.
    #[prost(bytes = "vec", tag = "1")]
    pub new_state_root: Vec<u8>,
    /// The accumulated input hash after the batch.
    #[prost(bytes = "vec", tag = "2")]
    pub new_acc_input_hash: Vec<u8>,
    /// The local exit root after the batch.
    #[prost(bytes = "vec", tag = "3")]
    pub new_local_exit_root: Vec<u8>,
    /// The number of the processed batch.
    #[prost(uint64, tag = "4")]
    pub new_batch_num: u64,
    /// The keccak hashes used by the batch.
    #[prost(uint32, tag = "5")]
    pub cnt_keccak_hashes: u32,
    /// The poseidon hashes used by the batch.
    #[prost(uint32, tag = "6")]
    pub cnt_poseidon_hashes: u32,
    /// The poseidon paddings used by the batch.
    #[prost(uint32, tag = "7")]
    pub cnt_poseidon_paddings: u32,
    /// The mem aligns used by the batch.
    #[prost(uint32, tag = "8")]
    pub cnt_mem_aligns: u32,
    /// The arithmetics used by the batch.
    #[prost(uint32, tag = "9")]
    pub cnt_arithmetics: u32,
    /// The binaries used by the batch.
    #[prost(uint32, tag = "10")]
    pub cnt_binaries: u32,
    /// The steps used by the batch.
    #[prost(uint32, tag = "11")]
    pub cnt_steps: u32,
    /// The gas used by the batch.
    #[prost(uint64, tag = "12")]
    pub cumulative_gas_used: u64,
    /// The per transaction results.
    #[prost(message, repeated, tag = "13")]
    pub responses: Vec<ProcessTransactionResponse>,
    /// The executor level error, see [`ExecutorError`].
    #[prost(int32, tag = "14")]
    pub error: i32,
    /// The id of the last flush of the Merkle tree.
    #[prost(uint64, tag = "16")]
    pub flush_id: u64,
    /// The id of the last stored flush of the Merkle tree.
    #[prost(uint64, tag = "17")]
    pub stored_flush_id: u64,
    /// The id of the executor instance.
    #[prost(string, tag = "18")]
    pub prover_id: String,
    /// The fork id the batch was executed under.
    #[prost(uint64, tag = "19")]
    pub fork_id: u64,
}

/// Result of processing a transaction of a fork before etrog.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ProcessTransactionResponse {
    /// The transaction hash.
    #[prost(bytes = "vec", tag = "1")]
    pub tx_hash: Vec<u8>,
    /// The RLP encoded signed transaction.
    #[prost(bytes = "vec", tag = "2")]
    pub rlp_tx: Vec<u8>,
    /// The transaction type.
    #[prost(uint32, tag = "3")]
    pub r#type: u32,
    /// The data returned by the transaction.
    #[prost(bytes = "vec", tag = "4")]
    pub return_value: Vec<u8>,
    /// The gas left after the transaction.
    #[prost(uint64, tag = "5")]
    pub gas_left: u64,
    /// The gas used by the transaction.
    #[prost(uint64, tag = "6")]
    pub gas_used: u64,
    /// The gas refunded to the sender.
    #[prost(uint64, tag = "7")]
    pub gas_refunded: u64,
    /// The ROM level error of the transaction, see [`RomError`].
    #[prost(int32, tag = "8")]
    pub error: i32,
    /// The hex encoded address of a created contract.
    #[prost(string, tag = "9")]
    pub create_address: String,
    /// The state root after the transaction.
    #[prost(bytes = "vec", tag = "10")]
    pub state_root: Vec<u8>,
    /// The decimal effective gas price.
    #[prost(string, tag = "13")]
    pub effective_gas_price: String,
    /// The effective gas price percentage.
    #[prost(uint32, tag = "14")]
    pub effective_percentage: u32,
    /// 1 if the transaction executed the `GASPRICE` opcode.
    #[prost(uint32, tag = "15")]
    pub has_gasprice_opcode: u32,
    /// 1 if the transaction executed the `BALANCE` opcode.
    #[prost(uint32, tag = "16")]
    pub has_balance_opcode: u32,
}

/// Before etrog every transaction is an L2 block of its own and the ROM errors are only reported
/// per transaction. The batch carries the first out of counters error of its transactions.
impl From<ProcessBatchResponse> for ProcessBatchResponseV2 {
    fn from(response: ProcessBatchResponse) -> Self {
        let error_rom = response
            .responses
            .iter()
            .map(|tx| RomError::from_code(tx.error))
            .find(RomError::is_out_of_counters)
            .unwrap_or(RomError::NoError);

        Self {
            new_state_root: response.new_state_root,
            new_acc_input_hash: response.new_acc_input_hash,
            new_local_exit_root: response.new_local_exit_root,
            new_batch_num: response.new_batch_num,
            cnt_keccak_hashes: response.cnt_keccak_hashes,
            cnt_poseidon_hashes: response.cnt_poseidon_hashes,
            cnt_poseidon_paddings: response.cnt_poseidon_paddings,
            cnt_mem_aligns: response.cnt_mem_aligns,
            cnt_arithmetics: response.cnt_arithmetics,
            cnt_binaries: response.cnt_binaries,
            cnt_steps: response.cnt_steps,
            block_responses: response.responses.into_iter().map(Into::into).collect(),
            error: response.error,
            flush_id: response.flush_id,
            stored_flush_id: response.stored_flush_id,
            prover_id: response.prover_id,
            gas_used: response.cumulative_gas_used,
            fork_id: response.fork_id,
            error_rom: error_rom.code(),
            ..Default::default()
        }
    }
}

impl From<ProcessTransactionResponse> for ProcessBlockResponseV2 {
    fn from(tx: ProcessTransactionResponse) -> Self {
        let status = u32::from(!RomError::from_code(tx.error).is_error());
        Self {
            gas_used: tx.gas_used,
            error: RomError::NoError.code(),
            responses: vec![ProcessTransactionResponseV2 {
                tx_hash: tx.tx_hash,
                rlp_tx: tx.rlp_tx,
                r#type: tx.r#type,
                return_value: tx.return_value,
                gas_left: tx.gas_left,
                gas_used: tx.gas_used,
                gas_refunded: tx.gas_refunded,
                error: tx.error,
                create_address: tx.create_address,
                state_root: tx.state_root,
                effective_gas_price: tx.effective_gas_price,
                effective_percentage: tx.effective_percentage,
                has_gasprice_opcode: tx.has_gasprice_opcode,
                has_balance_opcode: tx.has_balance_opcode,
                status,
                ..Default::default()
            }],
            ..Default::default()
        }
    }
}
