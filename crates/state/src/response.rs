//! Domain types of an executor result and their conversion from the wire messages.

use alloy_primitives::{Address, Bytes, B256, U256};
use rollup_node_primitives::ZkCounters;
use std::str::FromStr;
use zkevm_codec::{decode_rlp_transaction, DecodingError, SignedLegacyTransaction};
use zkevm_executor::{
    ExecutionFailure, ProcessBatchResponseV2, ProcessBlockResponseV2, ProcessTransactionResponseV2,
    RomError,
};

/// A field of the executor response which can't be converted to its domain type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResponseError {
    /// A hash field is not 32 bytes long.
    #[error("invalid {field} length: {length}")]
    InvalidHash {
        /// The field.
        field: &'static str,
        /// The received length.
        length: usize,
    },
    /// An address field is not a hex encoded address.
    #[error("invalid {field} address: {value}")]
    InvalidAddress {
        /// The field.
        field: &'static str,
        /// The received value.
        value: String,
    },
    /// An amount field is not a number.
    #[error("invalid {field} amount: {value}")]
    InvalidAmount {
        /// The field.
        field: &'static str,
        /// The received value.
        value: String,
    },
}

/// The result of processing a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessBatchResponse {
    /// The state root after the batch.
    pub new_state_root: B256,
    /// The accumulated input hash after the batch.
    pub new_acc_input_hash: B256,
    /// The local exit root after the batch.
    pub new_local_exit_root: B256,
    /// The number of the processed batch.
    pub new_batch_number: u64,
    /// The processed L2 blocks.
    pub block_responses: Vec<ProcessBlockResponse>,
    /// The counters used by the batch.
    pub used_counters: ZkCounters,
    /// The counters reserved while executing the batch.
    pub reserved_counters: ZkCounters,
    /// The ROM failure of the batch, if any. Executor failures are reported as errors instead.
    pub error: Option<ExecutionFailure>,
    /// The flush id of the state changes.
    pub flush_id: u64,
    /// The last flush id stored by the executor.
    pub stored_flush_id: u64,
    /// The identifier of the executor instance.
    pub prover_id: String,
    /// The fork id the batch was executed with.
    pub fork_id: u64,
    /// True if the batch data could not be executed at all.
    pub invalid_batch: bool,
}

impl ProcessBatchResponse {
    /// Returns true if the batch was processed without any ROM error.
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Returns true if the batch exhausted a zkEVM counter.
    pub const fn is_out_of_counters(&self) -> bool {
        matches!(self.error, Some(ExecutionFailure::OutOfCounters(_)))
    }

    /// Returns an iterator over the transaction responses of every block, in order.
    pub fn transactions(&self) -> impl Iterator<Item = &ProcessTransactionResponse> {
        self.block_responses.iter().flat_map(|block| block.transactions.iter())
    }
}

/// The result of processing a L2 block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessBlockResponse {
    /// The parent block hash.
    pub parent_hash: B256,
    /// The fee recipient.
    pub coinbase: Address,
    /// The block gas limit.
    pub gas_limit: u64,
    /// The block number.
    pub block_number: u64,
    /// The block timestamp.
    pub timestamp: u64,
    /// The global exit root of the block.
    pub global_exit_root: B256,
    /// The L1 block hash referenced by the block.
    pub block_hash_l1: B256,
    /// The gas used by the block.
    pub gas_used: u64,
    /// The root of the block info tree.
    pub block_info_root: B256,
    /// The block hash.
    pub block_hash: B256,
    /// The processed transactions.
    pub transactions: Vec<ProcessTransactionResponse>,
    /// The ROM failure of the block, if any.
    pub error: Option<ExecutionFailure>,
}

/// The result of processing a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessTransactionResponse {
    /// The transaction hash.
    pub tx_hash: B256,
    /// The L2 transaction hash.
    pub tx_hash_l2: B256,
    /// The transaction as returned by the executor.
    pub rlp_tx: Bytes,
    /// The decoded transaction, [`None`] if it could not be decoded.
    pub transaction: Option<SignedLegacyTransaction>,
    /// The hash of the including block.
    pub block_hash: B256,
    /// The number of the including block.
    pub block_number: u64,
    /// The transaction type.
    pub tx_type: u32,
    /// The returned data.
    pub return_value: Bytes,
    /// The gas left after execution.
    pub gas_left: u64,
    /// The gas used.
    pub gas_used: u64,
    /// The gas refunded.
    pub gas_refunded: u64,
    /// The ROM failure of the transaction, if any.
    pub error: Option<ExecutionFailure>,
    /// The address of the created contract, if any.
    pub create_address: Address,
    /// The state root after the transaction.
    pub state_root: B256,
    /// The effective gas price paid.
    pub effective_gas_price: U256,
    /// The effective gas price percentage.
    pub effective_percentage: u32,
    /// True if the transaction used the `GASPRICE` opcode.
    pub has_gasprice_opcode: bool,
    /// True if the transaction used the `BALANCE` opcode.
    pub has_balance_opcode: bool,
    /// The receipt status.
    pub status: u32,
}

impl ProcessTransactionResponse {
    /// Returns the ROM error of the transaction, if any.
    pub fn rom_error(&self) -> Option<RomError> {
        self.error.and_then(|failure| failure.rom_error())
    }
}

/// A transaction of the response whose raw bytes could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndecodedTransaction {
    /// The index of the block in the response.
    pub block_index: usize,
    /// The index of the transaction in its block.
    pub tx_index: usize,
    /// The transaction hash.
    pub tx_hash: B256,
    /// The ROM error of the transaction, if any.
    pub rom_error: Option<RomError>,
    /// The decoding error.
    pub error: DecodingError,
}

impl UndecodedTransaction {
    /// Returns true if the transaction executed without a ROM error, and so had to be decodable.
    pub const fn is_expected(&self) -> bool {
        self.rom_error.is_none()
    }
}

/// Converts the executor response. The transactions which could not be decoded are returned
/// alongside the response, with their [`ProcessTransactionResponse::transaction`] unset.
pub(crate) fn convert_batch_response(
    response: ProcessBatchResponseV2,
) -> Result<(ProcessBatchResponse, Vec<UndecodedTransaction>), ResponseError> {
    let mut undecoded = Vec::new();
    let error = ExecutionFailure::from_rom(response.rom_error());
    let used_counters = ZkCounters {
        gas_used: response.gas_used,
        keccak_hashes: response.cnt_keccak_hashes,
        poseidon_hashes: response.cnt_poseidon_hashes,
        poseidon_paddings: response.cnt_poseidon_paddings,
        mem_aligns: response.cnt_mem_aligns,
        arithmetics: response.cnt_arithmetics,
        binaries: response.cnt_binaries,
        steps: response.cnt_steps,
        sha256_hashes: response.cnt_sha256_hashes,
    };
    let reserved_counters = ZkCounters {
        gas_used: response.gas_used,
        keccak_hashes: response.cnt_reserve_keccak_hashes,
        poseidon_hashes: response.cnt_reserve_poseidon_hashes,
        poseidon_paddings: response.cnt_reserve_poseidon_paddings,
        mem_aligns: response.cnt_reserve_mem_aligns,
        arithmetics: response.cnt_reserve_arithmetics,
        binaries: response.cnt_reserve_binaries,
        steps: response.cnt_reserve_steps,
        sha256_hashes: response.cnt_reserve_sha256_hashes,
    };

    let block_responses = response
        .block_responses
        .into_iter()
        .enumerate()
        .map(|(block_index, block)| convert_block_response(block_index, block, &mut undecoded))
        .collect::<Result<Vec<_>, _>>()?;

    let response = ProcessBatchResponse {
        new_state_root: to_hash("new_state_root", &response.new_state_root)?,
        new_acc_input_hash: to_hash("new_acc_input_hash", &response.new_acc_input_hash)?,
        new_local_exit_root: to_hash("new_local_exit_root", &response.new_local_exit_root)?,
        new_batch_number: response.new_batch_num,
        block_responses,
        used_counters,
        reserved_counters,
        error,
        flush_id: response.flush_id,
        stored_flush_id: response.stored_flush_id,
        prover_id: response.prover_id,
        fork_id: response.fork_id,
        invalid_batch: response.invalid_batch != 0,
    };
    Ok((response, undecoded))
}

fn convert_block_response(
    block_index: usize,
    block: ProcessBlockResponseV2,
    undecoded: &mut Vec<UndecodedTransaction>,
) -> Result<ProcessBlockResponse, ResponseError> {
    let transactions = block
        .responses
        .into_iter()
        .enumerate()
        .map(|(tx_index, tx)| {
            let (tx, error) = convert_transaction_response(tx)?;
            if let Some(error) = error {
                undecoded.push(UndecodedTransaction {
                    block_index,
                    tx_index,
                    tx_hash: tx.tx_hash,
                    rom_error: tx.rom_error(),
                    error,
                });
            }
            Ok(tx)
        })
        .collect::<Result<Vec<_>, ResponseError>>()?;

    Ok(ProcessBlockResponse {
        parent_hash: to_hash("parent_hash", &block.parent_hash)?,
        coinbase: to_address("coinbase", &block.coinbase)?,
        gas_limit: block.gas_limit,
        block_number: block.block_number,
        timestamp: block.timestamp,
        global_exit_root: to_hash("ger", &block.ger)?,
        block_hash_l1: to_hash("block_hash_l1", &block.block_hash_l1)?,
        gas_used: block.gas_used,
        block_info_root: to_hash("block_info_root", &block.block_info_root)?,
        block_hash: to_hash("block_hash", &block.block_hash)?,
        transactions,
        error: ExecutionFailure::from_rom(RomError::from_code(block.error)),
    })
}

fn convert_transaction_response(
    tx: ProcessTransactionResponseV2,
) -> Result<(ProcessTransactionResponse, Option<DecodingError>), ResponseError> {
    let (transaction, decoding_error) = match decode_rlp_transaction(&tx.rlp_tx) {
        Ok(transaction) => (Some(transaction), None),
        Err(err) => (None, Some(err)),
    };
    let error = ExecutionFailure::from_rom(tx.rom_error());

    let response = ProcessTransactionResponse {
        tx_hash: to_hash("tx_hash", &tx.tx_hash)?,
        tx_hash_l2: to_hash("tx_hash_l2", &tx.tx_hash_l2)?,
        transaction,
        block_hash: to_hash("block_hash", &tx.block_hash)?,
        block_number: tx.block_number,
        tx_type: tx.r#type,
        return_value: tx.return_value.into(),
        gas_left: tx.gas_left,
        gas_used: tx.gas_used,
        gas_refunded: tx.gas_refunded,
        error,
        create_address: to_address("create_address", &tx.create_address)?,
        state_root: to_hash("state_root", &tx.state_root)?,
        effective_gas_price: to_amount("effective_gas_price", &tx.effective_gas_price)?,
        effective_percentage: tx.effective_percentage,
        has_gasprice_opcode: tx.has_gasprice_opcode != 0,
        has_balance_opcode: tx.has_balance_opcode != 0,
        status: tx.status,
        rlp_tx: tx.rlp_tx.into(),
    };
    Ok((response, decoding_error))
}

/// Converts a 32 bytes field. An empty field is the zero hash.
fn to_hash(field: &'static str, bytes: &[u8]) -> Result<B256, ResponseError> {
    match bytes.len() {
        0 => Ok(B256::ZERO),
        32 => Ok(B256::from_slice(bytes)),
        length => Err(ResponseError::InvalidHash { field, length }),
    }
}

/// Converts a hex encoded address. An empty field is the zero address.
fn to_address(field: &'static str, value: &str) -> Result<Address, ResponseError> {
    if value.is_empty() {
        return Ok(Address::ZERO)
    }
    Address::from_str(value)
        .map_err(|_| ResponseError::InvalidAddress { field, value: value.to_string() })
}

/// Converts a decimal or `0x` prefixed hex amount. An empty field is zero.
fn to_amount(field: &'static str, value: &str) -> Result<U256, ResponseError> {
    if value.is_empty() {
        return Ok(U256::ZERO)
    }
    U256::from_str(value).map_err(|_| ResponseError::InvalidAmount { field, value: value.to_string() })
}
