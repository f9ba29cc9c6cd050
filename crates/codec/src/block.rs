//! L2 block and transaction records of a batch.

use std::vec::Vec;

use alloy_primitives::{keccak256, Bytes, B256};

use crate::{
    decoding::transaction::LegacyTransaction, error::DecodingError, EFFICIENCY_PERCENTAGE_LENGTH,
    SIGNATURE_LENGTH,
};

/// A transaction as it is carried in the batch data: the RLP list of the unsigned transaction
/// followed by the raw signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTransaction {
    /// The RLP list encoding of the transaction fields, header included.
    pub rlp: Bytes,
    /// The `r` value of the signature.
    pub r: B256,
    /// The `s` value of the signature.
    pub s: B256,
    /// The `v` value of the signature.
    pub v: u8,
}

impl RawTransaction {
    /// Returns a new instance of a [`RawTransaction`].
    pub const fn new(rlp: Bytes, r: B256, s: B256, v: u8) -> Self {
        Self { rlp, r, s, v }
    }

    /// Returns the encoded length of the transaction and its signature.
    pub fn encoded_len(&self) -> usize {
        self.rlp.len() + SIGNATURE_LENGTH
    }

    /// Returns the hash of the unsigned RLP payload.
    pub fn signature_hash(&self) -> B256 {
        keccak256(&self.rlp)
    }

    /// Decodes the RLP list into a [`LegacyTransaction`].
    pub fn decode_body(&self) -> Result<LegacyTransaction, DecodingError> {
        LegacyTransaction::decode_unsigned(&self.rlp)
    }
}

/// A transaction of a batch along with its effective gas price percentage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct L2TxRaw {
    /// The effective gas price percentage byte.
    pub efficiency_percentage: u8,
    /// The transaction.
    pub tx: RawTransaction,
}

impl L2TxRaw {
    /// Returns a new instance of a [`L2TxRaw`].
    pub const fn new(tx: RawTransaction, efficiency_percentage: u8) -> Self {
        Self { efficiency_percentage, tx }
    }

    /// Returns the encoded length of the record, including the efficiency percentage byte.
    pub fn encoded_len(&self) -> usize {
        self.tx.encoded_len() + EFFICIENCY_PERCENTAGE_LENGTH
    }
}

/// A L2 block of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct L2BlockRaw {
    /// The timestamp delta relative to the previous block.
    pub delta_timestamp: u32,
    /// The index of the leaf in the L1 info tree used by the block.
    pub index_l1_info_tree: u32,
    /// The transactions of the block.
    pub transactions: Vec<L2TxRaw>,
}

impl L2BlockRaw {
    /// Returns a new instance of a [`L2BlockRaw`].
    pub const fn new(
        delta_timestamp: u32,
        index_l1_info_tree: u32,
        transactions: Vec<L2TxRaw>,
    ) -> Self {
        Self { delta_timestamp, index_l1_info_tree, transactions }
    }
}

/// The content of an etrog batch: a list of L2 blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchRawV2 {
    /// The blocks of the batch.
    pub blocks: Vec<L2BlockRaw>,
}

impl BatchRawV2 {
    /// Returns a new instance of a [`BatchRawV2`].
    pub const fn new(blocks: Vec<L2BlockRaw>) -> Self {
        Self { blocks }
    }

    /// Returns an iterator over all transactions of the batch.
    pub fn transactions(&self) -> impl Iterator<Item = &L2TxRaw> {
        self.blocks.iter().flat_map(|block| block.transactions.iter())
    }
}

/// The content of a forced batch: transactions without block headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForcedBatchRawV2 {
    /// The transactions of the forced batch.
    pub transactions: Vec<L2TxRaw>,
}
