use crate::DatabaseError;

use alloy_primitives::{Address, B256};
use rollup_node_primitives::{Batch, BatchResources, BatchStatus, L1Reference, ZkCounters};
use sea_orm::{entity::prelude::*, ActiveValue};

/// A database model that represents a batch.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "batch")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub(crate) batch_number: i64,
    coinbase: Vec<u8>,
    batch_l2_data: Vec<u8>,
    state_root: Vec<u8>,
    local_exit_root: Vec<u8>,
    acc_input_hash: Vec<u8>,
    global_exit_root: Vec<u8>,
    timestamp: i64,
    forced_batch_number: Option<i64>,
    zk_counters: Vec<u8>,
    bytes: i64,
    pub(crate) status: i16,
    virtualized_tx_hash: Option<Vec<u8>>,
    virtualized_block_number: Option<i64>,
    consolidated_tx_hash: Option<Vec<u8>>,
    consolidated_block_number: Option<i64>,
}

/// The relation for the batch model.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

/// The active model behavior for the batch model.
impl ActiveModelBehavior for ActiveModel {}

fn l1_reference(tx_hash: Option<Vec<u8>>, block_number: Option<i64>) -> Option<L1Reference> {
    Some(L1Reference::new(B256::try_from(tx_hash?.as_slice()).ok()?, block_number? as u64))
}

impl From<Batch> for ActiveModel {
    fn from(batch: Batch) -> Self {
        Self {
            batch_number: ActiveValue::Set(batch.batch_number as i64),
            coinbase: ActiveValue::Set(batch.coinbase.to_vec()),
            batch_l2_data: ActiveValue::Set(batch.batch_l2_data.to_vec()),
            state_root: ActiveValue::Set(batch.state_root.to_vec()),
            local_exit_root: ActiveValue::Set(batch.local_exit_root.to_vec()),
            acc_input_hash: ActiveValue::Set(batch.acc_input_hash.to_vec()),
            global_exit_root: ActiveValue::Set(batch.global_exit_root.to_vec()),
            timestamp: ActiveValue::Set(batch.timestamp as i64),
            forced_batch_number: ActiveValue::Set(batch.forced_batch_number.map(|n| n as i64)),
            zk_counters: ActiveValue::Set(batch.resources.zk_counters.to_be_bytes().to_vec()),
            bytes: ActiveValue::Set(batch.resources.bytes as i64),
            status: ActiveValue::Set(batch.status.as_u8() as i16),
            virtualized_tx_hash: ActiveValue::Set(batch.virtualized.map(|r| r.tx_hash.to_vec())),
            virtualized_block_number: ActiveValue::Set(
                batch.virtualized.map(|r| r.block_number as i64),
            ),
            consolidated_tx_hash: ActiveValue::Set(batch.consolidated.map(|r| r.tx_hash.to_vec())),
            consolidated_block_number: ActiveValue::Set(
                batch.consolidated.map(|r| r.block_number as i64),
            ),
        }
    }
}

impl TryFrom<Model> for Batch {
    type Error = DatabaseError;

    fn try_from(value: Model) -> Result<Self, Self::Error> {
        let invalid = |column| DatabaseError::InvalidColumn { table: "batch", column };
        let hash = |bytes: &[u8], column| B256::try_from(bytes).map_err(|_| invalid(column));

        Ok(Self {
            batch_number: value.batch_number as u64,
            coinbase: Address::try_from(value.coinbase.as_slice())
                .map_err(|_| invalid("coinbase"))?,
            batch_l2_data: value.batch_l2_data.into(),
            state_root: hash(&value.state_root, "state_root")?,
            local_exit_root: hash(&value.local_exit_root, "local_exit_root")?,
            acc_input_hash: hash(&value.acc_input_hash, "acc_input_hash")?,
            global_exit_root: hash(&value.global_exit_root, "global_exit_root")?,
            timestamp: value.timestamp as u64,
            forced_batch_number: value.forced_batch_number.map(|n| n as u64),
            resources: BatchResources {
                zk_counters: ZkCounters::from_be_bytes(&value.zk_counters)
                    .ok_or_else(|| invalid("zk_counters"))?,
                bytes: value.bytes as u64,
            },
            status: u8::try_from(value.status)
                .ok()
                .and_then(BatchStatus::from_u8)
                .ok_or_else(|| invalid("status"))?,
            virtualized: l1_reference(value.virtualized_tx_hash, value.virtualized_block_number),
            consolidated: l1_reference(
                value.consolidated_tx_hash,
                value.consolidated_block_number,
            ),
        })
    }
}
