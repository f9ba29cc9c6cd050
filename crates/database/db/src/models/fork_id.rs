use rollup_node_primitives::ForkIdInterval;
use sea_orm::{entity::prelude::*, ActiveValue};

/// A database model that represents a fork id interval.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "fork_id")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub(crate) fork_id: i64,
    pub(crate) from_batch_number: i64,
    pub(crate) to_batch_number: i64,
    version: String,
    block_number: i64,
}

/// The relation for the fork id model.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

/// The active model behavior for the fork id model.
impl ActiveModelBehavior for ActiveModel {}

// u64 values are stored bit-cast, an open ended interval keeps `u64::MAX` as its upper bound.
impl From<ForkIdInterval> for ActiveModel {
    fn from(interval: ForkIdInterval) -> Self {
        Self {
            fork_id: ActiveValue::Set(interval.fork_id as i64),
            from_batch_number: ActiveValue::Set(interval.from_batch_number as i64),
            to_batch_number: ActiveValue::Set(interval.to_batch_number as i64),
            version: ActiveValue::Set(interval.version),
            block_number: ActiveValue::Set(interval.block_number as i64),
        }
    }
}

impl From<Model> for ForkIdInterval {
    fn from(value: Model) -> Self {
        Self {
            from_batch_number: value.from_batch_number as u64,
            to_batch_number: value.to_batch_number as u64,
            fork_id: value.fork_id as u64,
            version: value.version,
            block_number: value.block_number as u64,
        }
    }
}
