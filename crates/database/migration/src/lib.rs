// async_trait impls must mirror the elided `&SchemaManager` signature of `MigrationTrait`.
#![allow(elided_lifetimes_in_paths)]

pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_batch_table;
mod m20240101_000002_create_fork_id_table;
mod m20240101_000003_create_event_table;
mod m20240115_000001_add_batch_indexes;

/// The byte length of a hash column.
pub(crate) const HASH_LENGTH: u32 = 32;

/// The byte length of an address column.
pub(crate) const ADDRESS_LENGTH: u32 = 20;

/// The byte length of the encoded zk counters.
pub(crate) const ZK_COUNTERS_LENGTH: u32 = 40;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_batch_table::Migration),
            Box::new(m20240101_000002_create_fork_id_table::Migration),
            Box::new(m20240101_000003_create_event_table::Migration),
            Box::new(m20240115_000001_add_batch_indexes::Migration),
        ]
    }
}
