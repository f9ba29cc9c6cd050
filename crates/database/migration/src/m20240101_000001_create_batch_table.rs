use crate::{ADDRESS_LENGTH, HASH_LENGTH, ZK_COUNTERS_LENGTH};
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Batch::Table)
                    .if_not_exists()
                    .col(big_unsigned(Batch::BatchNumber).primary_key())
                    .col(binary_len(Batch::Coinbase, ADDRESS_LENGTH))
                    .col(binary(Batch::BatchL2Data))
                    .col(binary_len(Batch::StateRoot, HASH_LENGTH))
                    .col(binary_len(Batch::LocalExitRoot, HASH_LENGTH))
                    .col(binary_len(Batch::AccInputHash, HASH_LENGTH))
                    .col(binary_len(Batch::GlobalExitRoot, HASH_LENGTH))
                    .col(big_unsigned(Batch::Timestamp))
                    .col(big_unsigned_null(Batch::ForcedBatchNumber))
                    .col(binary_len(Batch::ZkCounters, ZK_COUNTERS_LENGTH))
                    .col(big_unsigned(Batch::Bytes))
                    .col(tiny_unsigned(Batch::Status))
                    .col(binary_len_null(Batch::VirtualizedTxHash, HASH_LENGTH))
                    .col(big_unsigned_null(Batch::VirtualizedBlockNumber))
                    .col(binary_len_null(Batch::ConsolidatedTxHash, HASH_LENGTH))
                    .col(big_unsigned_null(Batch::ConsolidatedBlockNumber))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Batch::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Batch {
    Table,
    BatchNumber,
    Coinbase,
    BatchL2Data,
    StateRoot,
    LocalExitRoot,
    AccInputHash,
    GlobalExitRoot,
    Timestamp,
    ForcedBatchNumber,
    ZkCounters,
    Bytes,
    Status,
    VirtualizedTxHash,
    VirtualizedBlockNumber,
    ConsolidatedTxHash,
    ConsolidatedBlockNumber,
}
