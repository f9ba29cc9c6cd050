use super::m20240101_000001_create_batch_table::Batch;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_batch_status")
                    .col(Batch::Status)
                    .table(Batch::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_batch_forced_batch_number")
                    .col(Batch::ForcedBatchNumber)
                    .table(Batch::Table)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_batch_status").table(Batch::Table).to_owned())
            .await?;
        manager
            .drop_index(
                Index::drop().name("idx_batch_forced_batch_number").table(Batch::Table).to_owned(),
            )
            .await
    }
}
