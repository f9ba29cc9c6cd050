use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Event::Table)
                    .if_not_exists()
                    .col(pk_auto(Event::Id))
                    .col(big_unsigned(Event::ReceivedAt))
                    .col(string(Event::Source))
                    .col(string(Event::Component))
                    .col(string(Event::Level))
                    .col(string(Event::EventId))
                    .col(text(Event::Description))
                    .col(big_unsigned_null(Event::BatchNumber))
                    .col(binary_null(Event::Data))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Event::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Event {
    Table,
    Id,
    ReceivedAt,
    Source,
    Component,
    Level,
    EventId,
    Description,
    BatchNumber,
    Data,
}
