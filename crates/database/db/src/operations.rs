use super::{models, DatabaseError};
use crate::DatabaseConnectionProvider;

use rollup_node_primitives::{Batch, Event, ForkIdInterval};
use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

/// The [`DatabaseOperations`] trait provides methods for interacting with the database.
#[async_trait::async_trait]
pub trait DatabaseOperations: DatabaseConnectionProvider + Sync {
    /// Insert a [`Batch`] into the database.
    async fn insert_batch(&self, batch: Batch) -> Result<(), DatabaseError> {
        tracing::trace!(target: "zkevm::db", batch_number = batch.batch_number, status = %batch.status, "Inserting batch into database.");
        let batch: models::batch::ActiveModel = batch.into();
        batch.insert(self.get_connection()).await?;
        Ok(())
    }

    /// Overwrite the stored [`Batch`] with the same number.
    ///
    /// Errors with [`DatabaseError::BatchNotFound`] if no such batch exists.
    async fn update_batch(&self, batch: Batch) -> Result<(), DatabaseError> {
        tracing::trace!(target: "zkevm::db", batch_number = batch.batch_number, status = %batch.status, "Updating batch in database.");
        let batch_number = batch.batch_number;
        let batch: models::batch::ActiveModel = batch.into();
        let result = models::batch::Entity::update_many()
            .set(batch)
            .filter(models::batch::Column::BatchNumber.eq(batch_number as i64))
            .exec(self.get_connection())
            .await?;
        if result.rows_affected == 0 {
            return Err(DatabaseError::BatchNotFound(batch_number))
        }
        Ok(())
    }

    /// Get a [`Batch`] from the database by its number.
    async fn get_batch(&self, batch_number: u64) -> Result<Option<Batch>, DatabaseError> {
        models::batch::Entity::find_by_id(batch_number as i64)
            .one(self.get_connection())
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    /// Get the [`Batch`] with the highest number.
    async fn get_last_batch(&self) -> Result<Option<Batch>, DatabaseError> {
        Ok(self.get_last_n_batches(1).await?.pop())
    }

    /// Get the [`Batch`] with the highest number, locking its row until the end of the current
    /// transaction on backends supporting row locks.
    async fn get_last_batch_for_update(&self) -> Result<Option<Batch>, DatabaseError> {
        let connection = self.get_connection();
        let mut query = models::batch::Entity::find()
            .order_by_desc(models::batch::Column::BatchNumber)
            .limit(1);
        if connection.get_database_backend() != DbBackend::Sqlite {
            query = query.lock_exclusive();
        }
        query.one(connection).await?.map(TryInto::try_into).transpose()
    }

    /// Get the last `n` batches, by descending batch number.
    async fn get_last_n_batches(&self, n: u64) -> Result<Vec<Batch>, DatabaseError> {
        models::batch::Entity::find()
            .order_by_desc(models::batch::Column::BatchNumber)
            .limit(n)
            .all(self.get_connection())
            .await?
            .into_iter()
            .map(TryInto::try_into)
            .collect()
    }

    /// Get the number of the last batch.
    async fn get_last_batch_number(&self) -> Result<Option<u64>, DatabaseError> {
        Ok(models::batch::Entity::find()
            .select_only()
            .column(models::batch::Column::BatchNumber)
            .order_by_desc(models::batch::Column::BatchNumber)
            .into_tuple::<i64>()
            .one(self.get_connection())
            .await?
            .map(|n| n as u64))
    }

    /// Delete all [`Batch`]es with a number greater than the provided one. Returns the number of
    /// deleted batches.
    async fn delete_batches_gt(&self, batch_number: u64) -> Result<u64, DatabaseError> {
        tracing::trace!(target: "zkevm::db", batch_number, "Deleting batches greater than batch number.");
        Ok(models::batch::Entity::delete_many()
            .filter(models::batch::Column::BatchNumber.gt(batch_number as i64))
            .exec(self.get_connection())
            .await?
            .rows_affected)
    }

    /// Insert a [`ForkIdInterval`], replacing the stored interval of the same fork id.
    async fn insert_fork_id(&self, interval: ForkIdInterval) -> Result<(), DatabaseError> {
        tracing::trace!(target: "zkevm::db", fork_id = interval.fork_id, from = interval.from_batch_number, to = interval.to_batch_number, "Inserting fork id into database.");
        let interval: models::fork_id::ActiveModel = interval.into();
        models::fork_id::Entity::insert(interval)
            .on_conflict(
                OnConflict::column(models::fork_id::Column::ForkId)
                    .update_columns([
                        models::fork_id::Column::FromBatchNumber,
                        models::fork_id::Column::ToBatchNumber,
                        models::fork_id::Column::Version,
                        models::fork_id::Column::BlockNumber,
                    ])
                    .to_owned(),
            )
            .exec(self.get_connection())
            .await?;
        Ok(())
    }

    /// Get all [`ForkIdInterval`]s, ordered by their first batch number.
    async fn get_fork_ids(&self) -> Result<Vec<ForkIdInterval>, DatabaseError> {
        Ok(models::fork_id::Entity::find()
            .order_by_asc(models::fork_id::Column::FromBatchNumber)
            .all(self.get_connection())
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Insert an [`Event`] into the database.
    async fn insert_event(&self, event: Event) -> Result<(), DatabaseError> {
        tracing::trace!(target: "zkevm::db", event_id = %event.event_id, batch_number = ?event.batch_number, "Inserting event into database.");
        let event: models::event::ActiveModel = event.into();
        models::event::Entity::insert(event).exec(self.get_connection()).await?;
        Ok(())
    }

    /// Get the [`Event`]s related to the provided batch.
    async fn get_events_by_batch_number(
        &self,
        batch_number: u64,
    ) -> Result<Vec<Event>, DatabaseError> {
        models::event::Entity::find()
            .filter(models::event::Column::BatchNumber.eq(batch_number as i64))
            .all(self.get_connection())
            .await?
            .into_iter()
            .map(TryInto::try_into)
            .collect()
    }
}

impl<T> DatabaseOperations for T where T: DatabaseConnectionProvider + Sync {}
