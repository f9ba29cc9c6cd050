//! A library responsible for persisting the batch ledger, the fork id intervals and the event log.

mod connection;
pub use connection::DatabaseConnectionProvider;

mod db;
pub use db::Database;

mod error;
pub use error::{CanRetry, DatabaseError};

mod ledger;
pub use ledger::{BatchLedger, LedgerError, LedgerStrategy, LedgerTx};

mod metrics;

mod models;

mod operations;
pub use operations::DatabaseOperations;

mod retry;
pub use retry::{retry_operation_with_name, RetryConfig};

mod transaction;
pub use transaction::TXMut;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use sea_orm::{DbErr, IsolationLevel};

#[cfg(test)]
mod tests {
    use super::{test_utils::setup_test_db, DatabaseError, DatabaseOperations};

    use alloy_primitives::{Bytes, B256};
    use arbitrary::{Arbitrary, Unstructured};
    use rand::Rng;
    use rollup_node_primitives::{
        Batch, BatchStatus, Event, EventComponent, EventId, EventLevel, ForkIdInterval,
    };

    fn random_batch(u: &mut Unstructured<'_>, batch_number: u64) -> Batch {
        let mut batch = Batch::arbitrary(u).unwrap();
        batch.batch_number = batch_number;
        batch
    }

    #[tokio::test]
    async fn test_database_round_trip_batch() {
        let db = setup_test_db().await;

        let mut bytes = [0u8; 4096];
        rand::rng().fill(bytes.as_mut_slice());
        let mut u = Unstructured::new(&bytes);

        let batch = random_batch(&mut u, 7);
        db.insert_batch(batch.clone()).await.unwrap();

        let stored = db.get_batch(7).await.unwrap().unwrap();
        assert_eq!(stored, batch);
        assert_eq!(db.get_batch(8).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_database_update_batch() {
        let db = setup_test_db().await;

        let mut bytes = [0u8; 4096];
        rand::rng().fill(bytes.as_mut_slice());
        let mut u = Unstructured::new(&bytes);

        let mut batch = random_batch(&mut u, 1);
        db.insert_batch(batch.clone()).await.unwrap();

        batch.status = BatchStatus::Closed;
        batch.batch_l2_data = Bytes::from_static(&[1, 2, 3]);
        batch.state_root = B256::repeat_byte(9);
        db.update_batch(batch.clone()).await.unwrap();
        assert_eq!(db.get_batch(1).await.unwrap(), Some(batch.clone()));

        batch.batch_number = 2;
        assert!(matches!(db.update_batch(batch).await, Err(DatabaseError::BatchNotFound(2))));
    }

    #[tokio::test]
    async fn test_database_last_batches_and_delete() {
        let db = setup_test_db().await;

        let mut bytes = [0u8; 8192];
        rand::rng().fill(bytes.as_mut_slice());
        let mut u = Unstructured::new(&bytes);

        assert_eq!(db.get_last_batch().await.unwrap(), None);
        assert_eq!(db.get_last_batch_number().await.unwrap(), None);

        for batch_number in 0..10 {
            db.insert_batch(random_batch(&mut u, batch_number)).await.unwrap();
        }

        assert_eq!(db.get_last_batch_number().await.unwrap(), Some(9));
        assert_eq!(db.get_last_batch().await.unwrap().map(|b| b.batch_number), Some(9));
        assert_eq!(db.get_last_batch_for_update().await.unwrap().map(|b| b.batch_number), Some(9));

        let last = db.get_last_n_batches(3).await.unwrap();
        assert_eq!(last.iter().map(|b| b.batch_number).collect::<Vec<_>>(), vec![9, 8, 7]);

        assert_eq!(db.delete_batches_gt(6).await.unwrap(), 3);
        assert_eq!(db.get_last_batch_number().await.unwrap(), Some(6));
        assert_eq!(db.delete_batches_gt(6).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_database_fork_ids() {
        let db = setup_test_db().await;

        let etrog = ForkIdInterval::new(101, u64::MAX, 7, "v7.0.0", 19_000_000);
        let dragonfruit = ForkIdInterval::new(0, 100, 5, "v5.0.0", 18_000_000);
        db.insert_fork_id(etrog.clone()).await.unwrap();
        db.insert_fork_id(dragonfruit.clone()).await.unwrap();

        assert_eq!(db.get_fork_ids().await.unwrap(), vec![dragonfruit, etrog.clone()]);

        // inserting the same fork id again replaces the interval.
        let closed = ForkIdInterval { to_batch_number: 200, ..etrog };
        db.insert_fork_id(closed.clone()).await.unwrap();
        assert_eq!(db.get_fork_ids().await.unwrap().pop(), Some(closed));
    }

    #[tokio::test]
    async fn test_database_events() {
        let db = setup_test_db().await;

        let event = Event {
            received_at: 1_700_000_000,
            source: "node".to_string(),
            component: EventComponent::Executor,
            level: EventLevel::Error,
            event_id: EventId::ExecutorError,
            description: "executor unavailable".to_string(),
            batch_number: Some(3),
            data: Some(Bytes::from_static(&[0xde, 0xad])),
        };
        db.insert_event(event.clone()).await.unwrap();
        db.insert_event(Event { batch_number: Some(4), ..event.clone() }).await.unwrap();

        assert_eq!(db.get_events_by_batch_number(3).await.unwrap(), vec![event]);
        assert!(db.get_events_by_batch_number(5).await.unwrap().is_empty());
    }
}
