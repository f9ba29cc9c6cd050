//! The batch ledger: units of work over the persisted batches, shared by the sequencer and the
//! synchronizer.
//!
//! Both writers read the latest batch, validate their mutation against it and commit. Two
//! disciplines keep them from interleaving unsafely, selected by [`LedgerStrategy`]:
//!
//! - [`LedgerStrategy::Serializable`]: the unit of work snapshots the latest batch and stages its
//!   writes. On commit, the latest batch and every other batch the staged updates were derived
//!   from are read again inside a serializable transaction. The unit is aborted with
//!   [`LedgerError::Conflict`] or [`LedgerError::BatchChanged`] if any of them changed. The loser
//!   retries from a fresh read.
//! - [`LedgerStrategy::RowLock`]: the unit of work takes the writer lock and an exclusive lock on
//!   the latest batch row when it begins. A second writer blocks until the first one commits and
//!   then observes its changes.

use crate::{
    metrics::LedgerMetrics, transaction::TXMut, CanRetry, Database, DatabaseError,
    DatabaseOperations,
};

use rollup_node_primitives::{Batch, BatchStatus, L1Reference, ProcessingReceipt};
use sea_orm::IsolationLevel;
use std::{
    fmt::{Debug, Formatter},
    sync::Arc,
    time::Instant,
};

/// The concurrency discipline of the [`BatchLedger`].
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString, strum::EnumIter,
)]
#[strum(serialize_all = "kebab-case")]
pub enum LedgerStrategy {
    /// Optimistic units of work validated at commit time.
    #[default]
    Serializable,
    /// Pessimistic units of work holding the writer lock from the start.
    RowLock,
}

/// An error returned by the [`BatchLedger`].
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The batch is not the one expected by the ledger.
    #[error("invalid batch number {got}, expected {expected}")]
    InvalidBatchNumber {
        /// The expected batch number.
        expected: u64,
        /// The provided batch number.
        got: u64,
    },
    /// The batch is not in the ledger.
    #[error("batch {0} not found")]
    BatchNotFound(u64),
    /// The batch was already closed.
    #[error("batch {0} is already closed")]
    BatchAlreadyClosed(u64),
    /// A batch can't be opened while the previous one is open.
    #[error("previous batch {0} is not closed")]
    PreviousBatchNotClosed(u64),
    /// A batch can't be closed without transactions.
    #[error("batch {0} can't be closed without transactions")]
    ClosingBatchWithoutTxs(u64),
    /// The status can't move backwards or skip a step.
    #[error("batch {batch_number} can't move from {from} to {to}")]
    InvalidStatusTransition {
        /// The batch number.
        batch_number: u64,
        /// The current status.
        from: BatchStatus,
        /// The requested status.
        to: BatchStatus,
    },
    /// A concurrent writer changed the ledger since the unit of work began.
    #[error("ledger conflict: latest batch was {expected:?} and is now {found:?}")]
    Conflict {
        /// The latest batch number when the unit of work began.
        expected: Option<u64>,
        /// The latest batch number at commit.
        found: Option<u64>,
    },
    /// A batch the unit of work read was changed by a concurrent writer.
    #[error("ledger conflict: batch {0} was changed by a concurrent writer")]
    BatchChanged(u64),
    /// A database error occurred.
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl LedgerError {
    fn from_commit(err: DatabaseError, expected: Option<u64>) -> Self {
        if err.is_serialization_failure() {
            Self::Conflict { expected, found: None }
        } else {
            err.into()
        }
    }
}

impl CanRetry for LedgerError {
    fn can_retry(&self) -> bool {
        match self {
            Self::Conflict { .. } | Self::BatchChanged(_) => true,
            Self::Database(err) => err.can_retry(),
            _ => false,
        }
    }
}

/// A write of a unit of work.
#[derive(Debug, Clone)]
enum LedgerWrite {
    Insert(Batch),
    Update(Batch),
    DeleteGt(u64),
}

impl LedgerWrite {
    async fn apply<D: DatabaseOperations>(self, db: &D) -> Result<(), DatabaseError> {
        match self {
            Self::Insert(batch) => db.insert_batch(batch).await,
            Self::Update(batch) => db.update_batch(batch).await,
            Self::DeleteGt(batch_number) => db.delete_batches_gt(batch_number).await.map(|_| ()),
        }
    }
}

/// The persisted ledger of batches.
#[derive(Clone)]
pub struct BatchLedger {
    db: Arc<Database>,
    strategy: LedgerStrategy,
    metrics: LedgerMetrics,
}

impl Debug for BatchLedger {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchLedger").field("db", &self.db).field("strategy", &self.strategy).finish()
    }
}

impl BatchLedger {
    /// Returns a new [`BatchLedger`] over the database.
    pub fn new(db: Arc<Database>, strategy: LedgerStrategy) -> Self {
        Self { db, strategy, metrics: LedgerMetrics::default() }
    }

    /// Returns the concurrency strategy of the ledger.
    pub const fn strategy(&self) -> LedgerStrategy {
        self.strategy
    }

    /// Returns the underlying database.
    pub const fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// Begins a new unit of work. With [`LedgerStrategy::RowLock`], waits until the current writer
    /// commits or rolls back.
    pub async fn begin(&self) -> Result<LedgerTx, LedgerError> {
        let (mode, latest) = match self.strategy {
            LedgerStrategy::Serializable => {
                let snapshot = self.db.get_last_batch().await?;
                let mode = UnitOfWork::Optimistic {
                    db: self.db.clone(),
                    snapshot: snapshot.clone(),
                    reads: Vec::new(),
                    staged: Vec::new(),
                };
                (mode, snapshot)
            }
            LedgerStrategy::RowLock => {
                let now = Instant::now();
                let tx = self.db.tx_mut(None).await?;
                self.metrics.write_lock_acquire_duration.record(now.elapsed().as_secs_f64());
                let latest = tx.get_last_batch_for_update().await?;
                (UnitOfWork::Locked { tx }, latest)
            }
        };

        tracing::trace!(target: "zkevm::db", strategy = %self.strategy, latest = ?latest.as_ref().map(|b| b.batch_number), "Began ledger unit of work");
        Ok(LedgerTx { mode, latest, metrics: self.metrics.clone(), started_at: Instant::now() })
    }
}

enum UnitOfWork {
    /// `reads` holds the batches below the snapshot, as read from the database, that staged
    /// writes depend on.
    Optimistic {
        db: Arc<Database>,
        snapshot: Option<Batch>,
        reads: Vec<Batch>,
        staged: Vec<LedgerWrite>,
    },
    Locked {
        tx: TXMut,
    },
}

/// A unit of work over the [`BatchLedger`]. Every operation validates against the latest batch as
/// seen by the unit of work, including its own writes. Dropping the unit of work without
/// committing discards its writes.
pub struct LedgerTx {
    mode: UnitOfWork,
    latest: Option<Batch>,
    metrics: LedgerMetrics,
    started_at: Instant,
}

impl Debug for LedgerTx {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let strategy = match self.mode {
            UnitOfWork::Optimistic { .. } => LedgerStrategy::Serializable,
            UnitOfWork::Locked { .. } => LedgerStrategy::RowLock,
        };
        f.debug_struct("LedgerTx")
            .field("strategy", &strategy)
            .field("latest", &self.last_batch_number())
            .finish()
    }
}

impl LedgerTx {
    /// Returns the latest batch.
    pub const fn last_batch(&self) -> Option<&Batch> {
        self.latest.as_ref()
    }

    /// Returns the number of the latest batch.
    pub fn last_batch_number(&self) -> Option<u64> {
        self.latest.as_ref().map(|batch| batch.batch_number)
    }

    /// Returns the batch with the provided number.
    pub async fn get_batch(&self, batch_number: u64) -> Result<Option<Batch>, LedgerError> {
        if let Some(latest) = &self.latest {
            if latest.batch_number == batch_number {
                return Ok(Some(latest.clone()))
            }
            if batch_number > latest.batch_number {
                return Ok(None)
            }
        }

        match &self.mode {
            UnitOfWork::Locked { tx } => Ok(tx.get_batch(batch_number).await?),
            UnitOfWork::Optimistic { db, staged, .. } => {
                for write in staged.iter().rev() {
                    match write {
                        LedgerWrite::Insert(batch) | LedgerWrite::Update(batch)
                            if batch.batch_number == batch_number =>
                        {
                            return Ok(Some(batch.clone()))
                        }
                        LedgerWrite::DeleteGt(n) if batch_number > *n => return Ok(None),
                        _ => {}
                    }
                }
                Ok(db.get_batch(batch_number).await?)
            }
        }
    }

    /// Returns the last `n` batches, latest first.
    pub async fn get_last_n_batches(&self, n: u64) -> Result<Vec<Batch>, LedgerError> {
        let Some(latest) = self.last_batch_number() else { return Ok(Vec::new()) };
        let mut batches = Vec::new();
        for batch_number in (latest.saturating_sub(n.saturating_sub(1))..=latest).rev() {
            if let Some(batch) = self.get_batch(batch_number).await? {
                batches.push(batch);
            }
        }
        Ok(batches)
    }

    /// Checks the batch is stored as `expected`, the unit of work's own writes included, and
    /// commits only if it still is. Returns [`LedgerError::BatchChanged`] otherwise.
    pub async fn expect_batch(&mut self, expected: &Batch) -> Result<(), LedgerError> {
        let batch_number = expected.batch_number;
        let current = self.get_batch(batch_number).await?;
        if current.as_ref() != Some(expected) {
            tracing::debug!(target: "zkevm::db", batch_number, "Batch changed since it was read");
            self.metrics.conflicts.increment(1);
            return Err(LedgerError::BatchChanged(batch_number))
        }
        self.record_read(expected);
        Ok(())
    }

    /// Opens a new batch on top of the latest one, which must be closed.
    pub async fn open_batch(&mut self, mut batch: Batch) -> Result<(), LedgerError> {
        if let Some(latest) = &self.latest {
            let expected = latest.batch_number + 1;
            if batch.batch_number != expected {
                return Err(LedgerError::InvalidBatchNumber { expected, got: batch.batch_number })
            }
            if latest.is_open() {
                return Err(LedgerError::PreviousBatchNotClosed(latest.batch_number))
            }
        }

        batch.status = BatchStatus::Open;
        batch.virtualized = None;
        batch.consolidated = None;
        self.write(LedgerWrite::Insert(batch.clone())).await?;
        self.latest = Some(batch);
        Ok(())
    }

    /// Updates the data, roots and resources of the open batch after new transactions were
    /// processed.
    pub async fn update_wip_batch(&mut self, receipt: &ProcessingReceipt) -> Result<(), LedgerError> {
        let mut batch = self.latest_open(receipt.batch_number)?;
        apply_receipt(&mut batch, receipt);
        self.write(LedgerWrite::Update(batch.clone())).await?;
        self.latest = Some(batch);
        Ok(())
    }

    /// Closes the open batch with its final data. The batch must contain transactions.
    pub async fn close_batch(&mut self, receipt: &ProcessingReceipt) -> Result<(), LedgerError> {
        let mut batch = self.latest_open(receipt.batch_number)?;
        if receipt.batch_l2_data.is_empty() {
            return Err(LedgerError::ClosingBatchWithoutTxs(receipt.batch_number))
        }

        apply_receipt(&mut batch, receipt);
        batch.status = BatchStatus::Closed;
        self.write(LedgerWrite::Update(batch.clone())).await?;
        self.latest = Some(batch);
        Ok(())
    }

    /// Marks the closed batch as sequenced on L1.
    pub async fn virtualize_batch(
        &mut self,
        batch_number: u64,
        reference: L1Reference,
    ) -> Result<(), LedgerError> {
        self.transition(batch_number, BatchStatus::Virtualized, |batch| {
            batch.virtualized = Some(reference)
        })
        .await
    }

    /// Marks the virtualized batch as proven on L1.
    pub async fn consolidate_batch(
        &mut self,
        batch_number: u64,
        reference: L1Reference,
    ) -> Result<(), LedgerError> {
        self.transition(batch_number, BatchStatus::Consolidated, |batch| {
            batch.consolidated = Some(reference)
        })
        .await
    }

    /// Deletes all batches above the provided number, which becomes the latest batch.
    pub async fn reset_to(&mut self, batch_number: u64) -> Result<(), LedgerError> {
        match self.last_batch_number() {
            Some(latest) if batch_number < latest => {}
            _ => return Ok(()),
        }

        let batch =
            self.get_batch(batch_number).await?.ok_or(LedgerError::BatchNotFound(batch_number))?;
        tracing::trace!(target: "zkevm::db", batch_number, latest = ?self.last_batch_number(), "Resetting ledger");
        self.write(LedgerWrite::DeleteGt(batch_number)).await?;
        self.latest = Some(batch);
        Ok(())
    }

    /// Commits the unit of work.
    pub async fn commit(self) -> Result<(), LedgerError> {
        let Self { mode, metrics, started_at, .. } = self;
        match mode {
            UnitOfWork::Optimistic { db, snapshot, reads, staged } => {
                let expected = snapshot.as_ref().map(|b| b.batch_number);
                if staged.is_empty() {
                    return Ok(())
                }

                let now = Instant::now();
                let tx = db.tx_mut(Some(IsolationLevel::Serializable)).await?;
                metrics.write_lock_acquire_duration.record(now.elapsed().as_secs_f64());

                let current = tx.get_last_batch().await?;
                if current != snapshot {
                    let found = current.as_ref().map(|b| b.batch_number);
                    tracing::debug!(target: "zkevm::db", ?expected, ?found, "Ledger conflict detected on commit");
                    metrics.conflicts.increment(1);
                    tx.rollback().await?;
                    return Err(LedgerError::Conflict { expected, found })
                }
                for read in &reads {
                    if tx.get_batch(read.batch_number).await?.as_ref() != Some(read) {
                        tracing::debug!(target: "zkevm::db", batch_number = read.batch_number, "Ledger conflict detected on commit");
                        metrics.conflicts.increment(1);
                        tx.rollback().await?;
                        return Err(LedgerError::BatchChanged(read.batch_number))
                    }
                }

                for write in staged {
                    write.apply(&tx).await.map_err(|err| LedgerError::from_commit(err, expected))?;
                }
                tx.commit().await.map_err(|err| LedgerError::from_commit(err, expected))?;
            }
            UnitOfWork::Locked { tx } => tx.commit().await?,
        }

        metrics.commit_duration.record(started_at.elapsed().as_secs_f64());
        Ok(())
    }

    /// Discards the unit of work.
    pub async fn rollback(self) -> Result<(), LedgerError> {
        if let UnitOfWork::Locked { tx } = self.mode {
            tx.rollback().await?;
        }
        Ok(())
    }

    fn latest_open(&self, batch_number: u64) -> Result<Batch, LedgerError> {
        let latest = self.latest.as_ref().ok_or(LedgerError::BatchNotFound(batch_number))?;
        if latest.batch_number != batch_number {
            return Err(LedgerError::InvalidBatchNumber {
                expected: latest.batch_number,
                got: batch_number,
            })
        }
        if !latest.is_open() {
            return Err(LedgerError::BatchAlreadyClosed(batch_number))
        }
        Ok(latest.clone())
    }

    async fn transition(
        &mut self,
        batch_number: u64,
        to: BatchStatus,
        update: impl FnOnce(&mut Batch),
    ) -> Result<(), LedgerError> {
        let mut batch =
            self.get_batch(batch_number).await?.ok_or(LedgerError::BatchNotFound(batch_number))?;
        if !batch.status.can_transition_to(to) {
            return Err(LedgerError::InvalidStatusTransition { batch_number, from: batch.status, to })
        }

        self.record_read(&batch);
        batch.status = to;
        update(&mut batch);
        self.write(LedgerWrite::Update(batch.clone())).await?;
        if self.last_batch_number() == Some(batch_number) {
            self.latest = Some(batch);
        }
        Ok(())
    }

    /// Records a batch a staged write depends on, unless it was read from the unit of work's own
    /// writes or the snapshot, which is validated on commit anyway.
    fn record_read(&mut self, batch: &Batch) {
        let UnitOfWork::Optimistic { snapshot, reads, staged, .. } = &mut self.mode else { return };
        let number = batch.batch_number;
        let staged_here = staged.iter().any(|write| {
            matches!(write, LedgerWrite::Insert(b) | LedgerWrite::Update(b) if b.batch_number == number)
        });
        let in_snapshot = snapshot.as_ref().is_some_and(|b| b.batch_number == number);
        if !staged_here && !in_snapshot && !reads.iter().any(|b| b.batch_number == number) {
            reads.push(batch.clone());
        }
    }

    async fn write(&mut self, write: LedgerWrite) -> Result<(), LedgerError> {
        match &mut self.mode {
            UnitOfWork::Optimistic { staged, .. } => staged.push(write),
            UnitOfWork::Locked { tx } => write.apply(&*tx).await?,
        }
        Ok(())
    }
}

fn apply_receipt(batch: &mut Batch, receipt: &ProcessingReceipt) {
    batch.state_root = receipt.state_root;
    batch.local_exit_root = receipt.local_exit_root;
    batch.acc_input_hash = receipt.acc_input_hash;
    batch.batch_l2_data = receipt.batch_l2_data.clone();
    batch.resources = receipt.resources;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    use alloy_primitives::{Address, Bytes, B256};
    use rollup_node_primitives::BatchResources;
    use std::time::Duration;
    use strum::IntoEnumIterator;

    const N: u64 = 5;

    fn open_batch(batch_number: u64) -> Batch {
        Batch::new_open(
            batch_number,
            Address::repeat_byte(0xaa),
            B256::repeat_byte(batch_number as u8),
            1_700_000_000 + batch_number,
            B256::repeat_byte(0x10 + batch_number as u8),
            B256::repeat_byte(0x20 + batch_number as u8),
        )
    }

    fn closed_batch(batch_number: u64) -> Batch {
        let mut batch = open_batch(batch_number);
        batch.batch_l2_data = Bytes::from(vec![0x0b, 0, 0, 0, 1, 0, 0, 0, 0]);
        batch.status = BatchStatus::Closed;
        batch
    }

    fn receipt(batch_number: u64, data: &[u8]) -> ProcessingReceipt {
        ProcessingReceipt {
            batch_number,
            state_root: B256::repeat_byte(0x77),
            local_exit_root: B256::repeat_byte(0x78),
            acc_input_hash: B256::repeat_byte(0x79),
            batch_l2_data: Bytes::copy_from_slice(data),
            resources: BatchResources { bytes: data.len() as u64, ..Default::default() },
        }
    }

    /// Returns a ledger holding the closed batches `0..=N`.
    async fn setup_ledger(strategy: LedgerStrategy) -> BatchLedger {
        let db = setup_test_db().await;
        for batch_number in 0..=N {
            db.insert_batch(closed_batch(batch_number)).await.unwrap();
        }
        BatchLedger::new(Arc::new(db), strategy)
    }

    async fn last_batch_number(ledger: &BatchLedger) -> Option<u64> {
        ledger.database().get_last_batch_number().await.unwrap()
    }

    async fn assert_no_duplicates(ledger: &BatchLedger) {
        let last = last_batch_number(ledger).await.unwrap();
        let batches = ledger.database().get_last_n_batches(last + 1).await.unwrap();
        let numbers = batches.iter().map(|b| b.batch_number).collect::<Vec<_>>();
        assert_eq!(numbers, (0..=last).rev().collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_batch_lifecycle() -> eyre::Result<()> {
        for strategy in LedgerStrategy::iter() {
            let ledger = setup_ledger(strategy).await;

            let mut tx = ledger.begin().await?;
            tx.open_batch(open_batch(N + 1)).await?;
            tx.update_wip_batch(&receipt(N + 1, &[0x0b, 0, 0, 0, 0, 0, 0, 0, 0])).await?;
            tx.close_batch(&receipt(N + 1, &[0x0b, 0, 0, 0, 0, 0, 0, 0, 1])).await?;
            tx.virtualize_batch(N + 1, L1Reference::new(B256::repeat_byte(1), 100)).await?;
            tx.consolidate_batch(N + 1, L1Reference::new(B256::repeat_byte(2), 101)).await?;
            tx.commit().await?;

            let batch = ledger.database().get_batch(N + 1).await?.unwrap();
            assert_eq!(batch.status, BatchStatus::Consolidated);
            assert_eq!(batch.batch_l2_data, Bytes::from(vec![0x0b, 0, 0, 0, 0, 0, 0, 0, 1]));
            assert_eq!(batch.state_root, B256::repeat_byte(0x77));
            assert_eq!(batch.virtualized, Some(L1Reference::new(B256::repeat_byte(1), 100)));
            assert_eq!(batch.consolidated, Some(L1Reference::new(B256::repeat_byte(2), 101)));
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_lifecycle_violations() -> eyre::Result<()> {
        for strategy in LedgerStrategy::iter() {
            let ledger = setup_ledger(strategy).await;
            let mut tx = ledger.begin().await?;

            // batch numbers are contiguous.
            assert!(matches!(
                tx.open_batch(open_batch(N + 2)).await,
                Err(LedgerError::InvalidBatchNumber { expected, got }) if expected == N + 1 && got == N + 2
            ));
            // a closed batch can't be reopened or closed again.
            assert!(matches!(
                tx.close_batch(&receipt(N, &[1])).await,
                Err(LedgerError::BatchAlreadyClosed(n)) if n == N
            ));

            tx.open_batch(open_batch(N + 1)).await?;
            // the previous batch must be closed first.
            assert!(matches!(
                tx.open_batch(open_batch(N + 2)).await,
                Err(LedgerError::PreviousBatchNotClosed(n)) if n == N + 1
            ));
            // closing without transactions is rejected.
            assert!(matches!(
                tx.close_batch(&receipt(N + 1, &[])).await,
                Err(LedgerError::ClosingBatchWithoutTxs(n)) if n == N + 1
            ));
            // only the latest batch can be updated.
            assert!(matches!(
                tx.update_wip_batch(&receipt(N, &[1])).await,
                Err(LedgerError::InvalidBatchNumber { .. })
            ));
            // status transitions are one-way and can't skip a step.
            assert!(matches!(
                tx.virtualize_batch(N + 1, L1Reference::default()).await,
                Err(LedgerError::InvalidStatusTransition { from: BatchStatus::Open, .. })
            ));
            assert!(matches!(
                tx.consolidate_batch(N, L1Reference::default()).await,
                Err(LedgerError::InvalidStatusTransition { from: BatchStatus::Closed, .. })
            ));
            tx.virtualize_batch(N, L1Reference::default()).await?;
            assert!(matches!(
                tx.virtualize_batch(N, L1Reference::default()).await,
                Err(LedgerError::InvalidStatusTransition { from: BatchStatus::Virtualized, .. })
            ));

            tx.rollback().await?;
            assert_eq!(last_batch_number(&ledger).await, Some(N));
            assert_eq!(ledger.database().get_batch(N).await?.unwrap().status, BatchStatus::Closed);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_reset_to() -> eyre::Result<()> {
        for strategy in LedgerStrategy::iter() {
            let ledger = setup_ledger(strategy).await;
            let mut tx = ledger.begin().await?;
            tx.reset_to(2).await?;
            assert_eq!(tx.last_batch_number(), Some(2));
            assert_eq!(tx.get_batch(3).await?, None);
            assert_eq!(tx.get_last_n_batches(2).await?.len(), 2);

            // the ledger can be extended from the reset point.
            tx.open_batch(open_batch(3)).await?;
            tx.commit().await?;

            assert_eq!(last_batch_number(&ledger).await, Some(3));
            assert!(ledger.database().get_batch(3).await?.unwrap().is_open());
            assert_no_duplicates(&ledger).await;
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_serializable_reorg_commits_first() -> eyre::Result<()> {
        let ledger = setup_ledger(LedgerStrategy::Serializable).await;

        let mut sequencer = ledger.begin().await?;
        let mut synchronizer = ledger.begin().await?;

        sequencer.open_batch(open_batch(N + 1)).await?;
        synchronizer.reset_to(N - 1).await?;

        synchronizer.commit().await?;
        assert!(matches!(
            sequencer.commit().await,
            Err(LedgerError::Conflict { expected: Some(n), found: Some(m) }) if n == N && m == N - 1
        ));

        assert_eq!(last_batch_number(&ledger).await, Some(N - 1));
        assert_no_duplicates(&ledger).await;
        Ok(())
    }

    #[tokio::test]
    async fn test_serializable_append_commits_first() -> eyre::Result<()> {
        let ledger = setup_ledger(LedgerStrategy::Serializable).await;

        let mut sequencer = ledger.begin().await?;
        let mut synchronizer = ledger.begin().await?;

        sequencer.open_batch(open_batch(N + 1)).await?;
        synchronizer.reset_to(N - 1).await?;

        sequencer.commit().await?;
        assert_eq!(last_batch_number(&ledger).await, Some(N + 1));

        let err = synchronizer.commit().await.unwrap_err();
        assert!(err.can_retry());

        // the synchronizer reapplies its reorg from a fresh read.
        let mut synchronizer = ledger.begin().await?;
        assert_eq!(synchronizer.last_batch_number(), Some(N + 1));
        synchronizer.reset_to(N - 1).await?;
        synchronizer.commit().await?;

        assert_eq!(last_batch_number(&ledger).await, Some(N - 1));
        assert_no_duplicates(&ledger).await;
        Ok(())
    }

    #[tokio::test]
    async fn test_row_lock_reorg_commits_first() -> eyre::Result<()> {
        let ledger = setup_ledger(LedgerStrategy::RowLock).await;

        let mut synchronizer = ledger.begin().await?;
        synchronizer.reset_to(N - 1).await?;

        let sequencer = tokio::spawn({
            let ledger = ledger.clone();
            async move {
                let mut tx = ledger.begin().await?;
                let seen = tx.last_batch_number();
                let res = tx.open_batch(open_batch(N + 1)).await;
                tx.rollback().await?;
                Ok::<_, LedgerError>((seen, res))
            }
        });

        // the sequencer blocks on the synchronizer's lock.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!sequencer.is_finished());

        synchronizer.commit().await?;
        let (seen, res) = sequencer.await??;

        // the sequencer observes the deletion and its append is rejected.
        assert_eq!(seen, Some(N - 1));
        assert!(matches!(
            res,
            Err(LedgerError::InvalidBatchNumber { expected, got }) if expected == N && got == N + 1
        ));
        assert_eq!(last_batch_number(&ledger).await, Some(N - 1));
        assert_no_duplicates(&ledger).await;
        Ok(())
    }

    #[tokio::test]
    async fn test_row_lock_append_commits_first() -> eyre::Result<()> {
        let ledger = setup_ledger(LedgerStrategy::RowLock).await;

        let mut sequencer = ledger.begin().await?;
        sequencer.open_batch(open_batch(N + 1)).await?;

        let synchronizer = tokio::spawn({
            let ledger = ledger.clone();
            async move {
                let mut tx = ledger.begin().await?;
                let seen = tx.last_batch_number();
                tx.reset_to(N - 1).await?;
                tx.commit().await?;
                Ok::<_, LedgerError>(seen)
            }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!synchronizer.is_finished());

        sequencer.commit().await?;

        // the synchronizer observes the appended batch, then reapplies its reorg.
        assert_eq!(synchronizer.await??, Some(N + 1));
        assert_eq!(last_batch_number(&ledger).await, Some(N - 1));
        assert_no_duplicates(&ledger).await;
        Ok(())
    }

    #[tokio::test]
    async fn test_serializable_wip_update_conflicts() -> eyre::Result<()> {
        let ledger = setup_ledger(LedgerStrategy::Serializable).await;
        let mut tx = ledger.begin().await?;
        tx.open_batch(open_batch(N + 1)).await?;
        tx.commit().await?;

        let mut first = ledger.begin().await?;
        let mut second = ledger.begin().await?;
        first.update_wip_batch(&receipt(N + 1, &[1])).await?;
        second.update_wip_batch(&receipt(N + 1, &[2])).await?;

        first.commit().await?;
        assert!(matches!(second.commit().await, Err(LedgerError::Conflict { .. })));

        let batch = ledger.database().get_batch(N + 1).await?.unwrap();
        assert_eq!(batch.batch_l2_data, Bytes::from(vec![1]));
        Ok(())
    }

    #[tokio::test]
    async fn test_serializable_transition_below_latest_conflicts() -> eyre::Result<()> {
        let ledger = setup_ledger(LedgerStrategy::Serializable).await;
        let first_ref = L1Reference::new(B256::repeat_byte(1), 100);
        let second_ref = L1Reference::new(B256::repeat_byte(2), 200);

        let mut first = ledger.begin().await?;
        let mut second = ledger.begin().await?;
        first.virtualize_batch(3, first_ref).await?;
        second.virtualize_batch(3, second_ref).await?;

        first.commit().await?;
        let err = second.commit().await.unwrap_err();
        assert!(matches!(err, LedgerError::BatchChanged(3)));
        assert!(err.can_retry());

        let batch = ledger.database().get_batch(3).await?.unwrap();
        assert_eq!(batch.status, BatchStatus::Virtualized);
        assert_eq!(batch.virtualized, Some(first_ref));

        // the retry observes the first virtualization.
        let mut second = ledger.begin().await?;
        assert!(matches!(
            second.virtualize_batch(3, second_ref).await,
            Err(LedgerError::InvalidStatusTransition { from: BatchStatus::Virtualized, .. })
        ));
        second.rollback().await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_serializable_reset_then_transition_conflicts() -> eyre::Result<()> {
        let ledger = setup_ledger(LedgerStrategy::Serializable).await;

        let mut synchronizer = ledger.begin().await?;
        synchronizer.reset_to(N - 1).await?;
        synchronizer.virtualize_batch(N - 1, L1Reference::default()).await?;

        let mut other = ledger.begin().await?;
        other.virtualize_batch(N - 1, L1Reference::new(B256::repeat_byte(3), 3)).await?;
        other.commit().await?;

        assert!(matches!(
            synchronizer.commit().await,
            Err(LedgerError::BatchChanged(n)) if n == N - 1
        ));
        assert_eq!(last_batch_number(&ledger).await, Some(N));
        Ok(())
    }

    #[tokio::test]
    async fn test_expect_batch() -> eyre::Result<()> {
        for strategy in LedgerStrategy::iter() {
            let ledger = setup_ledger(strategy).await;
            let stale = ledger.database().get_batch(N - 1).await?.unwrap();

            let mut tx = ledger.begin().await?;
            tx.expect_batch(&stale).await?;
            tx.virtualize_batch(N - 1, L1Reference::default()).await?;
            tx.commit().await?;

            let mut tx = ledger.begin().await?;
            assert!(matches!(
                tx.expect_batch(&stale).await,
                Err(LedgerError::BatchChanged(n)) if n == N - 1
            ));
            tx.rollback().await?;
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_serializable_expect_batch_revalidated_on_commit() -> eyre::Result<()> {
        let ledger = setup_ledger(LedgerStrategy::Serializable).await;
        let base = ledger.database().get_batch(N - 2).await?.unwrap();

        let mut tx = ledger.begin().await?;
        tx.expect_batch(&base).await?;
        tx.open_batch(open_batch(N + 1)).await?;

        let mut other = ledger.begin().await?;
        other.virtualize_batch(N - 2, L1Reference::default()).await?;
        other.commit().await?;

        assert!(matches!(tx.commit().await, Err(LedgerError::BatchChanged(n)) if n == N - 2));
        assert_eq!(last_batch_number(&ledger).await, Some(N));
        Ok(())
    }
}
