use parking_lot::RwLock;
use rollup_node_primitives::ForkIdInterval;
use zkevm_db::{DatabaseError, DatabaseOperations};

/// An error of the [`ForkIdCache`].
#[derive(Debug, thiserror::Error)]
pub enum ForkIdError {
    /// No interval covers the batch.
    #[error("no fork id for batch {0}")]
    NotFoundForBatch(u64),
    /// No fork was activated at or before the L1 block.
    #[error("no fork id activated at L1 block {0}")]
    NotFoundForBlock(u64),
    /// An interval ends before it starts.
    #[error("fork id {fork_id} has an empty interval [{from}, {to}]")]
    EmptyInterval {
        /// The fork id.
        fork_id: u64,
        /// The first batch.
        from: u64,
        /// The last batch.
        to: u64,
    },
    /// Two intervals overlap or are out of order.
    #[error("fork id {next} overlaps fork id {previous}")]
    Overlapping {
        /// The fork id of the earlier interval.
        previous: u64,
        /// The fork id of the later interval.
        next: u64,
    },
    /// The intervals could not be loaded or stored.
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// The in-memory view of the fork id intervals, loaded from the database.
///
/// The cache is an explicitly owned object, shared by `Arc` between its users. It is filled with
/// [`ForkIdCache::refresh`] at startup and after a protocol upgrade or a reorg.
#[derive(Debug, Default)]
pub struct ForkIdCache {
    intervals: RwLock<Vec<ForkIdInterval>>,
}

impl ForkIdCache {
    /// Returns a cache over the provided intervals, sorting and validating them.
    pub fn new(mut intervals: Vec<ForkIdInterval>) -> Result<Self, ForkIdError> {
        intervals.sort_by_key(|interval| interval.from_batch_number);
        validate(&intervals)?;
        Ok(Self { intervals: RwLock::new(intervals) })
    }

    /// Returns a cache loaded from the database.
    pub async fn load<D: DatabaseOperations>(db: &D) -> Result<Self, ForkIdError> {
        Self::new(db.get_fork_ids().await?)
    }

    /// Returns a copy of the cached intervals, ordered by batch number.
    pub fn intervals(&self) -> Vec<ForkIdInterval> {
        self.intervals.read().clone()
    }

    /// Returns the fork id active for the batch. Batch 0 resolves to the earliest interval.
    pub fn fork_id_by_batch_number(&self, batch_number: u64) -> Result<u64, ForkIdError> {
        let intervals = self.intervals.read();
        if batch_number == 0 {
            return intervals
                .first()
                .map(|interval| interval.fork_id)
                .ok_or(ForkIdError::NotFoundForBatch(batch_number))
        }

        // index of the first interval starting after the batch.
        let index = intervals.partition_point(|interval| interval.from_batch_number <= batch_number);
        index
            .checked_sub(1)
            .and_then(|i| intervals.get(i))
            .filter(|interval| interval.contains(batch_number))
            .map(|interval| interval.fork_id)
            .ok_or(ForkIdError::NotFoundForBatch(batch_number))
    }

    /// Returns the fork id of the latest fork activated at or before the L1 block.
    pub fn fork_id_by_block_number(&self, block_number: u64) -> Result<u64, ForkIdError> {
        self.intervals
            .read()
            .iter()
            .rev()
            .find(|interval| interval.block_number <= block_number)
            .map(|interval| interval.fork_id)
            .ok_or(ForkIdError::NotFoundForBlock(block_number))
    }

    /// Reloads the intervals from the database. The cache is left untouched on error.
    pub async fn refresh<D: DatabaseOperations>(&self, db: &D) -> Result<(), ForkIdError> {
        let mut intervals = db.get_fork_ids().await?;
        intervals.sort_by_key(|interval| interval.from_batch_number);
        validate(&intervals)?;

        tracing::debug!(target: "rollup_node::state", count = intervals.len(), last = ?intervals.last().map(|i| i.fork_id), "Refreshed fork ids");
        *self.intervals.write() = intervals;
        Ok(())
    }

    /// Clears the cache. Every lookup fails until the next [`ForkIdCache::refresh`].
    pub fn invalidate(&self) {
        self.intervals.write().clear();
    }

    /// Activates a new fork: the last interval is closed the batch before the new one starts, and
    /// both are persisted. Adding the currently active fork id again is a no-op.
    pub async fn add_interval<D: DatabaseOperations>(
        &self,
        db: &D,
        interval: ForkIdInterval,
    ) -> Result<(), ForkIdError> {
        let mut intervals = self.intervals();
        let mut closed = None;
        if let Some(last) = intervals.last_mut() {
            if last.fork_id == interval.fork_id {
                tracing::debug!(target: "rollup_node::state", fork_id = interval.fork_id, "Fork id already active");
                return Ok(())
            }
            if interval.from_batch_number <= last.from_batch_number {
                return Err(ForkIdError::Overlapping { previous: last.fork_id, next: interval.fork_id })
            }
            last.to_batch_number = interval.from_batch_number - 1;
            closed = Some(last.clone());
        }
        intervals.push(interval.clone());
        validate(&intervals)?;

        if let Some(closed) = closed {
            db.insert_fork_id(closed).await?;
        }
        db.insert_fork_id(interval.clone()).await?;

        tracing::info!(target: "rollup_node::state", fork_id = interval.fork_id, version = %interval.version, from_batch_number = interval.from_batch_number, "Activated fork id");
        *self.intervals.write() = intervals;
        Ok(())
    }
}

/// Checks sorted intervals are non-empty and do not overlap.
fn validate(intervals: &[ForkIdInterval]) -> Result<(), ForkIdError> {
    for interval in intervals {
        if interval.from_batch_number > interval.to_batch_number {
            return Err(ForkIdError::EmptyInterval {
                fork_id: interval.fork_id,
                from: interval.from_batch_number,
                to: interval.to_batch_number,
            })
        }
    }
    for pair in intervals.windows(2) {
        if pair[1].from_batch_number <= pair[0].to_batch_number {
            return Err(ForkIdError::Overlapping { previous: pair[0].fork_id, next: pair[1].fork_id })
        }
    }
    Ok(())
}
