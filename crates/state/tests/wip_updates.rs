//! Two writers storing the content of the same open batch.

use alloy_primitives::{Address, Bytes, B256};
use parking_lot::Mutex;
use rollup_node_primitives::{
    Batch, BatchConstraints, BatchResources, BatchStatus, CallerLabel, ForkIdInterval,
    ProcessingReceipt, FORK_ID_ETROG,
};
use rollup_node_state::{AppendOutcome, EventLog, ForkIdCache, State, StateConfig, StateError};
use std::sync::Arc;
use zkevm_db::{
    test_utils::setup_test_db, BatchLedger, Database, DatabaseOperations, LedgerError,
    LedgerStrategy,
};
use zkevm_executor::{
    test_utils::MockExecutor, Executor, ExecutorClientError, ProcessBatchRequest,
    ProcessBatchRequestV2, ProcessBatchResponse, ProcessBatchResponseV2,
};

const OPEN: u64 = 2;

const EMPTY_BLOCK: [u8; 9] = [0x0b, 0, 0, 0, 1, 0, 0, 0, 0];

/// An executor which lets another writer store its own content of the open batch while the
/// request is processed.
#[derive(Debug)]
struct InterleavingExecutor {
    ledger: BatchLedger,
    other_writer: Mutex<Option<ProcessingReceipt>>,
    inner: MockExecutor,
}

#[async_trait::async_trait]
impl Executor for InterleavingExecutor {
    async fn process_batch(
        &self,
        request: ProcessBatchRequest,
    ) -> Result<ProcessBatchResponse, ExecutorClientError> {
        self.inner.process_batch(request).await
    }

    async fn process_batch_v2(
        &self,
        request: ProcessBatchRequestV2,
    ) -> Result<ProcessBatchResponseV2, ExecutorClientError> {
        let receipt = self.other_writer.lock().take();
        if let Some(receipt) = receipt {
            let mut tx = self.ledger.begin().await.expect("begin");
            tx.update_wip_batch(&receipt).await.expect("update");
            tx.commit().await.expect("commit");
        }
        self.inner.process_batch_v2(request).await
    }
}

fn batch(batch_number: u64, status: BatchStatus) -> Batch {
    let mut batch = Batch::new_open(
        batch_number,
        Address::repeat_byte(0xaa),
        B256::repeat_byte(batch_number as u8),
        1_700_000_000 + batch_number,
        B256::repeat_byte(0x10 + batch_number as u8),
        B256::repeat_byte(0x20 + batch_number as u8),
    );
    if status != BatchStatus::Open {
        batch.batch_l2_data = Bytes::from_static(&EMPTY_BLOCK);
    }
    batch.status = status;
    batch
}

fn other_receipt() -> ProcessingReceipt {
    ProcessingReceipt {
        batch_number: OPEN,
        state_root: B256::repeat_byte(0x66),
        local_exit_root: B256::ZERO,
        acc_input_hash: B256::repeat_byte(0x67),
        batch_l2_data: Bytes::from_static(&EMPTY_BLOCK),
        resources: BatchResources { bytes: EMPTY_BLOCK.len() as u64, ..Default::default() },
    }
}

fn candidate() -> Bytes {
    Bytes::from([EMPTY_BLOCK, EMPTY_BLOCK].concat())
}

async fn setup(
    strategy: LedgerStrategy,
) -> eyre::Result<(State<Arc<InterleavingExecutor>>, Arc<InterleavingExecutor>, Arc<Database>)> {
    let db = Arc::new(setup_test_db().await);
    db.insert_fork_id(ForkIdInterval::new(1, u64::MAX, FORK_ID_ETROG, "v7", 1)).await?;
    for batch_number in 0..OPEN {
        db.insert_batch(batch(batch_number, BatchStatus::Closed)).await?;
    }
    db.insert_batch(batch(OPEN, BatchStatus::Open)).await?;

    let ledger = BatchLedger::new(db.clone(), strategy);
    let executor = Arc::new(InterleavingExecutor {
        ledger: ledger.clone(),
        other_writer: Mutex::new(Some(other_receipt())),
        inner: MockExecutor::default(),
    });
    let state = State::new(
        StateConfig::new(1001),
        executor.clone(),
        ledger,
        Arc::new(ForkIdCache::load(db.as_ref()).await?),
        EventLog::noop(),
    );
    Ok((state, executor, db))
}

#[tokio::test]
async fn test_stale_append_is_rejected() -> eyre::Result<()> {
    for strategy in [LedgerStrategy::Serializable, LedgerStrategy::RowLock] {
        let (state, executor, db) = setup(strategy).await?;
        let constraints = BatchConstraints::default();

        let res = state.try_append(OPEN, candidate(), &constraints, CallerLabel::Sequencer).await;
        let Err(StateError::Ledger(err)) = &res else { eyre::bail!("{strategy}: {res:?}") };
        assert!(matches!(err, LedgerError::BatchChanged(OPEN)), "{strategy}: {err}");

        // the content of the other writer is kept.
        let stored = db.get_batch(OPEN).await?.ok_or_else(|| eyre::eyre!("missing batch"))?;
        assert_eq!(stored.batch_l2_data, other_receipt().batch_l2_data);
        assert_eq!(stored.state_root, other_receipt().state_root);

        // processing the candidate again on the fresh content succeeds.
        let outcome =
            state.try_append(OPEN, candidate(), &constraints, CallerLabel::Sequencer).await?;
        assert!(matches!(outcome, AppendOutcome::Appended(_)));
        assert_eq!(executor.inner.requests().len(), 2);

        let stored = db.get_batch(OPEN).await?.ok_or_else(|| eyre::eyre!("missing batch"))?;
        assert_eq!(stored.batch_l2_data, candidate());
    }
    Ok(())
}
