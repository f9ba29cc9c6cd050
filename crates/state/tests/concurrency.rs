//! A sequencer appending to the open batch while the L1 synchronizer resets the ledger below it.

use alloy_primitives::{Address, Bytes, B256};
use rollup_node_primitives::{
    Batch, BatchConstraints, BatchStatus, CallerLabel, ForkIdInterval, FORK_ID_ETROG,
};
use rollup_node_state::{AppendOutcome, EventLog, ForkIdCache, State, StateConfig, StateError};
use std::{sync::Arc, time::Duration};
use zkevm_db::{
    test_utils::setup_test_db, BatchLedger, Database, DatabaseOperations, LedgerError,
    LedgerStrategy,
};
use zkevm_executor::test_utils::MockExecutor;

/// The open batch of the sequencer.
const OPEN: u64 = 3;

/// Empty L2 block: a header without transactions.
const EMPTY_BLOCK: [u8; 9] = [0x0b, 0, 0, 0, 1, 0, 0, 0, 0];

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

async fn setup(strategy: LedgerStrategy) -> eyre::Result<(Arc<State<MockExecutor>>, Arc<Database>)> {
    let _ = tracing_subscriber::fmt().with_env_filter("rollup_node=trace,zkevm=trace").try_init();

    let db = Arc::new(setup_test_db().await);
    db.insert_fork_id(ForkIdInterval::new(1, u64::MAX, FORK_ID_ETROG, "v7", 1)).await?;
    for batch_number in 0..OPEN {
        db.insert_batch(batch(batch_number, BatchStatus::Closed)).await?;
    }
    db.insert_batch(batch(OPEN, BatchStatus::Open)).await?;

    let state = State::new(
        StateConfig::new(1001),
        MockExecutor::default(),
        BatchLedger::new(db.clone(), strategy),
        Arc::new(ForkIdCache::load(db.as_ref()).await?),
        EventLog::new(db.clone(), "test"),
    );
    Ok((Arc::new(state), db))
}

fn candidate() -> Bytes {
    Bytes::from([EMPTY_BLOCK, EMPTY_BLOCK].concat())
}

async fn assert_no_duplicates(db: &Database) -> eyre::Result<()> {
    let batches = db.get_last_n_batches(100).await?;
    let mut numbers = batches.iter().map(|b| b.batch_number).collect::<Vec<_>>();
    numbers.dedup();
    assert_eq!(numbers.len(), batches.len());
    Ok(())
}

#[tokio::test]
async fn test_serializable_append_then_reorg() -> eyre::Result<()> {
    let (state, db) = setup(LedgerStrategy::Serializable).await?;

    // the synchronizer reads the ledger before the sequencer appends.
    let mut reorg = state.ledger().begin().await?;
    reorg.reset_to(1).await?;

    let outcome = state
        .try_append(OPEN, candidate(), &BatchConstraints::default(), CallerLabel::Sequencer)
        .await?;
    assert!(matches!(outcome, AppendOutcome::Appended(_)));

    // the stale reorg loses and retries from a fresh read.
    assert!(matches!(reorg.commit().await, Err(LedgerError::Conflict { .. })));
    state.reset_to_batch(1).await?;

    assert_eq!(db.get_last_batch_number().await?, Some(1));
    assert_no_duplicates(&db).await
}

#[tokio::test]
async fn test_serializable_reorg_then_append() -> eyre::Result<()> {
    let (state, db) = setup(LedgerStrategy::Serializable).await?;

    state.reset_to_batch(1).await?;

    let res = state
        .try_append(OPEN, candidate(), &BatchConstraints::default(), CallerLabel::Sequencer)
        .await;
    assert!(matches!(res, Err(StateError::InvalidBatchNumber { expected: 1, got: OPEN })));

    assert_eq!(db.get_last_batch_number().await?, Some(1));
    assert_no_duplicates(&db).await
}

#[tokio::test]
async fn test_row_lock_reorg_blocks_append() -> eyre::Result<()> {
    let (state, db) = setup(LedgerStrategy::RowLock).await?;

    // the synchronizer holds the lock on the latest batch.
    let mut reorg = state.ledger().begin().await?;
    reorg.reset_to(1).await?;

    let sequencer = state.clone();
    let append = tokio::spawn(async move {
        sequencer
            .try_append(OPEN, candidate(), &BatchConstraints::default(), CallerLabel::Sequencer)
            .await
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!append.is_finished());
    reorg.commit().await?;

    // the sequencer reads the state left by the synchronizer.
    let res = append.await?;
    assert!(matches!(res, Err(StateError::InvalidBatchNumber { expected: 1, got: OPEN })));

    assert_eq!(db.get_last_batch_number().await?, Some(1));
    assert_no_duplicates(&db).await
}

#[tokio::test]
async fn test_row_lock_append_then_reorg() -> eyre::Result<()> {
    let (state, db) = setup(LedgerStrategy::RowLock).await?;

    let outcome = state
        .try_append(OPEN, candidate(), &BatchConstraints::default(), CallerLabel::Sequencer)
        .await?;
    assert!(matches!(outcome, AppendOutcome::Appended(_)));
    let stored = db.get_batch(OPEN).await?.map(|b| b.batch_l2_data);
    assert_eq!(stored, Some(candidate()));

    state.reset_to_batch(1).await?;

    assert_eq!(db.get_last_batch_number().await?, Some(1));
    assert!(db.get_batch(OPEN).await?.is_none());
    assert_no_duplicates(&db).await
}
