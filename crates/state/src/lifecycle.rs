//! Batch lifecycle transitions, committed through the ledger.
//!
//! Transitions derived from the ledger alone are retried on conflicts from a fresh read. Writes of
//! a [`ProcessingReceipt`] are applied once: the receipt was computed by the executor against an
//! earlier read, so a conflict is returned to the caller, who processes the batch again.

use crate::{State, StateError};

use rollup_node_primitives::{Batch, L1Reference, ProcessingReceipt};
use zkevm_db::{retry_operation_with_name, LedgerError, LedgerTx};
use zkevm_executor::Executor;

/// A write to the batch ledger, applied in its own unit of work.
#[derive(Debug, Clone)]
enum LedgerOperation {
    Open(Batch),
    /// The receipt, and the open batch it was processed on when known.
    UpdateWip(ProcessingReceipt, Option<Batch>),
    Close(ProcessingReceipt),
    Virtualize(u64, L1Reference),
    Consolidate(u64, L1Reference),
    ResetTo(u64),
}

impl LedgerOperation {
    const fn name(&self) -> &'static str {
        match self {
            Self::Open(_) => "open_batch",
            Self::UpdateWip(..) => "update_wip_batch",
            Self::Close(_) => "close_batch",
            Self::Virtualize(..) => "virtualize_batch",
            Self::Consolidate(..) => "consolidate_batch",
            Self::ResetTo(_) => "reset_to_batch",
        }
    }

    const fn carries_receipt(&self) -> bool {
        matches!(self, Self::UpdateWip(..) | Self::Close(_))
    }

    async fn apply(&self, tx: &mut LedgerTx) -> Result<(), LedgerError> {
        match self {
            Self::Open(batch) => tx.open_batch(batch.clone()).await,
            Self::UpdateWip(receipt, base) => {
                if let Some(base) = base {
                    tx.expect_batch(base).await?;
                }
                tx.update_wip_batch(receipt).await
            }
            Self::Close(receipt) => tx.close_batch(receipt).await,
            Self::Virtualize(batch_number, reference) => {
                tx.virtualize_batch(*batch_number, *reference).await
            }
            Self::Consolidate(batch_number, reference) => {
                tx.consolidate_batch(*batch_number, *reference).await
            }
            Self::ResetTo(batch_number) => tx.reset_to(*batch_number).await,
        }
    }
}

impl<E: Executor> State<E> {
    /// Opens a new batch on top of the latest one, which must be closed.
    pub async fn open_batch(&self, batch: Batch) -> Result<(), StateError> {
        self.run(LedgerOperation::Open(batch)).await
    }

    /// Stores the processed content of the open batch. Conflicts are not retried.
    pub async fn update_wip_batch(&self, receipt: ProcessingReceipt) -> Result<(), StateError> {
        self.run(LedgerOperation::UpdateWip(receipt, None)).await
    }

    /// Stores the processed content of the open batch if it is still stored as `base`, the batch
    /// the receipt was processed on. Returns [`LedgerError::BatchChanged`] otherwise.
    pub(crate) async fn update_processed_wip_batch(
        &self,
        base: Batch,
        receipt: ProcessingReceipt,
    ) -> Result<(), StateError> {
        self.run(LedgerOperation::UpdateWip(receipt, Some(base))).await
    }

    /// Closes the open batch with its final content. Conflicts are not retried.
    pub async fn close_batch(&self, receipt: ProcessingReceipt) -> Result<(), StateError> {
        self.run(LedgerOperation::Close(receipt)).await
    }

    /// Marks the batch as sequenced on L1.
    pub async fn virtualize_batch(
        &self,
        batch_number: u64,
        reference: L1Reference,
    ) -> Result<(), StateError> {
        self.run(LedgerOperation::Virtualize(batch_number, reference)).await
    }

    /// Marks the batch as proven on L1.
    pub async fn consolidate_batch(
        &self,
        batch_number: u64,
        reference: L1Reference,
    ) -> Result<(), StateError> {
        self.run(LedgerOperation::Consolidate(batch_number, reference)).await
    }

    /// Deletes every batch above the provided one, then reloads the fork ids.
    pub async fn reset_to_batch(&self, batch_number: u64) -> Result<(), StateError> {
        self.run(LedgerOperation::ResetTo(batch_number)).await?;
        self.fork_ids.refresh(self.ledger.database().as_ref()).await?;
        Ok(())
    }

    async fn run(&self, operation: LedgerOperation) -> Result<(), StateError> {
        if operation.carries_receipt() {
            return self.apply_once(&operation).await.map_err(Into::into)
        }
        retry_operation_with_name(operation.name(), &self.config.retry, || {
            self.apply_once(&operation)
        })
        .await
        .map_err(Into::into)
    }

    async fn apply_once(&self, operation: &LedgerOperation) -> Result<(), LedgerError> {
        let mut tx = self.ledger.begin().await?;
        if let Err(err) = operation.apply(&mut tx).await {
            tx.rollback().await?;
            return Err(err)
        }
        tx.commit().await?;

        tracing::trace!(target: "rollup_node::state", operation = operation.name(), "Committed ledger operation");
        Ok(())
    }
}
