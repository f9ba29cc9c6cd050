use crate::{
    events::{EventLog, EventRecord},
    metrics::MetricsHandler,
    response::convert_batch_response,
    ForkIdCache, ProcessBatchResponse, StateError,
};

use alloy_primitives::{Address, Bytes, B256};
use prost::Message;
use rollup_node_primitives::{
    calculate_acc_input_hash, AccInputHashInput, Batch, BatchConstraints, BatchResources,
    CallerLabel, EventComponent, EventId, EventLevel, MeteredFuture, ProcessingReceipt,
    ResourceOverflow, ZkCounter, FORK_ID_ETROG,
};
use std::sync::Arc;
use uuid::Uuid;
use zkevm_codec::Codec;
use zkevm_db::{BatchLedger, DatabaseOperations, RetryConfig};
use zkevm_executor::{
    ExecutionFailure, Executor, ProcessBatchRequest, ProcessBatchRequestV2, ProcessBatchResponseV2,
    RomError,
};

/// The configuration of the [`State`].
#[derive(Debug, Clone)]
pub struct StateConfig {
    /// The L2 chain id.
    pub chain_id: u64,
    /// The retry policy of the ledger operations.
    pub retry: RetryConfig,
}

impl StateConfig {
    /// Returns a new [`StateConfig`] for the chain, with the default retry policy.
    pub fn new(chain_id: u64) -> Self {
        Self { chain_id, retry: RetryConfig::default() }
    }
}

/// The outcome of [`State::try_append`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The candidate data was processed and stored as the new content of the open batch.
    Appended(ProcessBatchResponse),
    /// The candidate data does not fit in the batch. Nothing was stored.
    BatchFull {
        /// The exhausted resource.
        reason: BatchFullReason,
    },
}

/// The resource a batch ran out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum BatchFullReason {
    /// Too many transactions.
    #[display("transactions")]
    Transactions,
    /// A constrained resource.
    #[display("{_0}")]
    Resource(ResourceOverflow),
    /// The executor ran out of counters.
    #[display("executor {_0}")]
    OutOfCounters(RomError),
}

/// The state-transition core of the node: runs batches through the executor and keeps the batch
/// ledger consistent between the sequencer and the L1 synchronizer.
#[derive(Debug)]
pub struct State<E> {
    pub(crate) config: StateConfig,
    executor: E,
    pub(crate) ledger: BatchLedger,
    pub(crate) fork_ids: Arc<ForkIdCache>,
    pub(crate) events: EventLog,
    metrics: MetricsHandler,
}

/// A request in the executor interface of the fork of the batch.
#[derive(Debug, Clone)]
enum ExecutorRequest {
    /// Before etrog, carrying the global exit root.
    PreEtrog(ProcessBatchRequest),
    /// From etrog onward, carrying the L1 info root.
    Etrog(ProcessBatchRequestV2),
}

impl ExecutorRequest {
    fn context_id(&self) -> &str {
        match self {
            Self::PreEtrog(request) => &request.context_id,
            Self::Etrog(request) => &request.context_id,
        }
    }

    const fn fork_id(&self) -> u64 {
        match self {
            Self::PreEtrog(request) => request.fork_id,
            Self::Etrog(request) => request.fork_id,
        }
    }

    fn encode_to_vec(&self) -> Vec<u8> {
        match self {
            Self::PreEtrog(request) => request.encode_to_vec(),
            Self::Etrog(request) => request.encode_to_vec(),
        }
    }

    async fn send<E: Executor>(
        self,
        executor: &E,
    ) -> Result<ProcessBatchResponseV2, zkevm_executor::ExecutorClientError> {
        match self {
            Self::PreEtrog(request) => executor.process_batch(request).await.map(Into::into),
            Self::Etrog(request) => executor.process_batch_v2(request).await,
        }
    }
}

/// The inputs of an executor request.
struct ExecutionInput<'a> {
    batch_number: u64,
    fork_id: u64,
    previous: &'a Batch,
    coinbase: Address,
    global_exit_root: B256,
    timestamp: u64,
    batch_l2_data: Bytes,
    update_merkle_tree: bool,
}

impl<E: Executor> State<E> {
    /// Returns a new [`State`].
    pub fn new(
        config: StateConfig,
        executor: E,
        ledger: BatchLedger,
        fork_ids: Arc<ForkIdCache>,
        events: EventLog,
    ) -> Self {
        Self { config, executor, ledger, fork_ids, events, metrics: MetricsHandler::default() }
    }

    /// Returns the batch ledger.
    pub const fn ledger(&self) -> &BatchLedger {
        &self.ledger
    }

    /// Returns the fork id cache.
    pub const fn fork_ids(&self) -> &Arc<ForkIdCache> {
        &self.fork_ids
    }

    /// Processes the encoded transactions as the content of the latest batch, which must be open.
    ///
    /// The batch is executed on top of the roots of the previous batch and the executor writes the
    /// resulting state to the Merkle tree. ROM errors, out of counters included, are reported in
    /// the response. Executor errors fail the call.
    pub async fn process_batch(
        &self,
        batch_number: u64,
        encoded_txs: Bytes,
        caller: CallerLabel,
    ) -> Result<ProcessBatchResponse, StateError> {
        self.process_open_batch(batch_number, encoded_txs, caller).await.map(|(_, response)| response)
    }

    /// Processes the latest batch, returning it as read alongside the response.
    async fn process_open_batch(
        &self,
        batch_number: u64,
        encoded_txs: Bytes,
        caller: CallerLabel,
    ) -> Result<(Batch, ProcessBatchResponse), StateError> {
        let fork_id = self.fork_ids.fork_id_by_batch_number(batch_number)?;

        let batches = self.ledger.database().get_last_n_batches(2).await?;
        let latest = batches.first().ok_or(StateError::BatchNotFound(batch_number))?;
        if latest.batch_number != batch_number {
            return Err(StateError::InvalidBatchNumber {
                expected: latest.batch_number,
                got: batch_number,
            })
        }
        if !latest.is_open() {
            return Err(StateError::BatchAlreadyClosed(batch_number))
        }
        let previous = batches.get(1).unwrap_or(latest);

        let request = self.build_request(ExecutionInput {
            batch_number,
            fork_id,
            previous,
            coinbase: latest.coinbase,
            global_exit_root: latest.global_exit_root,
            timestamp: latest.timestamp,
            batch_l2_data: encoded_txs,
            update_merkle_tree: true,
        });
        let response = self.send_request(batch_number, request, caller).await?;
        Ok((latest.clone(), response))
    }

    /// Executes a stored batch on top of the roots of its predecessor.
    pub async fn execute_batch(
        &self,
        batch: &Batch,
        update_merkle_tree: bool,
        caller: CallerLabel,
    ) -> Result<ProcessBatchResponse, StateError> {
        let fork_id = self.fork_ids.fork_id_by_batch_number(batch.batch_number)?;
        let previous_number =
            batch.batch_number.checked_sub(1).ok_or(StateError::BatchNotFound(0))?;
        let previous = self
            .ledger
            .database()
            .get_batch(previous_number)
            .await?
            .ok_or(StateError::BatchNotFound(previous_number))?;

        let request = self.build_request(ExecutionInput {
            batch_number: batch.batch_number,
            fork_id,
            previous: &previous,
            coinbase: batch.coinbase,
            global_exit_root: batch.global_exit_root,
            timestamp: batch.timestamp,
            batch_l2_data: batch.batch_l2_data.clone(),
            update_merkle_tree,
        });
        self.send_request(batch.batch_number, request, caller).await
    }

    /// Processes the candidate data of the open batch and stores it as the batch content if it
    /// fits the constraints. The candidate holds every transaction of the batch, the previously
    /// appended ones included.
    ///
    /// If the open batch was updated by another writer while the candidate was processed, nothing
    /// is stored and [`LedgerError::BatchChanged`](zkevm_db::LedgerError::BatchChanged) is
    /// returned. The caller processes the candidate again.
    pub async fn try_append(
        &self,
        batch_number: u64,
        candidate_l2_data: Bytes,
        constraints: &BatchConstraints,
        caller: CallerLabel,
    ) -> Result<AppendOutcome, StateError> {
        let fork_id = self.fork_ids.fork_id_by_batch_number(batch_number)?;
        let payload = Codec::for_fork_id(fork_id).decode(&candidate_l2_data)?;
        if payload.transactions_count() as u64 > constraints.max_txs_per_batch {
            return Ok(AppendOutcome::BatchFull { reason: BatchFullReason::Transactions })
        }
        let bytes = candidate_l2_data.len() as u64;
        if bytes > constraints.max_batch_bytes_size {
            return Ok(batch_full(ResourceOverflow::Bytes))
        }

        let (base, response) =
            self.process_open_batch(batch_number, candidate_l2_data.clone(), caller).await?;
        if let Some(ExecutionFailure::OutOfCounters(err)) = response.error {
            tracing::debug!(target: "rollup_node::state", batch_number, %err, "Batch out of counters");
            return Ok(AppendOutcome::BatchFull { reason: BatchFullReason::OutOfCounters(err) })
        }
        if let Some(counter) = first_exceeded(&response, constraints) {
            tracing::debug!(target: "rollup_node::state", batch_number, %counter, "Batch counters above constraints");
            return Ok(batch_full(ResourceOverflow::Counter(counter)))
        }

        let receipt = ProcessingReceipt {
            batch_number,
            state_root: response.new_state_root,
            local_exit_root: response.new_local_exit_root,
            acc_input_hash: response.new_acc_input_hash,
            batch_l2_data: candidate_l2_data,
            resources: BatchResources { zk_counters: response.used_counters, bytes },
        };
        self.update_processed_wip_batch(base, receipt).await?;
        Ok(AppendOutcome::Appended(response))
    }

    /// Recomputes the accumulated input hash of the batch from its predecessor and checks it
    /// matches the stored one. Returns the recomputed value.
    pub async fn verify_acc_input_hash(&self, batch_number: u64) -> Result<B256, StateError> {
        let db = self.ledger.database();
        let batch = db.get_batch(batch_number).await?.ok_or(StateError::BatchNotFound(batch_number))?;
        let previous_number = batch_number.checked_sub(1).ok_or(StateError::BatchNotFound(0))?;
        let previous =
            db.get_batch(previous_number).await?.ok_or(StateError::BatchNotFound(previous_number))?;
        let fork_id = self.fork_ids.fork_id_by_batch_number(batch_number)?;

        let computed = calculate_acc_input_hash(
            fork_id,
            &AccInputHashInput {
                old_acc_input_hash: previous.acc_input_hash,
                batch_l2_data: &batch.batch_l2_data,
                global_exit_root: batch.global_exit_root,
                timestamp: batch.timestamp,
                sequencer: batch.coinbase,
                forced_block_hash_l1: B256::ZERO,
            },
        );
        if computed != batch.acc_input_hash {
            tracing::error!(target: "rollup_node::state", batch_number, stored = %batch.acc_input_hash, %computed, "Acc input hash mismatch");
            self.events
                .log(
                    EventRecord::new(
                        EventComponent::State,
                        EventLevel::Critical,
                        EventId::AccInputHashMismatch,
                        format!("stored {}, computed {computed}", batch.acc_input_hash),
                    )
                    .with_batch_number(batch_number),
                )
                .await;
            return Err(StateError::AccInputHashMismatch {
                batch_number,
                stored: batch.acc_input_hash,
                computed,
            })
        }
        Ok(computed)
    }

    fn build_request(&self, input: ExecutionInput<'_>) -> ExecutorRequest {
        let old_batch_num = input.batch_number.saturating_sub(1);
        let context_id = Uuid::new_v4().to_string();
        if input.fork_id < FORK_ID_ETROG {
            return ExecutorRequest::PreEtrog(ProcessBatchRequest {
                old_batch_num,
                old_state_root: input.previous.state_root.to_vec(),
                old_acc_input_hash: input.previous.acc_input_hash.to_vec(),
                coinbase: input.coinbase.to_string(),
                batch_l2_data: input.batch_l2_data.to_vec(),
                global_exit_root: input.global_exit_root.to_vec(),
                eth_timestamp: input.timestamp,
                update_merkle_tree: input.update_merkle_tree.into(),
                chain_id: self.config.chain_id,
                fork_id: input.fork_id,
                context_id,
                ..Default::default()
            })
        }

        ExecutorRequest::Etrog(ProcessBatchRequestV2 {
            old_batch_num,
            old_state_root: input.previous.state_root.to_vec(),
            old_acc_input_hash: input.previous.acc_input_hash.to_vec(),
            coinbase: input.coinbase.to_string(),
            batch_l2_data: input.batch_l2_data.to_vec(),
            // the L1 info root, stored as the global exit root of etrog batches.
            l1_info_root: input.global_exit_root.to_vec(),
            timestamp_limit: input.timestamp,
            update_merkle_tree: input.update_merkle_tree.into(),
            chain_id: self.config.chain_id,
            fork_id: input.fork_id,
            context_id,
            ..Default::default()
        })
    }

    async fn send_request(
        &self,
        batch_number: u64,
        request: ExecutorRequest,
        caller: CallerLabel,
    ) -> Result<ProcessBatchResponse, StateError> {
        let fork_id = request.fork_id();
        let context_id = request.context_id().to_owned();
        let metrics = self.metrics.get(caller);

        let (elapsed, result) =
            MeteredFuture::new(Box::pin(request.clone().send(&self.executor))).await;
        if let Some(metrics) = metrics {
            metrics.process_batch_duration.record(elapsed.as_secs_f64());
        }
        tracing::info!(target: "rollup_node::state", batch_number, fork_id, caller = caller.as_str(), %context_id, ?elapsed, "Executor processed batch");

        let response = result.inspect_err(|err| {
            tracing::error!(target: "rollup_node::state", batch_number, %context_id, %err, "Executor call failed");
        })?;

        match ExecutionFailure::classify(response.executor_error(), response.rom_error()) {
            Some(ExecutionFailure::Executor(error)) => {
                tracing::error!(target: "rollup_node::state", batch_number, %context_id, %error, "Executor error");
                if let Some(metrics) = metrics {
                    metrics.executor_errors.increment(1);
                }
                self.events
                    .log(
                        EventRecord::new(
                            EventComponent::Executor,
                            EventLevel::Error,
                            EventId::ExecutorError,
                            format!("{error}, context id {context_id}"),
                        )
                        .with_batch_number(batch_number)
                        .with_data(request.encode_to_vec()),
                    )
                    .await;
                return Err(StateError::Executor { batch_number, error })
            }
            Some(failure) => {
                tracing::warn!(target: "rollup_node::state", batch_number, %context_id, %failure, "Batch processed with rom error");
                if let Some(metrics) = metrics {
                    match failure {
                        ExecutionFailure::OutOfCounters(_) => metrics.out_of_counters.increment(1),
                        _ => metrics.rom_errors.increment(1),
                    }
                }
            }
            None => {}
        }

        let (response, undecoded) = convert_batch_response(response)?;
        for tx in undecoded {
            tracing::warn!(target: "rollup_node::state", batch_number, tx_hash = %tx.tx_hash, rom_error = ?tx.rom_error, error = %tx.error, "Failed to decode transaction");
            self.events
                .log(
                    EventRecord::new(
                        EventComponent::State,
                        EventLevel::Warning,
                        EventId::TransactionDecodingFailed,
                        format!(
                            "block {} tx {} ({}): {}",
                            tx.block_index, tx.tx_index, tx.tx_hash, tx.error
                        ),
                    )
                    .with_batch_number(batch_number),
                )
                .await;

            if tx.is_expected() {
                return Err(StateError::TransactionDecoding {
                    batch_number,
                    tx_hash: tx.tx_hash,
                    source: tx.error,
                })
            }
        }

        Ok(response)
    }
}

const fn batch_full(resource: ResourceOverflow) -> AppendOutcome {
    AppendOutcome::BatchFull { reason: BatchFullReason::Resource(resource) }
}

/// Returns the first used, then reserved, counter above the constraints.
fn first_exceeded(
    response: &ProcessBatchResponse,
    constraints: &BatchConstraints,
) -> Option<ZkCounter> {
    response
        .used_counters
        .first_exceeded(constraints)
        .or_else(|| response.reserved_counters.first_exceeded(constraints))
}
