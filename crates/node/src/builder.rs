use crate::RollupNodeArgs;

use rollup_node_primitives::BatchConstraints;
use rollup_node_state::{EventLog, ForkIdCache, State};
use std::sync::Arc;
use zkevm_db::{BatchLedger, Database, DatabaseConnectionProvider};
use zkevm_executor::{Executor, GrpcExecutorClient, ResourceExhaustedRetry};
use zkevm_merkle_tree::{GrpcHashDbClient, HashDb, StateTree};
use zkevm_migration::{Migrator, MigratorTrait};

/// The source recorded on the events emitted by the node.
const EVENT_SOURCE: &str = "node";

/// The executor of a node connected to the remote services.
pub type RemoteExecutor = ResourceExhaustedRetry<GrpcExecutorClient>;

/// The components of the state-transition core, wired and ready to process batches.
#[derive(Debug)]
pub struct RollupNode<E, H> {
    /// The state.
    pub state: Arc<State<E>>,
    /// The read access to the state tree.
    pub state_tree: StateTree<H>,
    /// The maximum resources of a batch.
    pub constraints: BatchConstraints,
    /// The database.
    pub database: Arc<Database>,
}

impl RollupNodeArgs {
    /// Connects to the database and the remote services, then builds the [`RollupNode`]. Failing
    /// to reach any of them before its dial timeout elapses is fatal.
    pub async fn build(self) -> eyre::Result<RollupNode<RemoteExecutor, GrpcHashDbClient>> {
        tracing::info!(target: "rollup_node::builder", "Building rollup node with config:\n{:#?}", self);

        let database = self.connect_database().await?;

        let executor = GrpcExecutorClient::connect(&self.executor_args.client_config())
            .await
            .inspect_err(|err| {
                tracing::error!(target: "rollup_node::builder", %err, "failed to dial the executor")
            })?;
        let executor = ResourceExhaustedRetry::with_policy(
            executor,
            self.executor_args.max_attempts,
            self.executor_args.retry_delay(),
        );

        let hash_db = GrpcHashDbClient::connect(&self.merkle_tree_args.client_config())
            .await
            .inspect_err(|err| {
                tracing::error!(target: "rollup_node::builder", %err, "failed to dial the hash db")
            })?;

        self.build_with(database, executor, hash_db).await
    }

    /// Builds the [`RollupNode`] over the provided database, executor and hash db.
    pub async fn build_with<E: Executor, H: HashDb>(
        self,
        database: Arc<Database>,
        executor: E,
        hash_db: H,
    ) -> eyre::Result<RollupNode<E, H>> {
        let fork_ids = ForkIdCache::load(database.as_ref()).await?;
        match fork_ids.intervals().last() {
            Some(latest) => {
                tracing::info!(target: "rollup_node::builder", fork_id = latest.fork_id, from = latest.from_batch_number, "Loaded fork ids")
            }
            None => tracing::warn!(target: "rollup_node::builder", "No fork id interval stored"),
        }

        let ledger = BatchLedger::new(database.clone(), self.database_args.ledger_strategy);
        let events = EventLog::new(database.clone(), EVENT_SOURCE);
        let state = State::new(
            self.state_args.state_config(),
            executor,
            ledger,
            Arc::new(fork_ids),
            events,
        );

        Ok(RollupNode {
            state: Arc::new(state),
            state_tree: StateTree::new(hash_db),
            constraints: (&self.batch_constraints_args).into(),
            database,
        })
    }

    /// Connects to the database and runs the pending migrations.
    pub async fn connect_database(&self) -> eyre::Result<Arc<Database>> {
        let args = &self.database_args;
        let database = Database::with_max_connections(&args.url, args.max_connections).await?;
        Migrator::up(database.get_connection(), None).await?;

        tracing::info!(target: "rollup_node::builder", url = %args.url, strategy = %args.ledger_strategy, "Connected to the database");
        Ok(Arc::new(database))
    }
}
