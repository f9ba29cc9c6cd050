use crate::constants;

use std::time::Duration;

use rollup_node_primitives::BatchConstraints;
use rollup_node_state::StateConfig;
use zkevm_db::{LedgerStrategy, RetryConfig};
use zkevm_executor::ExecutorClientConfig;
use zkevm_merkle_tree::HashDbClientConfig;

/// The arguments of the rollup node state-transition core.
#[derive(Debug, Clone, clap::Args)]
pub struct RollupNodeArgs {
    /// Database args.
    #[command(flatten)]
    pub database_args: DatabaseArgs,
    /// Executor args.
    #[command(flatten)]
    pub executor_args: ExecutorArgs,
    /// Merkle tree args.
    #[command(flatten)]
    pub merkle_tree_args: MerkleTreeArgs,
    /// State args.
    #[command(flatten)]
    pub state_args: StateArgs,
    /// Batch constraints args.
    #[command(flatten)]
    pub batch_constraints_args: BatchConstraintsArgs,
}

/// The database arguments.
#[derive(Debug, Clone, clap::Args)]
pub struct DatabaseArgs {
    /// The URL of the database.
    #[arg(
        long = "db.url",
        id = "db_url",
        value_name = "DB_URL",
        default_value = constants::DEFAULT_DATABASE_URL
    )]
    pub url: String,
    /// The maximum number of pooled connections.
    #[arg(long = "db.max-connections", id = "db_max_connections", value_name = "DB_MAX_CONNECTIONS")]
    pub max_connections: Option<u32>,
    /// The concurrency discipline of the batch ledger: "serializable" or "row-lock".
    #[arg(
        long = "db.ledger-strategy",
        id = "db_ledger_strategy",
        value_name = "STRATEGY",
        default_value_t = LedgerStrategy::Serializable
    )]
    pub ledger_strategy: LedgerStrategy,
}

impl Default for DatabaseArgs {
    fn default() -> Self {
        Self {
            url: constants::DEFAULT_DATABASE_URL.to_string(),
            max_connections: None,
            ledger_strategy: LedgerStrategy::default(),
        }
    }
}

/// The executor arguments.
#[derive(Debug, Clone, clap::Args)]
pub struct ExecutorArgs {
    /// The URI of the executor service.
    #[arg(
        long = "executor.uri",
        id = "executor_uri",
        value_name = "EXECUTOR_URI",
        default_value = constants::DEFAULT_EXECUTOR_URI
    )]
    pub uri: String,
    /// The maximum size of a gRPC message exchanged with the executor, in bytes.
    #[arg(long = "executor.max-grpc-message-size", id = "executor_max_grpc_message_size", value_name = "BYTES", default_value_t = constants::DEFAULT_MAX_GRPC_MESSAGE_SIZE)]
    pub max_grpc_message_size: usize,
    /// How long to keep dialing the executor at startup, in seconds.
    #[arg(long = "executor.dial-timeout", id = "executor_dial_timeout", value_name = "SECONDS", default_value_t = constants::DEFAULT_DIAL_TIMEOUT_SECS)]
    pub dial_timeout: u64,
    /// The maximum number of calls per request refused for lack of executor resources.
    #[arg(long = "executor.max-attempts", id = "executor_max_attempts", value_name = "ATTEMPTS", default_value_t = constants::DEFAULT_EXECUTOR_MAX_ATTEMPTS)]
    pub max_attempts: usize,
    /// The delay between two calls refused for lack of executor resources, in milliseconds.
    #[arg(long = "executor.retry-delay", id = "executor_retry_delay", value_name = "MILLISECONDS", default_value_t = constants::DEFAULT_EXECUTOR_RETRY_DELAY_MS)]
    pub retry_delay: u64,
}

impl Default for ExecutorArgs {
    fn default() -> Self {
        Self {
            uri: constants::DEFAULT_EXECUTOR_URI.to_string(),
            max_grpc_message_size: constants::DEFAULT_MAX_GRPC_MESSAGE_SIZE,
            dial_timeout: constants::DEFAULT_DIAL_TIMEOUT_SECS,
            max_attempts: constants::DEFAULT_EXECUTOR_MAX_ATTEMPTS,
            retry_delay: constants::DEFAULT_EXECUTOR_RETRY_DELAY_MS,
        }
    }
}

impl ExecutorArgs {
    /// Returns the configuration of the executor client.
    pub fn client_config(&self) -> ExecutorClientConfig {
        ExecutorClientConfig {
            uri: self.uri.clone(),
            max_grpc_message_size: self.max_grpc_message_size,
            dial_timeout: Duration::from_secs(self.dial_timeout),
        }
    }

    /// Returns the delay between two calls refused for lack of resources.
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay)
    }
}

/// The Merkle tree arguments.
#[derive(Debug, Clone, clap::Args)]
pub struct MerkleTreeArgs {
    /// The URI of the hash db service.
    #[arg(
        long = "merkle-tree.uri",
        id = "merkle_tree_uri",
        value_name = "MERKLE_TREE_URI",
        default_value = constants::DEFAULT_HASH_DB_URI
    )]
    pub uri: String,
    /// How long to keep dialing the hash db at startup, in seconds.
    #[arg(long = "merkle-tree.dial-timeout", id = "merkle_tree_dial_timeout", value_name = "SECONDS", default_value_t = constants::DEFAULT_DIAL_TIMEOUT_SECS)]
    pub dial_timeout: u64,
}

impl Default for MerkleTreeArgs {
    fn default() -> Self {
        Self {
            uri: constants::DEFAULT_HASH_DB_URI.to_string(),
            dial_timeout: constants::DEFAULT_DIAL_TIMEOUT_SECS,
        }
    }
}

impl MerkleTreeArgs {
    /// Returns the configuration of the hash db client.
    pub fn client_config(&self) -> HashDbClientConfig {
        HashDbClientConfig {
            uri: self.uri.clone(),
            dial_timeout: Duration::from_secs(self.dial_timeout),
        }
    }
}

/// The state arguments.
#[derive(Debug, Clone, clap::Args)]
pub struct StateArgs {
    /// The L2 chain id.
    #[arg(long = "state.chain-id", id = "state_chain_id", value_name = "CHAIN_ID")]
    pub chain_id: u64,
    /// The maximum number of retries of a ledger operation that lost a conflict.
    #[arg(long = "state.max-retries", id = "state_max_retries", value_name = "RETRIES", default_value_t = constants::DEFAULT_LEDGER_MAX_RETRIES)]
    pub max_retries: usize,
    /// The initial delay between two retries of a ledger operation, in milliseconds.
    #[arg(long = "state.initial-backoff", id = "state_initial_backoff", value_name = "MILLISECONDS", default_value_t = constants::DEFAULT_LEDGER_INITIAL_BACKOFF_MS)]
    pub initial_backoff: u64,
}

impl StateArgs {
    /// Returns the configuration of the state.
    pub const fn state_config(&self) -> StateConfig {
        StateConfig {
            chain_id: self.chain_id,
            retry: RetryConfig::new(self.max_retries, self.initial_backoff, true),
        }
    }
}

/// The maximum resources of a batch.
#[derive(Debug, Clone, clap::Args)]
pub struct BatchConstraintsArgs {
    /// Maximum number of transactions in a batch.
    #[arg(long = "batch.max-txs", id = "batch_max_txs", value_name = "COUNT", default_value_t = BatchConstraints::default().max_txs_per_batch)]
    pub max_txs_per_batch: u64,
    /// Maximum size of the encoded batch, in bytes.
    #[arg(long = "batch.max-bytes", id = "batch_max_bytes", value_name = "BYTES", default_value_t = BatchConstraints::default().max_batch_bytes_size)]
    pub max_batch_bytes_size: u64,
    /// Maximum cumulative gas used.
    #[arg(long = "batch.max-cumulative-gas", id = "batch_max_cumulative_gas", value_name = "GAS", default_value_t = BatchConstraints::default().max_cumulative_gas_used)]
    pub max_cumulative_gas_used: u64,
    /// Maximum keccak hashes.
    #[arg(long = "batch.max-keccak-hashes", id = "batch_max_keccak_hashes", value_name = "COUNT", default_value_t = BatchConstraints::default().max_keccak_hashes)]
    pub max_keccak_hashes: u32,
    /// Maximum poseidon hashes.
    #[arg(long = "batch.max-poseidon-hashes", id = "batch_max_poseidon_hashes", value_name = "COUNT", default_value_t = BatchConstraints::default().max_poseidon_hashes)]
    pub max_poseidon_hashes: u32,
    /// Maximum poseidon paddings.
    #[arg(long = "batch.max-poseidon-paddings", id = "batch_max_poseidon_paddings", value_name = "COUNT", default_value_t = BatchConstraints::default().max_poseidon_paddings)]
    pub max_poseidon_paddings: u32,
    /// Maximum memory aligns.
    #[arg(long = "batch.max-mem-aligns", id = "batch_max_mem_aligns", value_name = "COUNT", default_value_t = BatchConstraints::default().max_mem_aligns)]
    pub max_mem_aligns: u32,
    /// Maximum arithmetic operations.
    #[arg(long = "batch.max-arithmetics", id = "batch_max_arithmetics", value_name = "COUNT", default_value_t = BatchConstraints::default().max_arithmetics)]
    pub max_arithmetics: u32,
    /// Maximum binary operations.
    #[arg(long = "batch.max-binaries", id = "batch_max_binaries", value_name = "COUNT", default_value_t = BatchConstraints::default().max_binaries)]
    pub max_binaries: u32,
    /// Maximum main state machine steps.
    #[arg(long = "batch.max-steps", id = "batch_max_steps", value_name = "COUNT", default_value_t = BatchConstraints::default().max_steps)]
    pub max_steps: u32,
    /// Maximum sha256 hashes.
    #[arg(long = "batch.max-sha256-hashes", id = "batch_max_sha256_hashes", value_name = "COUNT", default_value_t = BatchConstraints::default().max_sha256_hashes)]
    pub max_sha256_hashes: u32,
}

impl Default for BatchConstraintsArgs {
    fn default() -> Self {
        BatchConstraints::default().into()
    }
}

impl From<BatchConstraints> for BatchConstraintsArgs {
    fn from(constraints: BatchConstraints) -> Self {
        let BatchConstraints {
            max_txs_per_batch,
            max_batch_bytes_size,
            max_cumulative_gas_used,
            max_keccak_hashes,
            max_poseidon_hashes,
            max_poseidon_paddings,
            max_mem_aligns,
            max_arithmetics,
            max_binaries,
            max_steps,
            max_sha256_hashes,
        } = constraints;
        Self {
            max_txs_per_batch,
            max_batch_bytes_size,
            max_cumulative_gas_used,
            max_keccak_hashes,
            max_poseidon_hashes,
            max_poseidon_paddings,
            max_mem_aligns,
            max_arithmetics,
            max_binaries,
            max_steps,
            max_sha256_hashes,
        }
    }
}

impl From<&BatchConstraintsArgs> for BatchConstraints {
    fn from(args: &BatchConstraintsArgs) -> Self {
        Self {
            max_txs_per_batch: args.max_txs_per_batch,
            max_batch_bytes_size: args.max_batch_bytes_size,
            max_cumulative_gas_used: args.max_cumulative_gas_used,
            max_keccak_hashes: args.max_keccak_hashes,
            max_poseidon_hashes: args.max_poseidon_hashes,
            max_poseidon_paddings: args.max_poseidon_paddings,
            max_mem_aligns: args.max_mem_aligns,
            max_arithmetics: args.max_arithmetics,
            max_binaries: args.max_binaries,
            max_steps: args.max_steps,
            max_sha256_hashes: args.max_sha256_hashes,
        }
    }
}
