//! Constants related to the rollup node configuration.

/// The default URL of the database.
pub(crate) const DEFAULT_DATABASE_URL: &str = "sqlite://zkevm.db?mode=rwc";

/// The default URI of the executor service.
pub(crate) const DEFAULT_EXECUTOR_URI: &str = "http://127.0.0.1:50071";

/// The default URI of the hash db service.
pub(crate) const DEFAULT_HASH_DB_URI: &str = "http://127.0.0.1:50061";

/// The default maximum size of a gRPC message, in bytes.
pub(crate) const DEFAULT_MAX_GRPC_MESSAGE_SIZE: usize = 100_000_000;

/// The default time spent dialing a remote service at startup, in seconds.
pub(crate) const DEFAULT_DIAL_TIMEOUT_SECS: u64 = 5 * 60;

/// The default number of calls per request refused for lack of executor resources.
pub(crate) const DEFAULT_EXECUTOR_MAX_ATTEMPTS: usize = 3;

/// The default delay between two calls refused for lack of executor resources, in milliseconds.
pub(crate) const DEFAULT_EXECUTOR_RETRY_DELAY_MS: u64 = 1000;

/// The default number of retries of a ledger operation.
pub(crate) const DEFAULT_LEDGER_MAX_RETRIES: usize = 10;

/// The default initial delay between two retries of a ledger operation, in milliseconds.
pub(crate) const DEFAULT_LEDGER_INITIAL_BACKOFF_MS: u64 = 20;
