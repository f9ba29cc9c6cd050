use metrics::{Counter, Histogram};
use metrics_derive::Metrics;

/// The metrics for the [`super::BatchLedger`].
#[derive(Metrics, Clone)]
#[metrics(scope = "ledger")]
pub(crate) struct LedgerMetrics {
    /// Time (s) spent committing a unit of work, writer lock included.
    #[metric(describe = "Time to commit a ledger unit of work (s)")]
    pub commit_duration: Histogram,
    /// Time (s) spent waiting for the writer lock.
    #[metric(describe = "Time to acquire the ledger writer lock (s)")]
    pub write_lock_acquire_duration: Histogram,
    /// Number of units of work aborted by a concurrent writer.
    #[metric(describe = "Number of ledger commits aborted on conflict")]
    pub conflicts: Counter,
}

/// Metrics for the retry helper.
#[derive(Metrics, Clone)]
#[metrics(scope = "ledger_retry")]
pub(crate) struct RetryMetrics {
    /// Number of attempts before a successful result.
    #[metric(describe = "Number of attempts before a successful ledger operation")]
    pub attempts_before_success: Histogram,
}
