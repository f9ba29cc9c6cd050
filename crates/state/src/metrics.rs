use metrics::{Counter, Histogram};
use metrics_derive::Metrics;
use rollup_node_primitives::CallerLabel;
use std::collections::HashMap;
use strum::IntoEnumIterator;

/// The metric handler for the [`crate::State`]. Tracks the executor calls per caller.
#[derive(Debug)]
pub(crate) struct MetricsHandler {
    executor_metrics: HashMap<CallerLabel, ExecutorMetrics>,
}

impl MetricsHandler {
    /// Returns the [`ExecutorMetrics`] for the provided caller, [`None`] for
    /// [`CallerLabel::Discard`].
    pub(crate) fn get(&self, caller: CallerLabel) -> Option<&ExecutorMetrics> {
        self.executor_metrics.get(&caller)
    }
}

impl Default for MetricsHandler {
    fn default() -> Self {
        Self {
            executor_metrics: CallerLabel::iter()
                .filter(|caller| *caller != CallerLabel::Discard)
                .map(|caller| {
                    (caller, ExecutorMetrics::new_with_labels(&[("caller", caller.as_str())]))
                })
                .collect(),
        }
    }
}

/// The metrics of the executor calls.
#[derive(Metrics, Clone)]
#[metrics(scope = "state")]
pub(crate) struct ExecutorMetrics {
    /// Time (s) spent by the executor processing a batch.
    #[metric(describe = "Time to process a batch by the executor (s)")]
    pub process_batch_duration: Histogram,
    /// Number of batches rejected by the executor.
    #[metric(describe = "Number of batches rejected by the executor")]
    pub executor_errors: Counter,
    /// Number of batches processed with a ROM error.
    #[metric(describe = "Number of batches processed with a rom error")]
    pub rom_errors: Counter,
    /// Number of batches which exhausted a zkEVM counter.
    #[metric(describe = "Number of batches out of counters")]
    pub out_of_counters: Counter,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discard_is_not_recorded() {
        let handler = MetricsHandler::default();
        assert!(handler.get(CallerLabel::Sequencer).is_some());
        assert!(handler.get(CallerLabel::Synchronizer).is_some());
        assert!(handler.get(CallerLabel::Discard).is_none());
    }
}
