//! Metrics emitted by the service, wrapped behind a small typed facade so
//! call sites never touch a raw metric name (mirrors the teacher's
//! `ConsensusMetricsWrapper`, held by each long-running component and
//! passed down to the collaborators it drives).

use metrics::{counter, describe_counter, describe_gauge, gauge, histogram};

/// Cheap to clone, holds no state of its own: every method is a thin,
/// typed wrapper over a call into the global `metrics` recorder.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnchorMetricsWrapper;

impl AnchorMetricsWrapper {
    pub fn new() -> Self {
        describe_counter!("anchor_transactions_processed_total", "Transactions the observer has successfully drained");
        describe_counter!("anchor_transactions_unresolvable_total", "Transactions recorded as unresolvable");
        describe_counter!("anchor_reorgs_total", "Reorgs detected by the observer");
        describe_gauge!("anchor_observer_cursor_number", "Highest persisted transaction number");
        describe_gauge!("anchor_normalized_fee", "Current normalized fee per operation");
        describe_gauge!("anchor_spending_window_total", "Fee spent by this node within the rolling spending window");
        describe_counter!("anchor_batches_written_total", "Batches submitted to the ledger");
        describe_counter!("anchor_operations_queued_total", "Operations enqueued by the request handler");
        describe_gauge!("anchor_queue_depth", "Operations waiting in the batch queue");
        Self
    }

    pub fn transaction_processed(&self) {
        counter!("anchor_transactions_processed_total").increment(1);
    }

    pub fn transaction_unresolvable(&self) {
        counter!("anchor_transactions_unresolvable_total").increment(1);
    }

    pub fn reorg_detected(&self) {
        counter!("anchor_reorgs_total").increment(1);
    }

    pub fn cursor_advanced(&self, number: i64) {
        gauge!("anchor_observer_cursor_number").set(number as f64);
    }

    pub fn normalized_fee_updated(&self, fee: u64) {
        gauge!("anchor_normalized_fee").set(fee as f64);
    }

    pub fn spending_window_updated(&self, total: u64) {
        gauge!("anchor_spending_window_total").set(total as f64);
    }

    pub fn batch_written(&self, operation_count: usize) {
        counter!("anchor_batches_written_total").increment(1);
        histogram!("anchor_batch_operation_count").record(operation_count as f64);
    }

    pub fn operation_queued(&self) {
        counter!("anchor_operations_queued_total").increment(1);
    }

    pub fn queue_depth(&self, depth: usize) {
        gauge!("anchor_queue_depth").set(depth as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_registers_descriptions_without_panicking() {
        let metrics = AnchorMetricsWrapper::new();
        metrics.transaction_processed();
        metrics.cursor_advanced(42);
        metrics.batch_written(3);
    }
}
