//! The batch writer drive loop (spec §4.8): periodically drains the
//! operation queue, hands it to the active protocol version's
//! `BatchWriterStrategy`, and submits the resulting anchor string to the
//! ledger if it clears the normalized fee and spending budgets.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anchor_fee::{NormalizedFeeCalculator, SpendingMonitor};
use anchor_ledger::LedgerClient;
use anchor_metrics::AnchorMetricsWrapper;
use anchor_types::{AnchorResult, OperationQueue};
use anchor_versioning::VersioningDispatcher;
use tracing::{info, warn};

pub struct BatchWriter {
    queue: Arc<OperationQueue>,
    dispatcher: Arc<VersioningDispatcher>,
    ledger_client: Arc<dyn LedgerClient>,
    fee_calculator: Arc<NormalizedFeeCalculator>,
    spending_monitor: Arc<SpendingMonitor>,
    batching_interval: Duration,
    metrics: AnchorMetricsWrapper,
    stopped: AtomicBool,
}

impl BatchWriter {
    pub fn new(
        queue: Arc<OperationQueue>,
        dispatcher: Arc<VersioningDispatcher>,
        ledger_client: Arc<dyn LedgerClient>,
        fee_calculator: Arc<NormalizedFeeCalculator>,
        spending_monitor: Arc<SpendingMonitor>,
        batching_interval: Duration,
    ) -> Self {
        Self {
            queue,
            dispatcher,
            ledger_client,
            fee_calculator,
            spending_monitor,
            batching_interval,
            metrics: AnchorMetricsWrapper::new(),
            stopped: AtomicBool::new(false),
        }
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub async fn run(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.batching_interval);
        loop {
            ticker.tick().await;
            if self.stopped.load(Ordering::SeqCst) {
                break;
            }
            if let Err(e) = self.run_once().await {
                warn!(error = %e, "batch writer tick failed");
            }
        }
    }

    /// One drain-assemble-upload-submit cycle. `Ok(None)` means there was
    /// nothing to write, or the write was deferred (over budget).
    pub async fn run_once(&self) -> AnchorResult<Option<String>> {
        if self.queue.is_empty() {
            return Ok(None);
        }
        self.metrics.queue_depth(self.queue.len());

        let height = self
            .ledger_client
            .approximate_height()
            .await
            .map_err(|e| anchor_types::AnchorError::transient(e.to_string()))?;

        let implementations = self.dispatcher.version_at(height)?;
        let max_operations = implementations.version_metadata.max_operations_per_batch() as usize;
        let queued_operations = self.queue.dequeue_batch(max_operations);
        if queued_operations.is_empty() {
            return Ok(None);
        }

        let fee = self.fee_calculator.normalized_fee_at(height).await?;
        if !self.spending_monitor.is_current_fee_within_limit(fee, height).await? {
            warn!(height, fee, "deferring batch, spending cap would be exceeded");
            for operation in queued_operations {
                self.queue.enqueue(operation.did_suffix, operation.operation_buffer);
            }
            return Ok(None);
        }

        let queued_count = queued_operations.len();
        let anchor_string = implementations.batch_writer.assemble_and_upload(queued_operations).await?;

        self.ledger_client
            .write(&anchor_string, fee)
            .await
            .map_err(|e| anchor_types::AnchorError::transient(e.to_string()))?;

        self.spending_monitor.record_written(anchor_string.clone());
        self.metrics.batch_written(queued_count);
        info!(height, fee, %anchor_string, "wrote batch");
        Ok(Some(anchor_string))
    }
}
