//! The Observer drive loop (spec §4.1): streams ledger transactions past a
//! cursor, fans per-height admitted transactions out to bounded-concurrency
//! processor tasks, persists a gap-free prefix, retries failures under
//! backoff, and reverts on reorganisation.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anchor_fee::NormalizedFeeCalculator;
use anchor_ledger::{LedgerClient, LedgerClientError};
use anchor_metrics::AnchorMetricsWrapper;
use anchor_stores::{
    BlockMetadataStore, OperationStore, ServiceStateStore, TransactionStore, UnresolvableTransactionStore,
};
use anchor_types::{AnchorError, AnchorResult, BlockMetadata, Transaction, UnresolvableTransaction};
use anchor_versioning::VersioningDispatcher;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use tracing::{info, warn};

pub struct ObserverConfig {
    pub max_concurrent_downloads: usize,
    pub observing_interval: Duration,
    pub max_operations_per_height: u32,
    pub max_transactions_per_height: u32,
    pub retry_backoff_base: chrono::Duration,
    pub retry_backoff_max: chrono::Duration,
}

pub struct Observer {
    ledger_client: Arc<dyn LedgerClient>,
    transaction_store: Arc<dyn TransactionStore>,
    unresolvable_store: Arc<dyn UnresolvableTransactionStore>,
    operation_store: Arc<dyn OperationStore>,
    block_metadata_store: Arc<dyn BlockMetadataStore>,
    fee_calculator: Arc<NormalizedFeeCalculator>,
    dispatcher: Arc<VersioningDispatcher>,
    config: ObserverConfig,
    metrics: AnchorMetricsWrapper,
    cursor: Mutex<Option<Transaction>>,
    /// Mirrors the cursor for `/health` reporting across restarts (spec
    /// §3 supplement). Optional: the Observer's correctness never depends
    /// on it, only `TransactionStore.get_last_transaction` does.
    service_state_store: Mutex<Option<Arc<dyn ServiceStateStore>>>,
    stopped: AtomicBool,
}

impl Observer {
    pub fn new(
        ledger_client: Arc<dyn LedgerClient>,
        transaction_store: Arc<dyn TransactionStore>,
        unresolvable_store: Arc<dyn UnresolvableTransactionStore>,
        operation_store: Arc<dyn OperationStore>,
        block_metadata_store: Arc<dyn BlockMetadataStore>,
        fee_calculator: Arc<NormalizedFeeCalculator>,
        dispatcher: Arc<VersioningDispatcher>,
        config: ObserverConfig,
    ) -> Self {
        Self {
            ledger_client,
            transaction_store,
            unresolvable_store,
            operation_store,
            block_metadata_store,
            fee_calculator,
            dispatcher,
            config,
            metrics: AnchorMetricsWrapper::new(),
            cursor: Mutex::new(None),
            service_state_store: Mutex::new(None),
            stopped: AtomicBool::new(false),
        }
    }

    /// Attaches a `ServiceStateStore` to mirror the cursor into, for
    /// `/health` reporting that survives a process restart. Optional;
    /// an Observer with none attached behaves identically.
    pub fn attach_service_state_store(&self, store: Arc<dyn ServiceStateStore>) {
        *self.service_state_store.lock() = Some(store);
    }

    async fn persist_cursor_snapshot(&self, cursor: &Transaction) -> AnchorResult<()> {
        let store = self.service_state_store.lock().clone();
        if let Some(store) = store {
            store
                .put(
                    "lastKnownTransaction",
                    serde_json::json!({
                        "number": cursor.number,
                        "time": cursor.time,
                        "timeHash": cursor.time_hash,
                    }),
                )
                .await?;
        }
        Ok(())
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    /// The highest transaction number persisted so far, for health
    /// reporting over the HTTP surface.
    pub fn last_known_transaction_number(&self) -> Option<i64> {
        self.cursor.lock().as_ref().map(|t| t.number)
    }

    pub async fn run(self: Arc<Self>) -> AnchorResult<()> {
        let last = self.transaction_store.get_last_transaction().await?;
        *self.cursor.lock() = last;

        let mut ticker = tokio::time::interval(self.config.observing_interval);
        loop {
            ticker.tick().await;
            if self.stopped.load(Ordering::SeqCst) {
                break;
            }
            if let Err(e) = self.run_once().await {
                warn!(error = %e, "observer tick failed");
            }
        }
        Ok(())
    }

    pub async fn run_once(&self) -> AnchorResult<()> {
        let cursor = self.cursor.lock().clone();
        let since_number = cursor.as_ref().map(|t| t.number);
        let since_time_hash = cursor.as_ref().map(|t| t.time_hash.clone());

        match self.ledger_client.read(since_number, since_time_hash).await {
            Ok(result) => {
                self.process_page(result.transactions).await?;
                self.run_unresolvable_retry_pass().await?;
                Ok(())
            }
            Err(LedgerClientError::InvalidTransactionNumberOrTimeHash { .. }) => {
                self.handle_reorg(cursor).await
            }
            Err(other) => Err(AnchorError::transient(other.to_string())),
        }
    }

    async fn process_page(&self, transactions: Vec<Transaction>) -> AnchorResult<()> {
        if transactions.is_empty() {
            return Ok(());
        }

        let mut by_height: BTreeMap<u64, Vec<Transaction>> = BTreeMap::new();
        for tx in transactions.iter().cloned() {
            by_height.entry(tx.time).or_default().push(tx);
        }

        let mut selected = Vec::new();
        for (height, group) in by_height {
            let implementations = self.dispatcher.version_at(height)?.clone();
            let already_persisted_transactions = self.transaction_store.count_at_height(height).await? as u64;
            let already_persisted_operations = self.operation_store.count_at_height(height).await? as u64;
            let chosen = implementations.transaction_selector.select(
                group,
                already_persisted_operations,
                already_persisted_transactions,
                self.config.max_operations_per_height,
                self.config.max_transactions_per_height,
            );
            selected.extend(chosen);
        }
        selected.sort_by_key(|t| t.number);

        let max_concurrency = self.config.max_concurrent_downloads.max(1);
        let mut results: Vec<(Transaction, bool)> = stream::iter(selected.into_iter().map(|tx| {
            let dispatcher = &self.dispatcher;
            async move {
                let success = match dispatcher.version_at(tx.time) {
                    Ok(implementations) => implementations.transaction_processor.process(&tx).await,
                    Err(_) => false,
                };
                (tx, success)
            }
        }))
        .buffer_unordered(max_concurrency)
        .collect()
        .await;
        results.sort_by_key(|(tx, _)| tx.number);

        let mut interrupted = false;
        let mut current_height_aggregate: Option<(u64, u64, u64)> = None; // (height, total_fee, count)

        for (tx, success) in results {
            if !success {
                self.record_new_failure(tx).await?;
                self.metrics.transaction_unresolvable();
                interrupted = true;
                break;
            }

            self.transaction_store.add_transaction(tx.clone()).await?;
            self.unresolvable_store.remove(tx.number).await?;
            self.metrics.transaction_processed();
            self.metrics.cursor_advanced(tx.number);

            match current_height_aggregate {
                Some((height, total_fee, count)) if height == tx.time => {
                    current_height_aggregate = Some((height, total_fee + tx.fee_paid, count + 1));
                }
                Some((height, total_fee, count)) => {
                    self.flush_block_metadata(height, total_fee, count).await?;
                    current_height_aggregate = Some((tx.time, tx.fee_paid, 1));
                }
                None => current_height_aggregate = Some((tx.time, tx.fee_paid, 1)),
            }

            *self.cursor.lock() = Some(tx);
        }

        if let Some((height, total_fee, count)) = current_height_aggregate {
            if !interrupted {
                self.flush_block_metadata(height, total_fee, count).await?;
            }
        }

        if !interrupted {
            if let Some(last) = transactions.last() {
                let should_advance = {
                    let mut cursor = self.cursor.lock();
                    let should_advance = cursor.as_ref().map_or(true, |c| c.number < last.number);
                    if should_advance {
                        *cursor = Some(last.clone());
                    }
                    should_advance
                };
                if should_advance {
                    self.persist_cursor_snapshot(last).await?;
                }
            }
        }

        Ok(())
    }

    async fn flush_block_metadata(&self, height: u64, total_fee: u64, count: u64) -> AnchorResult<()> {
        let normalized_fee = self.fee_calculator.normalized_fee_at(height).await?;
        self.metrics.normalized_fee_updated(normalized_fee);
        let previous_hash =
            self.block_metadata_store.get_last().await?.map(|b| b.hash).unwrap_or_default();
        self.block_metadata_store
            .add(BlockMetadata {
                height,
                hash: format!("height-{height}"),
                previous_hash,
                transaction_count: count,
                total_fee,
                normalized_fee,
            })
            .await
    }

    async fn record_new_failure(&self, transaction: Transaction) -> AnchorResult<()> {
        let now = chrono::Utc::now();
        let entry = UnresolvableTransaction {
            next_retry_time: UnresolvableTransaction::compute_next_retry_time(
                now,
                self.config.retry_backoff_base,
                1,
                self.config.retry_backoff_max,
            ),
            transaction,
            first_fetch_time: now,
            retry_attempts: 1,
        };
        self.unresolvable_store.record_as_unresolvable(entry).await
    }

    async fn run_unresolvable_retry_pass(&self) -> AnchorResult<()> {
        let due = self.unresolvable_store.get_unresolvable_transactions_due_for_retry(None).await?;
        for entry in due {
            let implementations = self.dispatcher.version_at(entry.transaction.time)?.clone();
            let success = implementations.transaction_processor.process(&entry.transaction).await;
            if success {
                self.unresolvable_store.remove(entry.transaction.number).await?;
                info!(number = entry.transaction.number, "unresolvable transaction resolved on retry");
            } else {
                let retry_attempts = entry.retry_attempts + 1;
                let next = UnresolvableTransaction {
                    transaction: entry.transaction,
                    first_fetch_time: entry.first_fetch_time,
                    retry_attempts,
                    next_retry_time: UnresolvableTransaction::compute_next_retry_time(
                        chrono::Utc::now(),
                        self.config.retry_backoff_base,
                        retry_attempts,
                        self.config.retry_backoff_max,
                    ),
                };
                self.unresolvable_store.record_as_unresolvable(next).await?;
            }
        }
        Ok(())
    }

    async fn handle_reorg(&self, cursor: Option<Transaction>) -> AnchorResult<()> {
        let Some(cursor) = cursor else {
            return Ok(());
        };

        let approximate_height = self
            .ledger_client
            .approximate_height()
            .await
            .map_err(|e| AnchorError::transient(e.to_string()))?;

        if cursor.time > approximate_height {
            // The ledger node has not caught up to our cursor yet; this is
            // not a reorg. Per spec, wait rather than bail.
            tokio::time::sleep(self.config.observing_interval).await;
            return Ok(());
        }

        warn!(cursor_number = cursor.number, "reorg detected, searching for fork point");
        self.metrics.reorg_detected();
        let samples = self.transaction_store.get_exponentially_spaced_transactions().await?;
        let fork = self
            .ledger_client
            .get_first_valid_transaction(&samples)
            .await
            .map_err(|e| AnchorError::transient(e.to_string()))?;

        match fork {
            Some(fork_tx) => {
                self.operation_store.delete_later_than(Some(fork_tx.number)).await?;
                self.transaction_store.delete_transactions_later_than(fork_tx.number).await?;
                self.unresolvable_store.delete_transactions_later_than(fork_tx.number).await?;
                info!(fork_number = fork_tx.number, "reverted to fork point");
                *self.cursor.lock() = Some(fork_tx.clone());
                self.persist_cursor_snapshot(&fork_tx).await?;
            }
            None => {
                self.operation_store.delete_later_than(None).await?;
                self.transaction_store.delete_transactions_later_than(-1).await?;
                self.unresolvable_store.delete_transactions_later_than(-1).await?;
                warn!("no valid fork point found among samples, reverted to genesis");
                *self.cursor.lock() = None;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anchor_ledger::mock::MockLedgerClient;
    use anchor_protocol::v1::{V1BatchWriterStrategy, V1OperationProcessor, V1RequestHandler, V1VersionMetadata};
    use anchor_selector::PriorityFeeTransactionSelector;
    use anchor_stores::memory::{
        InMemoryBlockMetadataStore, InMemoryOperationStore, InMemoryServiceStateStore,
        InMemoryTransactionStore, InMemoryUnresolvableTransactionStore,
    };
    use anchor_types::OperationQueue;
    use anchor_versioning::VersionImplementations;
    use async_trait::async_trait;

    use super::*;

    fn tx(number: i64, height: u64, hash: &str) -> Transaction {
        Transaction {
            number,
            time: height,
            time_hash: hash.to_string(),
            anchor_string: "0.Qm".to_string(),
            fee_paid: 10,
            normalized_fee: 10,
            writer: None,
        }
    }

    struct ScriptedProcessor {
        fails: Vec<i64>,
    }

    #[async_trait]
    impl anchor_versioning::TransactionProcessor for ScriptedProcessor {
        async fn process(&self, transaction: &Transaction) -> bool {
            !self.fails.contains(&transaction.number)
        }
    }

    struct AlwaysSucceeds;
    #[async_trait]
    impl anchor_versioning::TransactionProcessor for AlwaysSucceeds {
        async fn process(&self, _transaction: &Transaction) -> bool {
            true
        }
    }

    fn implementations(processor: Arc<dyn anchor_versioning::TransactionProcessor>) -> VersionImplementations {
        let queue = Arc::new(OperationQueue::new());
        VersionImplementations {
            transaction_processor: processor,
            operation_processor: Arc::new(V1OperationProcessor),
            transaction_selector: Arc::new(PriorityFeeTransactionSelector),
            batch_writer: Arc::new(V1BatchWriterStrategy::new(Arc::new(
                anchor_ledger::mock::MockCasClient::default(),
            ))),
            request_handler: Arc::new(V1RequestHandler::new(queue)),
            version_metadata: Arc::new(V1VersionMetadata::new(10)),
        }
    }

    fn observer_config() -> ObserverConfig {
        ObserverConfig {
            max_concurrent_downloads: 4,
            observing_interval: Duration::from_millis(10),
            max_operations_per_height: u32::MAX,
            max_transactions_per_height: u32::MAX,
            retry_backoff_base: chrono::Duration::seconds(1),
            retry_backoff_max: chrono::Duration::hours(1),
        }
    }

    #[tokio::test]
    async fn partial_failure_stops_the_drain_prefix() {
        // Height 100 carries three transactions; the middle one fails
        // processing. Only the first should be persisted, the failing one
        // recorded as unresolvable, and the cursor must not advance past it.
        let ledger = Arc::new(MockLedgerClient::new());
        ledger.set_approximate_height(100);
        ledger.push(tx(1, 100, "h100"));
        ledger.push(tx(2, 100, "h100"));
        ledger.push(tx(3, 100, "h100"));

        let dispatcher = Arc::new(VersioningDispatcher::new(vec![(
            0,
            "v1".to_string(),
            implementations(Arc::new(ScriptedProcessor { fails: vec![2] })),
        )]));

        let tx_store = Arc::new(InMemoryTransactionStore::new());
        let unresolvable_store = Arc::new(InMemoryUnresolvableTransactionStore::default());
        let operation_store = Arc::new(InMemoryOperationStore::default());
        let block_store = Arc::new(InMemoryBlockMetadataStore::default());
        let fee_calculator = Arc::new(NormalizedFeeCalculator::new(block_store.clone(), 1, 1, 0.5, 10));

        let observer = Observer::new(
            ledger,
            tx_store.clone(),
            unresolvable_store.clone(),
            operation_store,
            block_store,
            fee_calculator,
            dispatcher,
            observer_config(),
        );

        observer.run_once().await.unwrap();

        assert_eq!(tx_store.transaction_count().await.unwrap(), 1);
        let last = tx_store.get_last_transaction().await.unwrap().unwrap();
        assert_eq!(last.number, 1);

        let due = unresolvable_store
            .get_unresolvable_transactions_due_for_retry(None)
            .await
            .unwrap();
        assert!(due.is_empty(), "backoff has not elapsed yet, nothing due");
    }

    #[tokio::test]
    async fn attached_service_state_store_mirrors_the_advanced_cursor() {
        let ledger = Arc::new(MockLedgerClient::new());
        ledger.set_approximate_height(100);
        ledger.push(tx(1, 100, "h100"));

        let dispatcher = Arc::new(VersioningDispatcher::new(vec![(
            0,
            "v1".to_string(),
            implementations(Arc::new(AlwaysSucceeds)),
        )]));

        let tx_store = Arc::new(InMemoryTransactionStore::new());
        let unresolvable_store = Arc::new(InMemoryUnresolvableTransactionStore::default());
        let operation_store = Arc::new(InMemoryOperationStore::default());
        let block_store = Arc::new(InMemoryBlockMetadataStore::default());
        let fee_calculator = Arc::new(NormalizedFeeCalculator::new(block_store.clone(), 1, 1, 0.5, 10));

        let observer = Observer::new(
            ledger,
            tx_store,
            unresolvable_store,
            operation_store,
            block_store,
            fee_calculator,
            dispatcher,
            observer_config(),
        );
        let service_state = Arc::new(InMemoryServiceStateStore::new());
        observer.attach_service_state_store(service_state.clone());

        observer.run_once().await.unwrap();

        let snapshot = service_state.get("lastKnownTransaction").await.unwrap().unwrap();
        assert_eq!(snapshot["number"], 1);
        assert_eq!(snapshot["timeHash"], "h100");
    }

    #[tokio::test]
    async fn reorg_reverts_to_the_sampled_fork_point() {
        let ledger = Arc::new(MockLedgerClient::new());
        for n in 0..=1000i64 {
            ledger.push(tx(n, n as u64, &format!("hash-{n}")));
        }
        ledger.set_approximate_height(1000);

        let tx_store = Arc::new(InMemoryTransactionStore::new());
        for n in 0..=1000i64 {
            tx_store.add_transaction(tx(n, n as u64, &format!("hash-{n}"))).await.unwrap();
        }

        // Fork at 986: everything after it is replaced with a divergent chain.
        let replacement: Vec<Transaction> =
            (987..=1005i64).map(|n| tx(n, n as u64, &format!("fork-{n}"))).collect();
        ledger.reorg_to(986, replacement);
        ledger.set_approximate_height(1005);

        let unresolvable_store = Arc::new(InMemoryUnresolvableTransactionStore::default());
        let operation_store = Arc::new(InMemoryOperationStore::default());
        let block_store = Arc::new(InMemoryBlockMetadataStore::default());
        let fee_calculator = Arc::new(NormalizedFeeCalculator::new(block_store.clone(), 1, 1, 0.5, 10));
        let dispatcher = Arc::new(VersioningDispatcher::new(vec![(
            0,
            "v1".to_string(),
            implementations(Arc::new(AlwaysSucceeds)),
        )]));

        let observer = Observer::new(
            ledger,
            tx_store.clone(),
            unresolvable_store,
            operation_store,
            block_store,
            fee_calculator,
            dispatcher,
            observer_config(),
        );

        *observer.cursor.lock() = Some(tx(1000, 1000, "hash-1000"));
        observer.run_once().await.unwrap();

        let cursor = observer.cursor.lock().clone().expect("cursor retained after reorg");
        assert_eq!(cursor.number, 986);
        assert_eq!(cursor.time_hash, "hash-986");
        assert_eq!(tx_store.get_last_transaction().await.unwrap().unwrap().number, 986);
    }
}
