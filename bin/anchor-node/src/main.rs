mod http;
mod wiring;

use std::sync::Arc;
use std::time::Duration;

use anchor_batch_writer::BatchWriter;
use anchor_fee::{NormalizedFeeCalculator, SpendingMonitor};
use anchor_ledger::mock::{MockCasClient, MockLedgerClient};
use anchor_observer::{Observer, ObserverConfig};
use anchor_stores::memory::{
    InMemoryBlockMetadataStore, InMemoryOperationStore, InMemoryServiceStateStore,
    InMemoryTransactionStore, InMemoryUnresolvableTransactionStore,
};
use anchor_types::OperationQueue;
use anchor_versioning::VersioningDispatcher;
use clap::Parser;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = anchor_config::Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_filter));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = anchor_config::load_service_config(&cli.config)?;
    tracing::info!(?config, "loaded configuration");

    // The ledger node and CAS are out-of-scope external collaborators (spec
    // §6); this binary runs against the in-memory reference
    // implementations, the way the teacher's `testnet` binary runs its
    // node against an anvil devchain rather than mainnet.
    let ledger_client = Arc::new(MockLedgerClient::new());
    let cas_client: Arc<dyn anchor_ledger::CasClient> = Arc::new(MockCasClient::new());

    let transaction_store = Arc::new(InMemoryTransactionStore::new());
    let unresolvable_store = Arc::new(InMemoryUnresolvableTransactionStore::default());
    let operation_store = Arc::new(InMemoryOperationStore::default());
    let block_metadata_store = Arc::new(InMemoryBlockMetadataStore::default());
    let queue = Arc::new(OperationQueue::new());

    let implementations =
        wiring::v1_implementations(&config, cas_client.clone(), operation_store.clone(), queue.clone());
    let dispatcher = Arc::new(VersioningDispatcher::new(vec![(
        config.genesis_height,
        "v1".to_string(),
        implementations,
    )]));

    let fee_calculator = Arc::new(NormalizedFeeCalculator::new(
        block_metadata_store.clone(),
        config.genesis_height,
        config.fee_look_back_blocks,
        config.fee_max_fluctuation_multiplier,
        config.initial_normalized_fee,
    ));
    let spending_monitor = Arc::new(SpendingMonitor::new(
        transaction_store.clone(),
        config.spending_cap,
        config.spending_period_blocks,
    ));

    let observer = Arc::new(Observer::new(
        ledger_client.clone(),
        transaction_store.clone(),
        unresolvable_store,
        operation_store.clone(),
        block_metadata_store,
        fee_calculator.clone(),
        dispatcher.clone(),
        ObserverConfig {
            max_concurrent_downloads: config.max_concurrent_cas_downloads,
            observing_interval: Duration::from_secs(config.observing_interval_seconds),
            max_operations_per_height: config.max_operations_per_height,
            max_transactions_per_height: config.max_transactions_per_height,
            retry_backoff_base: chrono::Duration::seconds(1),
            retry_backoff_max: chrono::Duration::hours(1),
        },
    ));
    observer.attach_service_state_store(Arc::new(InMemoryServiceStateStore::new()));

    let batch_writer = Arc::new(BatchWriter::new(
        queue,
        dispatcher.clone(),
        ledger_client,
        fee_calculator,
        spending_monitor,
        Duration::from_secs(config.batching_interval_seconds),
    ));

    tokio::spawn({
        let observer = observer.clone();
        async move {
            if let Err(e) = observer.run().await {
                tracing::error!(error = %e, "observer loop exited");
            }
        }
    });
    tokio::spawn(batch_writer.run());

    let state = http::AppState { operation_store, dispatcher, observer };
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", cli.port)).await?;
    tracing::info!(port = cli.port, "listening");
    axum::serve(listener, http::router(state)).await?;

    Ok(())
}
