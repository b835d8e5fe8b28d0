//! Assembles the v1 `VersionImplementations` sextuple (spec §4.4). Lives in
//! the binary, not `anchor-protocol`, so that crate never needs to depend
//! on `anchor-selector` just to wire its own transaction selector in.

use std::sync::Arc;

use anchor_download::DownloadManager;
use anchor_ledger::CasClient;
use anchor_protocol::v1::{V1BatchWriterStrategy, V1OperationProcessor, V1RequestHandler, V1TransactionProcessor, V1VersionMetadata};
use anchor_selector::PriorityFeeTransactionSelector;
use anchor_stores::OperationStore;
use anchor_types::{OperationQueue, ServiceConfig};
use anchor_versioning::{VersionImplementations, VersionMetadata};

pub fn v1_implementations(
    config: &ServiceConfig,
    cas_client: Arc<dyn CasClient>,
    operation_store: Arc<dyn OperationStore>,
    queue: Arc<OperationQueue>,
) -> VersionImplementations {
    let version_metadata = Arc::new(V1VersionMetadata::new(config.max_operations_per_batch));
    let download_manager = Arc::new(DownloadManager::new(cas_client.clone(), config.max_concurrent_cas_downloads));

    VersionImplementations {
        transaction_processor: Arc::new(V1TransactionProcessor::new(
            download_manager,
            operation_store,
            version_metadata.max_operations_per_batch(),
            version_metadata.max_core_index_file_size_bytes(),
            version_metadata.max_chunk_file_size_bytes(),
        )),
        operation_processor: Arc::new(V1OperationProcessor),
        transaction_selector: Arc::new(PriorityFeeTransactionSelector),
        batch_writer: Arc::new(V1BatchWriterStrategy::new(cas_client)),
        request_handler: Arc::new(V1RequestHandler::new(queue)),
        version_metadata,
    }
}
