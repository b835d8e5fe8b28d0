use std::sync::Arc;

use anchor_download::DownloadManager;
use anchor_stores::OperationStore;
use anchor_types::{AnchorString, AnchoredOperation, Transaction};
use anchor_versioning::TransactionProcessor;
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::wire::{ChunkFile, CoreIndexFile};

pub struct V1TransactionProcessor {
    download_manager: Arc<DownloadManager>,
    operation_store: Arc<dyn OperationStore>,
    max_operations_per_batch: u32,
    max_core_index_file_size_bytes: usize,
    max_chunk_file_size_bytes: usize,
}

impl V1TransactionProcessor {
    pub fn new(
        download_manager: Arc<DownloadManager>,
        operation_store: Arc<dyn OperationStore>,
        max_operations_per_batch: u32,
        max_core_index_file_size_bytes: usize,
        max_chunk_file_size_bytes: usize,
    ) -> Self {
        Self {
            download_manager,
            operation_store,
            max_operations_per_batch,
            max_core_index_file_size_bytes,
            max_chunk_file_size_bytes,
        }
    }

    /// Runs the full parse/validate/persist pipeline. `Ok(())` covers both
    /// permanent outcomes the trait's `bool` collapses together: validly
    /// invalid (discarded) and successfully persisted. `Err(TransientIo)`
    /// means the Observer should retry.
    async fn try_process(&self, transaction: &Transaction) -> Result<(), anchor_types::AnchorError> {
        let anchor = match AnchorString::parse(&transaction.anchor_string) {
            Ok(anchor) => anchor,
            Err(e) => {
                warn!(error = %e, "discarding transaction with malformed anchor string");
                return Ok(());
            }
        };

        if anchor.number_of_operations > self.max_operations_per_batch {
            warn!(
                number_of_operations = anchor.number_of_operations,
                max = self.max_operations_per_batch,
                "discarding transaction exceeding max operations per batch"
            );
            return Ok(());
        }

        let core_index_bytes = match self
            .download_manager
            .download(&anchor.core_index_file_hash, self.max_core_index_file_size_bytes)
            .await
        {
            Ok(bytes) => bytes,
            Err(e) if e.is_transient() => return Err(e),
            Err(e) => {
                warn!(error = %e, "discarding transaction, core index file unfetchable");
                return Ok(());
            }
        };

        let core_index: CoreIndexFile = match serde_json::from_slice(&core_index_bytes) {
            Ok(file) => file,
            Err(e) => {
                warn!(error = %e, "discarding transaction, malformed core index file");
                return Ok(());
            }
        };

        if core_index.operations.len() != anchor.number_of_operations as usize {
            warn!("discarding transaction, core index file operation count mismatch");
            return Ok(());
        }

        let chunk_bytes = match self
            .download_manager
            .download(&core_index.chunk_file_hash, self.max_chunk_file_size_bytes)
            .await
        {
            Ok(bytes) => bytes,
            Err(e) if e.is_transient() => return Err(e),
            Err(e) => {
                warn!(error = %e, "discarding transaction, chunk file unfetchable");
                return Ok(());
            }
        };

        let chunk: ChunkFile = match serde_json::from_slice(&chunk_bytes) {
            Ok(file) => file,
            Err(e) => {
                warn!(error = %e, "discarding transaction, malformed chunk file");
                return Ok(());
            }
        };

        if chunk.operation_buffers.len() != core_index.operations.len() {
            warn!("discarding transaction, chunk file length mismatch with core index");
            return Ok(());
        }

        let operations: Vec<AnchoredOperation> = core_index
            .operations
            .iter()
            .zip(chunk.operation_buffers.iter())
            .enumerate()
            .map(|(index, (entry, buffer))| AnchoredOperation {
                did_suffix: entry.did_suffix.clone(),
                operation_type: entry.operation_type,
                transaction_time: transaction.time,
                transaction_number: transaction.number,
                operation_index: index as u32,
                operation_buffer: buffer.clone(),
            })
            .collect();

        self.operation_store
            .put(operations)
            .await
            .map_err(|e| anchor_types::AnchorError::transient(e.to_string()))?;

        debug!(transaction_number = transaction.number, "persisted operations for transaction");
        Ok(())
    }
}

#[async_trait]
impl TransactionProcessor for V1TransactionProcessor {
    async fn process(&self, transaction: &Transaction) -> bool {
        match self.try_process(transaction).await {
            Ok(()) => true,
            Err(_transient) => false,
        }
    }
}
