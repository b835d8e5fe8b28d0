use std::sync::Arc;

use anchor_ledger::CasClient;
use anchor_types::{AnchorError, AnchorResult, AnchorString, OperationType, QueuedOperation};
use anchor_versioning::BatchWriterStrategy;
use async_trait::async_trait;
use tracing::debug;

use crate::wire::{ChunkFile, CoreIndexEntry, CoreIndexFile, OperationPayload};

pub struct V1BatchWriterStrategy {
    cas_client: Arc<dyn CasClient>,
}

impl V1BatchWriterStrategy {
    pub fn new(cas_client: Arc<dyn CasClient>) -> Self {
        Self { cas_client }
    }
}

#[async_trait]
impl BatchWriterStrategy for V1BatchWriterStrategy {
    async fn assemble_and_upload(&self, queued_operations: Vec<QueuedOperation>) -> AnchorResult<String> {
        let mut core_index_entries = Vec::with_capacity(queued_operations.len());
        let mut operation_buffers = Vec::with_capacity(queued_operations.len());

        for queued in queued_operations {
            let operation_type = serde_json::from_slice::<OperationPayload>(&queued.operation_buffer)
                .map(|payload| payload.operation_type())
                .unwrap_or(OperationType::Update);

            core_index_entries.push(CoreIndexEntry { did_suffix: queued.did_suffix, operation_type });
            operation_buffers.push(queued.operation_buffer);
        }

        let number_of_operations = core_index_entries.len() as u32;

        let chunk_file = ChunkFile { operation_buffers };
        let chunk_bytes = serde_json::to_vec(&chunk_file)
            .map_err(|e| AnchorError::permanent(format!("failed to serialize chunk file: {e}")))?;
        let chunk_file_hash = self
            .cas_client
            .write(chunk_bytes)
            .await
            .map_err(|e| AnchorError::transient(format!("chunk file upload failed: {e}")))?;

        let core_index_file = CoreIndexFile { operations: core_index_entries, chunk_file_hash };
        let core_index_bytes = serde_json::to_vec(&core_index_file)
            .map_err(|e| AnchorError::permanent(format!("failed to serialize core index file: {e}")))?;
        let core_index_file_hash = self
            .cas_client
            .write(core_index_bytes)
            .await
            .map_err(|e| AnchorError::transient(format!("core index file upload failed: {e}")))?;

        let anchor_string = AnchorString::new(number_of_operations, core_index_file_hash).serialize();
        debug!(number_of_operations, %anchor_string, "assembled batch");
        Ok(anchor_string)
    }
}
