use std::sync::Arc;

use anchor_types::{AnchorError, AnchorResult};

use crate::traits::{VersionImplementations, VersionMetadata, VersionMetadataFetcher};

struct VersionEntry {
    starting_height: u64,
    version_tag: String,
    implementations: VersionImplementations,
}

/// Maps a ledger height to the sextuple of implementations valid at that
/// height (spec §4.4). Entries are kept sorted by `starting_height`
/// descending so `version_at` is a linear scan for the first entry whose
/// `starting_height <= height`.
pub struct VersioningDispatcher {
    entries: Vec<VersionEntry>,
}

impl VersioningDispatcher {
    /// `versions` need not be pre-sorted; `(starting_height, version_tag, implementations)`.
    pub fn new(mut versions: Vec<(u64, String, VersionImplementations)>) -> Self {
        versions.sort_by(|a, b| b.0.cmp(&a.0));
        let entries = versions
            .into_iter()
            .map(|(starting_height, version_tag, implementations)| VersionEntry {
                starting_height,
                version_tag,
                implementations,
            })
            .collect();
        Self { entries }
    }

    pub fn version_at(&self, height: u64) -> AnchorResult<&VersionImplementations> {
        self.entries
            .iter()
            .find(|entry| entry.starting_height <= height)
            .map(|entry| &entry.implementations)
            .ok_or_else(|| {
                AnchorError::Configuration(format!("no protocol version registered at height {height}"))
            })
    }

    pub fn tag_at(&self, height: u64) -> AnchorResult<&str> {
        self.entries
            .iter()
            .find(|entry| entry.starting_height <= height)
            .map(|entry| entry.version_tag.as_str())
            .ok_or_else(|| {
                AnchorError::Configuration(format!("no protocol version registered at height {height}"))
            })
    }
}

impl VersionMetadataFetcher for VersioningDispatcher {
    fn version_metadata_at(&self, height: u64) -> AnchorResult<Arc<dyn VersionMetadata>> {
        Ok(self.version_at(height)?.version_metadata.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anchor_types::{AnchoredOperation, DidState, QueuedOperation, Transaction};
    use async_trait::async_trait;

    use super::*;
    use crate::traits::{
        BatchWriterStrategy, OperationProcessor, RequestHandler, TransactionProcessor,
        TransactionSelector,
    };

    struct NoopMetadata(u64);
    impl VersionMetadata for NoopMetadata {
        fn hash_algorithm_code(&self) -> u64 {
            self.0
        }
        fn max_operations_per_batch(&self) -> u32 {
            100
        }
        fn max_core_index_file_size_bytes(&self) -> usize {
            1_000_000
        }
        fn max_chunk_file_size_bytes(&self) -> usize {
            1_000_000
        }
        fn max_operation_size_bytes(&self) -> usize {
            10_000
        }
    }

    struct NoopProcessor;
    #[async_trait]
    impl TransactionProcessor for NoopProcessor {
        async fn process(&self, _transaction: &Transaction) -> bool {
            true
        }
    }
    impl OperationProcessor for NoopProcessor {
        fn reveal_commitment_hash(&self, _operation: &AnchoredOperation) -> Option<String> {
            None
        }
        fn apply_create(&self, _operation: &AnchoredOperation) -> Option<DidState> {
            None
        }
        fn apply_operation(&self, _state: &DidState, _operation: &AnchoredOperation) -> Option<DidState> {
            None
        }
    }
    impl TransactionSelector for NoopProcessor {
        fn select(
            &self,
            candidates: Vec<Transaction>,
            _already_persisted_operations: u64,
            _already_persisted_transactions: u64,
            _max_operations_per_height: u32,
            _max_transactions_per_height: u32,
        ) -> Vec<Transaction> {
            candidates
        }
    }
    #[async_trait]
    impl BatchWriterStrategy for NoopProcessor {
        async fn assemble_and_upload(&self, _queued_operations: Vec<QueuedOperation>) -> AnchorResult<String> {
            Ok("0.Qm".to_string())
        }
    }
    #[async_trait]
    impl RequestHandler for NoopProcessor {
        async fn enqueue(&self, _did_suffix: String, _operation_buffer: Vec<u8>) -> AnchorResult<()> {
            Ok(())
        }
    }

    fn implementations(hash_code: u64) -> VersionImplementations {
        let noop = Arc::new(NoopProcessor);
        VersionImplementations {
            transaction_processor: noop.clone(),
            operation_processor: noop.clone(),
            transaction_selector: noop.clone(),
            batch_writer: noop.clone(),
            request_handler: noop.clone(),
            version_metadata: Arc::new(NoopMetadata(hash_code)),
        }
    }

    #[test]
    fn picks_the_newest_version_not_exceeding_height() {
        let dispatcher = VersioningDispatcher::new(vec![
            (0, "v0".to_string(), implementations(0)),
            (1_000, "v1".to_string(), implementations(1)),
            (2_000, "v2".to_string(), implementations(2)),
        ]);

        assert_eq!(dispatcher.tag_at(500).unwrap(), "v0");
        assert_eq!(dispatcher.tag_at(1_000).unwrap(), "v1");
        assert_eq!(dispatcher.tag_at(1_999).unwrap(), "v1");
        assert_eq!(dispatcher.tag_at(2_500).unwrap(), "v2");
    }

    #[test]
    fn errors_below_the_earliest_version() {
        let dispatcher =
            VersioningDispatcher::new(vec![(100, "v0".to_string(), implementations(0))]);
        assert!(dispatcher.version_at(50).is_err());
    }
}
