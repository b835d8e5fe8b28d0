use std::sync::Arc;

use anchor_types::{AnchorResult, AnchoredOperation, DidState, QueuedOperation, Transaction};
use async_trait::async_trait;

/// Per-version constants, dominated by the value-time-lock governing batch
/// size (spec §4.8) and the multihash algorithm this version anchors with.
pub trait VersionMetadata: Send + Sync {
    fn hash_algorithm_code(&self) -> u64;
    fn max_operations_per_batch(&self) -> u32;
    fn max_core_index_file_size_bytes(&self) -> usize;
    fn max_chunk_file_size_bytes(&self) -> usize;
    fn max_operation_size_bytes(&self) -> usize;
}

/// Parses and validates one anchored transaction, persisting its
/// operations before returning (spec §4.2). Never propagates an error:
/// `true` is a permanent outcome (including "validly invalid, discard"),
/// `false` means a transient failure the Observer should retry.
#[async_trait]
pub trait TransactionProcessor: Send + Sync {
    async fn process(&self, transaction: &Transaction) -> bool;
}

/// The versioned rules for applying one operation to DID state (spec
/// §4.3). Every method is infallible from the resolver's point of view: a
/// malformed or inapplicable operation yields `None`, never an error,
/// matching the resolver's failure-isolation requirement.
pub trait OperationProcessor: Send + Sync {
    /// The multihash of the operation's revealed commitment value, used as
    /// the key the resolver matches against `DidState`'s `next_*_commitment_hash`
    /// fields. `None` if the operation carries no usable reveal value.
    fn reveal_commitment_hash(&self, operation: &AnchoredOperation) -> Option<String>;

    /// Build the initial state from a `create` operation.
    fn apply_create(&self, operation: &AnchoredOperation) -> Option<DidState>;

    /// Apply an `update`, `recover` or `deactivate` operation on top of
    /// `state`. Returns `None` if the operation does not validly apply
    /// (wrong signature, malformed payload, stale commitment, etc).
    fn apply_operation(&self, state: &DidState, operation: &AnchoredOperation) -> Option<DidState>;
}

/// Per-height admission control (spec §4.7). Pure and synchronous: no I/O,
/// only the budgets already consumed at this height and the candidate set.
pub trait TransactionSelector: Send + Sync {
    fn select(
        &self,
        candidates: Vec<Transaction>,
        already_persisted_operations: u64,
        already_persisted_transactions: u64,
        max_operations_per_height: u32,
        max_transactions_per_height: u32,
    ) -> Vec<Transaction>;
}

/// The version-specific half of batch writing (spec §4.8): turning queued
/// operations into chunk/core-index files and uploading them to CAS. The
/// periodic drive loop, fee/spending checks and ledger submission live in
/// `anchor-batch-writer` and are not version-specific.
#[async_trait]
pub trait BatchWriterStrategy: Send + Sync {
    async fn assemble_and_upload(
        &self,
        queued_operations: Vec<QueuedOperation>,
    ) -> AnchorResult<String>;
}

/// Accepts an unvalidated operation buffer from outside (the out-of-scope
/// HTTP surface) and enqueues it for the next batch.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn enqueue(&self, did_suffix: String, operation_buffer: Vec<u8>) -> AnchorResult<()>;
}

/// The sextuple of per-version objects the dispatcher eager-loads at
/// initialisation (spec §4.4).
#[derive(Clone)]
pub struct VersionImplementations {
    pub transaction_processor: Arc<dyn TransactionProcessor>,
    pub operation_processor: Arc<dyn OperationProcessor>,
    pub transaction_selector: Arc<dyn TransactionSelector>,
    pub batch_writer: Arc<dyn BatchWriterStrategy>,
    pub request_handler: Arc<dyn RequestHandler>,
    pub version_metadata: Arc<dyn VersionMetadata>,
}

/// Read-only handle each per-version object holds onto the dispatcher, so
/// version objects never hold a reference back into the registry itself
/// (spec §9 design note on one-way references).
pub trait VersionMetadataFetcher: Send + Sync {
    fn version_metadata_at(&self, height: u64) -> AnchorResult<Arc<dyn VersionMetadata>>;
}
