use anchor_types::{
    AnchorResult, AnchoredOperation, BlockMetadata, Transaction, UnresolvableTransaction,
};
use async_trait::async_trait;

/// Persists processed transactions in strictly ascending `number` order,
/// with no gaps (the Observer's drain discipline is the only writer).
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn add_transaction(&self, transaction: Transaction) -> AnchorResult<()>;

    /// The highest-numbered transaction persisted so far, used by the
    /// Observer to initialise its cursor on startup.
    async fn get_last_transaction(&self) -> AnchorResult<Option<Transaction>>;

    /// Transactions with `number > since_number` (or all, if `None`),
    /// ascending, capped at `max` if given.
    async fn get_transactions_later_than(
        &self,
        since_number: Option<i64>,
        max: Option<usize>,
    ) -> AnchorResult<Vec<Transaction>>;

    /// An exponentially-spaced sample of previously persisted transaction
    /// numbers, most recent first, used to probe for a reorg fork point.
    async fn get_exponentially_spaced_transactions(&self) -> AnchorResult<Vec<Transaction>>;

    /// Delete all transactions with `number > above_number`.
    async fn delete_transactions_later_than(&self, above_number: i64) -> AnchorResult<()>;

    async fn transaction_count(&self) -> AnchorResult<usize>;

    /// Transactions already persisted at `height`, so a selector admitting
    /// a later page/tick for the same height can subtract what is already
    /// counted against its per-height budget instead of re-admitting past it.
    async fn count_at_height(&self, height: u64) -> AnchorResult<usize>;
}

/// Tracks transactions that failed processing, pending retry under
/// exponential backoff.
#[async_trait]
pub trait UnresolvableTransactionStore: Send + Sync {
    async fn record_as_unresolvable(
        &self,
        entry: UnresolvableTransaction,
    ) -> AnchorResult<()>;

    async fn remove(&self, transaction_number: i64) -> AnchorResult<()>;

    async fn get_unresolvable_transactions_due_for_retry(
        &self,
        max: Option<usize>,
    ) -> AnchorResult<Vec<UnresolvableTransaction>>;

    async fn delete_transactions_later_than(&self, above_number: i64) -> AnchorResult<()>;
}

/// Persists the categorised operation log. Operations are immutable once
/// written; the only mutation is bulk deletion above a watermark (reorg) or
/// per-DID pruning of obsolete updates.
#[async_trait]
pub trait OperationStore: Send + Sync {
    async fn put(&self, operations: Vec<AnchoredOperation>) -> AnchorResult<()>;

    /// All operations for `did_suffix`, ascending `(transaction_number, operation_index)`.
    async fn get(&self, did_suffix: &str) -> AnchorResult<Vec<AnchoredOperation>>;

    async fn delete_later_than(&self, above_number: Option<i64>) -> AnchorResult<()>;

    /// Operations already persisted at `height`, across all DID suffixes.
    async fn count_at_height(&self, height: u64) -> AnchorResult<usize>;
}

/// Append-only log of per-block fee/transaction summaries, consumed by the
/// normalized fee calculator's look-back window.
#[async_trait]
pub trait BlockMetadataStore: Send + Sync {
    async fn add(&self, block: BlockMetadata) -> AnchorResult<()>;

    /// Blocks with height in `[start, end)`, ascending.
    async fn get(&self, start: u64, end: u64) -> AnchorResult<Vec<BlockMetadata>>;

    async fn get_last(&self) -> AnchorResult<Option<BlockMetadata>>;

    /// Exponentially-spaced heights going back from `height`, most recent
    /// first: `[height, height-2, height-4, height-8, ...]` down to and
    /// including `floor`.
    async fn look_back_exponentially(&self, height: u64) -> AnchorResult<Vec<BlockMetadata>>;
}

/// Single-row key/value store for observer/operational state that must
/// survive a restart (e.g. health reporting); not a new domain entity.
#[async_trait]
pub trait ServiceStateStore: Send + Sync {
    async fn get(&self, key: &str) -> AnchorResult<Option<serde_json::Value>>;
    async fn put(&self, key: &str, value: serde_json::Value) -> AnchorResult<()>;
}
