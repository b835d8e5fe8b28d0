use anchor_types::Transaction;
use async_trait::async_trait;
use thiserror::Error;

/// Errors a `LedgerClient` can surface. Everything but
/// `InvalidTransactionNumberOrTimeHash` is a transient I/O failure from the
/// Observer's point of view.
#[derive(Error, Debug)]
pub enum LedgerClientError {
    /// The cursor the caller passed no longer exists on the canonical
    /// chain — either a reorg happened, or the node has not caught up yet.
    /// The Observer disambiguates using `approximate_height`.
    #[error("cursor (number={number:?}, time_hash={time_hash:?}) is no longer valid")]
    InvalidTransactionNumberOrTimeHash { number: Option<i64>, time_hash: Option<String> },

    #[error("ledger node unreachable: {0}")]
    NodeUnreachable(String),

    #[error("ledger write rejected: {0}")]
    WriteRejected(String),
}

pub struct ReadResult {
    pub transactions: Vec<Transaction>,
    pub more_transactions: bool,
}

/// Out-of-scope collaborator (spec §6): a thin client over the ledger
/// node's RPC surface. Only the contract is specified here; a production
/// implementation talks to the actual node.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Transactions strictly after `(since_number, since_time_hash)` in
    /// ledger order. Both `None` means "from genesis".
    async fn read(
        &self,
        since_number: Option<i64>,
        since_time_hash: Option<String>,
    ) -> Result<ReadResult, LedgerClientError>;

    /// Submit `anchor_string` as a ledger transaction paying `fee`.
    async fn write(&self, anchor_string: &str, fee: u64) -> Result<(), LedgerClientError>;

    /// Of `samples` (ordered most-recent-first), the newest one still
    /// present on the canonical chain, or `None` if none are.
    async fn get_first_valid_transaction(
        &self,
        samples: &[Transaction],
    ) -> Result<Option<Transaction>, LedgerClientError>;

    /// The node's best estimate of the current ledger height. May lag the
    /// true tip; used only to disambiguate "reorg" from "node catching up".
    async fn approximate_height(&self) -> Result<u64, LedgerClientError>;

    /// The fee required to write at `height`, per the ledger's own rules
    /// (distinct from the normalized fee calculator, which is this
    /// service's moving average over observed fees).
    async fn get_fee(&self, height: u64) -> Result<u64, LedgerClientError>;
}
