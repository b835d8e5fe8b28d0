use serde::{Deserialize, Serialize};

/// The fixed-width scheme used to derive a globally monotonic transaction
/// `number` from `(height, indexInBlock)`. Chosen so `number` alone totally
/// orders transactions without needing a secondary `operationIndex`
/// tie-break (see spec §9 open question on ordering).
pub const TRANSACTIONS_PER_BLOCK_FACTOR: i64 = 1_000_000;

/// Derive the monotonic transaction number from ledger height and the
/// transaction's index within that block.
pub fn transaction_number(height: u64, index_in_block: u32) -> i64 {
    (height as i64) * TRANSACTIONS_PER_BLOCK_FACTOR + index_in_block as i64
}

/// Recover `(height, indexInBlock)` from a transaction number produced by
/// [`transaction_number`].
pub fn split_transaction_number(number: i64) -> (u64, u32) {
    let height = number / TRANSACTIONS_PER_BLOCK_FACTOR;
    let index = number % TRANSACTIONS_PER_BLOCK_FACTOR;
    (height as u64, index as u32)
}

/// An anchored transaction observed on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Monotonic id, totally orders transactions. Derived from
    /// `(time, indexInBlock)` via [`transaction_number`].
    pub number: i64,
    /// Ledger height this transaction was anchored at.
    pub time: u64,
    /// Hash of the block at `time`, used to detect reorgs.
    pub time_hash: String,
    /// The opaque anchor string carried by the transaction.
    pub anchor_string: String,
    /// Fee actually paid by the transaction's writer.
    pub fee_paid: u64,
    /// Normalized fee applicable at `time`, per the fee calculator.
    pub normalized_fee: u64,
    /// Identity of the writer, if known (e.g. an address or public key hash).
    pub writer: Option<String>,
}

impl Transaction {
    pub fn new(
        time: u64,
        index_in_block: u32,
        time_hash: impl Into<String>,
        anchor_string: impl Into<String>,
        fee_paid: u64,
        normalized_fee: u64,
        writer: Option<String>,
    ) -> Self {
        Self {
            number: transaction_number(time, index_in_block),
            time,
            time_hash: time_hash.into(),
            anchor_string: anchor_string.into(),
            fee_paid,
            normalized_fee,
            writer,
        }
    }
}

/// A transaction that could not be processed successfully, awaiting retry
/// under exponential backoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvableTransaction {
    pub transaction: Transaction,
    pub first_fetch_time: chrono::DateTime<chrono::Utc>,
    pub retry_attempts: u32,
    pub next_retry_time: chrono::DateTime<chrono::Utc>,
}

impl UnresolvableTransaction {
    /// Backoff is monotonically non-decreasing in `retryAttempts`:
    /// `now + base * 2^retryAttempts`, capped at `max_delay`.
    pub fn compute_next_retry_time(
        now: chrono::DateTime<chrono::Utc>,
        base: chrono::Duration,
        retry_attempts: u32,
        max_delay: chrono::Duration,
    ) -> chrono::DateTime<chrono::Utc> {
        let factor = 1i64.checked_shl(retry_attempts.min(32)).unwrap_or(i64::MAX);
        let delay = base
            .checked_mul(factor.try_into().unwrap_or(i32::MAX))
            .unwrap_or(max_delay)
            .min(max_delay);
        now + delay
    }
}

/// Per-block summary persisted by the observer as it advances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMetadata {
    pub height: u64,
    pub hash: String,
    pub previous_hash: String,
    pub transaction_count: u64,
    pub total_fee: u64,
    pub normalized_fee: u64,
}
