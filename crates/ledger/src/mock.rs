//! In-memory stand-ins for `LedgerClient` and `CasClient`, used by the
//! observer/batch-writer test suites the way `testing-tools` mocks reth's
//! provider in the teacher repo.

use std::collections::HashMap;

use anchor_types::Transaction;
use async_trait::async_trait;
use parking_lot::RwLock;

use crate::{
    cas_client::{CasClient, CasError, CasFetchCode, FetchResult},
    ledger_client::{LedgerClient, LedgerClientError, ReadResult},
};

/// A ledger that can be appended to and truncated (simulating a reorg) by
/// the test driving it.
#[derive(Default)]
pub struct MockLedgerClient {
    transactions: RwLock<Vec<Transaction>>,
    approximate_height: RwLock<u64>,
}

impl MockLedgerClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, transaction: Transaction) {
        let mut guard = self.transactions.write();
        let height = transaction.time;
        guard.push(transaction);
        let mut approx = self.approximate_height.write();
        *approx = (*approx).max(height);
    }

    pub fn set_approximate_height(&self, height: u64) {
        *self.approximate_height.write() = height;
    }

    /// Simulate a reorg: drop every transaction with `number > keep_number`
    /// and replace the tail with `replacement`.
    pub fn reorg_to(&self, keep_number: i64, replacement: Vec<Transaction>) {
        let mut guard = self.transactions.write();
        guard.retain(|tx| tx.number <= keep_number);
        guard.extend(replacement);
    }
}

#[async_trait]
impl LedgerClient for MockLedgerClient {
    async fn read(
        &self,
        since_number: Option<i64>,
        since_time_hash: Option<String>,
    ) -> Result<ReadResult, LedgerClientError> {
        let guard = self.transactions.read();

        if let (Some(number), Some(time_hash)) = (since_number, &since_time_hash) {
            let cursor_still_valid = guard.iter().any(|tx| tx.number == number && &tx.time_hash == time_hash);
            if !cursor_still_valid && guard.iter().any(|tx| tx.number == number) {
                return Err(LedgerClientError::InvalidTransactionNumberOrTimeHash {
                    number: since_number,
                    time_hash: since_time_hash,
                });
            }
            if !cursor_still_valid && !guard.is_empty() && guard.iter().all(|tx| tx.number != number) {
                // cursor number does not exist at all anymore: also a reorg signal.
                return Err(LedgerClientError::InvalidTransactionNumberOrTimeHash {
                    number: since_number,
                    time_hash: since_time_hash,
                });
            }
        }

        let transactions: Vec<Transaction> = guard
            .iter()
            .filter(|tx| since_number.map_or(true, |since| tx.number > since))
            .cloned()
            .collect();

        Ok(ReadResult { transactions, more_transactions: false })
    }

    async fn write(&self, anchor_string: &str, fee: u64) -> Result<(), LedgerClientError> {
        let height = *self.approximate_height.read() + 1;
        let number = {
            let guard = self.transactions.read();
            guard.iter().map(|t| t.number).max().unwrap_or(-1) + 1
        };
        self.push(Transaction {
            number,
            time: height,
            time_hash: format!("mock-hash-{height}"),
            anchor_string: anchor_string.to_string(),
            fee_paid: fee,
            normalized_fee: fee,
            writer: Some("self".to_string()),
        });
        Ok(())
    }

    async fn get_first_valid_transaction(
        &self,
        samples: &[Transaction],
    ) -> Result<Option<Transaction>, LedgerClientError> {
        let guard = self.transactions.read();
        for sample in samples {
            if guard.iter().any(|tx| tx.number == sample.number && tx.time_hash == sample.time_hash) {
                return Ok(Some(sample.clone()));
            }
        }
        Ok(None)
    }

    async fn approximate_height(&self) -> Result<u64, LedgerClientError> {
        Ok(*self.approximate_height.read())
    }

    async fn get_fee(&self, _height: u64) -> Result<u64, LedgerClientError> {
        Ok(1)
    }
}

/// An in-memory content-addressed store keyed by a hex digest of the
/// content, good enough to exercise `DownloadManager` and `BatchWriter`.
#[derive(Default)]
pub struct MockCasClient {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MockCasClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn hash(bytes: &[u8]) -> String {
        use sha2::{Digest, Sha256};
        let digest = Sha256::digest(bytes);
        hex::encode(digest)
    }
}

#[async_trait]
impl CasClient for MockCasClient {
    async fn read(&self, hash: &str, max_bytes: usize) -> Result<FetchResult, CasError> {
        let blobs = self.blobs.read();
        match blobs.get(hash) {
            None => Ok(FetchResult { code: CasFetchCode::NotFound, content: None }),
            Some(bytes) if bytes.len() > max_bytes => {
                Ok(FetchResult { code: CasFetchCode::MaxSizeExceeded, content: None })
            }
            Some(bytes) => Ok(FetchResult { code: CasFetchCode::Success, content: Some(bytes.clone()) }),
        }
    }

    async fn write(&self, bytes: Vec<u8>) -> Result<String, CasError> {
        let hash = Self::hash(&bytes);
        self.blobs.write().insert(hash.clone(), bytes);
        Ok(hash)
    }
}
