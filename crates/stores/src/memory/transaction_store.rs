use std::collections::BTreeMap;

use anchor_types::{AnchorResult, Transaction};
use async_trait::async_trait;
use parking_lot::RwLock;

use crate::traits::TransactionStore;

/// Reference `TransactionStore` backed by an in-process `BTreeMap`, keyed
/// by `Transaction::number` so ascending iteration is free. Used by tests
/// and the dev binary in place of a real database.
#[derive(Default)]
pub struct InMemoryTransactionStore {
    rows: RwLock<BTreeMap<i64, Transaction>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn add_transaction(&self, transaction: Transaction) -> AnchorResult<()> {
        self.rows.write().insert(transaction.number, transaction);
        Ok(())
    }

    async fn get_last_transaction(&self) -> AnchorResult<Option<Transaction>> {
        Ok(self.rows.read().values().next_back().cloned())
    }

    async fn get_transactions_later_than(
        &self,
        since_number: Option<i64>,
        max: Option<usize>,
    ) -> AnchorResult<Vec<Transaction>> {
        let rows = self.rows.read();
        let iter = rows
            .iter()
            .filter(|(number, _)| since_number.map_or(true, |since| **number > since))
            .map(|(_, tx)| tx.clone());
        Ok(match max {
            Some(max) => iter.take(max).collect(),
            None => iter.collect(),
        })
    }

    async fn get_exponentially_spaced_transactions(&self) -> AnchorResult<Vec<Transaction>> {
        let rows = self.rows.read();
        let descending: Vec<&Transaction> = rows.values().rev().collect();
        let mut samples = Vec::new();
        let mut offset = 0usize;
        let mut step = 2usize;
        loop {
            match descending.get(offset) {
                Some(tx) => samples.push((*tx).clone()),
                None => break,
            }
            offset += step;
            step *= 2;
        }
        Ok(samples)
    }

    async fn delete_transactions_later_than(&self, above_number: i64) -> AnchorResult<()> {
        self.rows.write().retain(|number, _| *number <= above_number);
        Ok(())
    }

    async fn transaction_count(&self) -> AnchorResult<usize> {
        Ok(self.rows.read().len())
    }

    async fn count_at_height(&self, height: u64) -> AnchorResult<usize> {
        Ok(self.rows.read().values().filter(|tx| tx.time == height).count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(number: i64) -> Transaction {
        Transaction {
            number,
            time: number as u64,
            time_hash: format!("hash-{number}"),
            anchor_string: format!("{number}.Qm"),
            fee_paid: 1,
            normalized_fee: 1,
            writer: None,
        }
    }

    #[tokio::test]
    async fn exponential_sample_matches_spec_scenario() {
        let store = InMemoryTransactionStore::new();
        for n in 0..=1000i64 {
            store.add_transaction(tx(n)).await.unwrap();
        }
        let samples = store.get_exponentially_spaced_transactions().await.unwrap();
        let numbers: Vec<i64> = samples.iter().map(|t| t.number).collect();
        assert_eq!(&numbers[..4], &[1000, 998, 994, 986]);
    }

    #[tokio::test]
    async fn delete_later_than_prunes_tail() {
        let store = InMemoryTransactionStore::new();
        for n in 0..10i64 {
            store.add_transaction(tx(n)).await.unwrap();
        }
        store.delete_transactions_later_than(5).await.unwrap();
        assert_eq!(store.transaction_count().await.unwrap(), 6);
        let last = store.get_last_transaction().await.unwrap().unwrap();
        assert_eq!(last.number, 5);
    }
}
