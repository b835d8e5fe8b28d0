//! Self-throttle on the node's own ledger spending (spec §4.6): caps the
//! fees this node has incurred writing anchors over a rolling window of
//! blocks. The `writtenByThisNode` set lives only in memory — a restart
//! under-counts past spending, never over-counts, so it is safe to lose.

use std::collections::HashSet;
use std::sync::Arc;

use anchor_stores::TransactionStore;
use anchor_types::{transaction_number, AnchorResult};
use parking_lot::RwLock;

pub struct SpendingMonitor {
    transaction_store: Arc<dyn TransactionStore>,
    spending_cap: u64,
    spending_period_blocks: u64,
    written_by_this_node: RwLock<HashSet<String>>,
}

impl SpendingMonitor {
    pub fn new(
        transaction_store: Arc<dyn TransactionStore>,
        spending_cap: u64,
        spending_period_blocks: u64,
    ) -> Self {
        Self {
            transaction_store,
            spending_cap,
            spending_period_blocks,
            written_by_this_node: RwLock::new(HashSet::new()),
        }
    }

    /// Call once a write for `anchor_string` has been submitted to the
    /// ledger, so future spending checks account for it.
    pub fn record_written(&self, anchor_string: String) {
        self.written_by_this_node.write().insert(anchor_string);
    }

    pub async fn is_current_fee_within_limit(
        &self,
        fee_to_add: u64,
        last_processed_height: u64,
    ) -> AnchorResult<bool> {
        if self.spending_period_blocks <= 1 {
            return Ok(fee_to_add <= self.spending_cap);
        }

        let floor_height = last_processed_height.saturating_sub(self.spending_period_blocks + 1);
        let since_number = if floor_height == 0 {
            None
        } else {
            Some(transaction_number(floor_height, 0) - 1)
        };

        let transactions =
            self.transaction_store.get_transactions_later_than(since_number, None).await?;

        let written = self.written_by_this_node.read();
        let spent: u64 = transactions
            .iter()
            .filter(|tx| written.contains(&tx.anchor_string))
            .map(|tx| tx.fee_paid)
            .sum();

        Ok(spent + fee_to_add <= self.spending_cap)
    }
}

#[cfg(test)]
mod tests {
    use anchor_stores::memory::InMemoryTransactionStore;
    use anchor_types::Transaction;

    use super::*;

    fn tx(number: i64, height: u64, anchor_string: &str, fee: u64) -> Transaction {
        Transaction {
            number,
            time: height,
            time_hash: format!("h{height}"),
            anchor_string: anchor_string.to_string(),
            fee_paid: fee,
            normalized_fee: fee,
            writer: None,
        }
    }

    #[tokio::test]
    async fn single_block_period_only_checks_the_new_fee() {
        let store = Arc::new(InMemoryTransactionStore::new());
        let monitor = SpendingMonitor::new(store, 100, 1);
        assert!(monitor.is_current_fee_within_limit(100, 5000).await.unwrap());
        assert!(!monitor.is_current_fee_within_limit(101, 5000).await.unwrap());
    }

    #[tokio::test]
    async fn rejects_when_rolling_window_spend_would_exceed_cap() {
        let store = Arc::new(InMemoryTransactionStore::new());
        store
            .add_transaction(tx(transaction_number(4901, 0), 4901, "0.a", 100_000_000))
            .await
            .unwrap();
        store
            .add_transaction(tx(transaction_number(4950, 0), 4950, "0.b", 100_000_000))
            .await
            .unwrap();

        let monitor = SpendingMonitor::new(store, 300_000_000, 100);
        monitor.record_written("0.a".to_string());
        monitor.record_written("0.b".to_string());

        assert!(!monitor.is_current_fee_within_limit(101_000_000, 5000).await.unwrap());
        assert!(monitor.is_current_fee_within_limit(50_000_000, 5000).await.unwrap());
    }

    #[tokio::test]
    async fn ignores_fees_not_written_by_this_node() {
        let store = Arc::new(InMemoryTransactionStore::new());
        store
            .add_transaction(tx(transaction_number(4950, 0), 4950, "0.someone-else", 250_000_000))
            .await
            .unwrap();

        let monitor = SpendingMonitor::new(store, 300_000_000, 100);
        assert!(monitor.is_current_fee_within_limit(100_000_000, 5000).await.unwrap());
    }
}
