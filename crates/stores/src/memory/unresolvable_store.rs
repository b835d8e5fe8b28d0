use std::collections::BTreeMap;

use anchor_types::{AnchorResult, UnresolvableTransaction};
use async_trait::async_trait;
use parking_lot::RwLock;

use crate::traits::UnresolvableTransactionStore;

#[derive(Default)]
pub struct InMemoryUnresolvableTransactionStore {
    rows: RwLock<BTreeMap<i64, UnresolvableTransaction>>,
}

impl InMemoryUnresolvableTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UnresolvableTransactionStore for InMemoryUnresolvableTransactionStore {
    async fn record_as_unresolvable(&self, entry: UnresolvableTransaction) -> AnchorResult<()> {
        self.rows.write().insert(entry.transaction.number, entry);
        Ok(())
    }

    async fn remove(&self, transaction_number: i64) -> AnchorResult<()> {
        self.rows.write().remove(&transaction_number);
        Ok(())
    }

    async fn get_unresolvable_transactions_due_for_retry(
        &self,
        max: Option<usize>,
    ) -> AnchorResult<Vec<UnresolvableTransaction>> {
        let now = chrono::Utc::now();
        let rows = self.rows.read();
        let iter = rows.values().filter(|entry| entry.next_retry_time <= now).cloned();
        Ok(match max {
            Some(max) => iter.take(max).collect(),
            None => iter.collect(),
        })
    }

    async fn delete_transactions_later_than(&self, above_number: i64) -> AnchorResult<()> {
        self.rows.write().retain(|number, _| *number <= above_number);
        Ok(())
    }
}
