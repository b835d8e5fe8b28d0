use std::collections::HashMap;

use anchor_types::{AnchorResult, AnchoredOperation};
use async_trait::async_trait;
use parking_lot::RwLock;

use crate::traits::OperationStore;

#[derive(Default)]
pub struct InMemoryOperationStore {
    by_suffix: RwLock<HashMap<String, Vec<AnchoredOperation>>>,
}

impl InMemoryOperationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OperationStore for InMemoryOperationStore {
    async fn put(&self, operations: Vec<AnchoredOperation>) -> AnchorResult<()> {
        let mut by_suffix = self.by_suffix.write();
        for op in operations {
            by_suffix.entry(op.did_suffix.clone()).or_default().push(op);
        }
        Ok(())
    }

    async fn get(&self, did_suffix: &str) -> AnchorResult<Vec<AnchoredOperation>> {
        let by_suffix = self.by_suffix.read();
        let mut ops = by_suffix.get(did_suffix).cloned().unwrap_or_default();
        ops.sort_by_key(|op| op.ordering_key());
        Ok(ops)
    }

    async fn delete_later_than(&self, above_number: Option<i64>) -> AnchorResult<()> {
        let mut by_suffix = self.by_suffix.write();
        for ops in by_suffix.values_mut() {
            ops.retain(|op| above_number.map_or(false, |above| op.transaction_number <= above));
        }
        Ok(())
    }

    async fn count_at_height(&self, height: u64) -> AnchorResult<usize> {
        let by_suffix = self.by_suffix.read();
        Ok(by_suffix
            .values()
            .flatten()
            .filter(|op| op.transaction_time == height)
            .count())
    }
}
