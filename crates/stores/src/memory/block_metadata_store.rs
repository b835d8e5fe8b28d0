use std::collections::BTreeMap;

use anchor_types::{AnchorResult, BlockMetadata};
use async_trait::async_trait;
use parking_lot::RwLock;

use crate::traits::BlockMetadataStore;

#[derive(Default)]
pub struct InMemoryBlockMetadataStore {
    rows: RwLock<BTreeMap<u64, BlockMetadata>>,
}

impl InMemoryBlockMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlockMetadataStore for InMemoryBlockMetadataStore {
    async fn add(&self, block: BlockMetadata) -> AnchorResult<()> {
        self.rows.write().insert(block.height, block);
        Ok(())
    }

    async fn get(&self, start: u64, end: u64) -> AnchorResult<Vec<BlockMetadata>> {
        Ok(self.rows.read().range(start..end).map(|(_, b)| b.clone()).collect())
    }

    async fn get_last(&self) -> AnchorResult<Option<BlockMetadata>> {
        Ok(self.rows.read().values().next_back().cloned())
    }

    async fn look_back_exponentially(&self, height: u64) -> AnchorResult<Vec<BlockMetadata>> {
        let rows = self.rows.read();
        let mut samples = Vec::new();
        let mut offset: u64 = 0;
        let mut step: u64 = 2;
        loop {
            let Some(h) = height.checked_sub(offset) else { break };
            match rows.get(&h) {
                Some(block) => samples.push(block.clone()),
                None => break,
            }
            offset += step;
            step *= 2;
        }
        Ok(samples)
    }
}
