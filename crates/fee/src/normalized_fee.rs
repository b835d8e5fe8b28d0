//! Normalized fee calculation (spec §4.5): a moving average over a
//! look-back window of block metadata, clamped to bound how fast the
//! per-transaction fee can drift block to block.

use std::sync::Arc;

use anchor_stores::BlockMetadataStore;
use anchor_types::{AnchorResult, BlockMetadata};
use parking_lot::Mutex;

pub struct NormalizedFeeCalculator {
    block_metadata_store: Arc<dyn BlockMetadataStore>,
    genesis_height: u64,
    look_back_blocks: u64,
    max_fluctuation_multiplier: f64,
    initial_normalized_fee: u64,
    /// `(height this window services, the look-back window itself)`.
    cache: Mutex<Option<(u64, Vec<BlockMetadata>)>>,
}

impl NormalizedFeeCalculator {
    pub fn new(
        block_metadata_store: Arc<dyn BlockMetadataStore>,
        genesis_height: u64,
        look_back_blocks: u64,
        max_fluctuation_multiplier: f64,
        initial_normalized_fee: u64,
    ) -> Self {
        Self {
            block_metadata_store,
            genesis_height,
            look_back_blocks,
            max_fluctuation_multiplier,
            initial_normalized_fee,
            cache: Mutex::new(None),
        }
    }

    pub async fn normalized_fee_at(&self, height: u64) -> AnchorResult<u64> {
        if height < self.genesis_height {
            return Ok(0);
        }
        if height < self.genesis_height + self.look_back_blocks {
            return Ok(self.initial_normalized_fee);
        }

        let window = self.look_back_window(height).await?;
        let total_fee: u128 = window.iter().map(|b| b.total_fee as u128).sum();
        let total_count: u128 = window.iter().map(|b| b.transaction_count as u128).sum();
        if total_count == 0 {
            return Ok(self.initial_normalized_fee);
        }
        let unadjusted = (total_fee / total_count) as u64;

        let previous = window.last().map(|b| b.normalized_fee).unwrap_or(self.initial_normalized_fee);
        let lower = (previous as f64 * (1.0 - self.max_fluctuation_multiplier)).floor() as u64;
        let upper = (previous as f64 * (1.0 + self.max_fluctuation_multiplier)).floor() as u64;

        Ok(unadjusted.clamp(lower, upper))
    }

    async fn look_back_window(&self, height: u64) -> AnchorResult<Vec<BlockMetadata>> {
        {
            let cache = self.cache.lock();
            if let Some((cached_height, blocks)) = cache.as_ref() {
                if *cached_height == height && blocks.len() as u64 == self.look_back_blocks {
                    return Ok(blocks.clone());
                }
            }
        }

        let start = height - self.look_back_blocks;
        let blocks = self.block_metadata_store.get(start, height).await?;
        *self.cache.lock() = Some((height, blocks.clone()));
        Ok(blocks)
    }
}

#[cfg(test)]
mod tests {
    use anchor_stores::memory::InMemoryBlockMetadataStore;

    use super::*;

    fn block(height: u64, total_fee: u64, transaction_count: u64, normalized_fee: u64) -> BlockMetadata {
        BlockMetadata {
            height,
            hash: format!("h{height}"),
            previous_hash: format!("h{}", height.wrapping_sub(1)),
            transaction_count,
            total_fee,
            normalized_fee,
        }
    }

    #[tokio::test]
    async fn below_genesis_is_zero() {
        let store = Arc::new(InMemoryBlockMetadataStore::default());
        let calc = NormalizedFeeCalculator::new(store, 100, 10, 0.02, 1);
        assert_eq!(calc.normalized_fee_at(50).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn within_warmup_window_is_initial_fee() {
        let store = Arc::new(InMemoryBlockMetadataStore::default());
        let calc = NormalizedFeeCalculator::new(store, 100, 10, 0.02, 7);
        assert_eq!(calc.normalized_fee_at(105).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn unadjusted_average_within_bounds_passes_through() {
        let store = Arc::new(InMemoryBlockMetadataStore::default());
        for h in 97..100 {
            store.add(block(h, 100, 10, 10)).await.unwrap();
        }
        let calc = NormalizedFeeCalculator::new(store, 1, 3, 0.5, 1);
        // window [97,100): totalFee=300, count=30 -> unadjusted = 10, previous = 10.
        assert_eq!(calc.normalized_fee_at(100).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn large_jump_clamps_to_upper_bound() {
        let store = Arc::new(InMemoryBlockMetadataStore::default());
        store.add(block(97, 1_000, 10, 1_000)).await.unwrap();
        store.add(block(98, 1_000, 10, 1_000)).await.unwrap();
        store.add(block(99, 100_000, 10, 1_000)).await.unwrap();
        let calc = NormalizedFeeCalculator::new(store, 1, 3, 0.1, 1);
        // unadjusted = 102_000/30 = 3_400; upper bound = floor(1_000 * 1.1) = 1_100.
        let fee = calc.normalized_fee_at(100).await.unwrap();
        assert_eq!(fee, 1_100);
    }

    #[tokio::test]
    async fn cache_is_reused_for_the_same_height() {
        let store = Arc::new(InMemoryBlockMetadataStore::default());
        for h in 97..100 {
            store.add(block(h, 100, 10, 10)).await.unwrap();
        }
        let calc = NormalizedFeeCalculator::new(store.clone(), 1, 3, 0.5, 1);
        assert_eq!(calc.normalized_fee_at(100).await.unwrap(), 10);
        // Mutate the store after the first call; a cache hit must not see it.
        store.add(block(99, 999_999, 1, 999_999)).await.unwrap();
        assert_eq!(calc.normalized_fee_at(100).await.unwrap(), 10);
    }
}
