use serde::{Deserialize, Serialize};

/// The configuration record consumed by the core (spec §6). CLI/env loading
/// is ambient plumbing, implemented in `anchor-config`; this is the shape
/// the core itself depends on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub max_concurrent_cas_downloads: usize,
    pub observing_interval_seconds: u64,
    pub batching_interval_seconds: u64,
    pub genesis_height: u64,
    pub fee_look_back_blocks: u64,
    pub fee_max_fluctuation_multiplier: f64,
    pub initial_normalized_fee: u64,
    pub spending_cap: u64,
    pub spending_period_blocks: u64,
    pub value_time_lock_duration_blocks: u64,
    pub max_operations_per_batch: u32,
    pub max_transactions_per_height: u32,
    pub max_operations_per_height: u32,
    pub did_method_name: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_concurrent_cas_downloads: 20,
            observing_interval_seconds: 5,
            batching_interval_seconds: 10,
            genesis_height: 1,
            fee_look_back_blocks: 100,
            fee_max_fluctuation_multiplier: 0.000002,
            initial_normalized_fee: 1,
            spending_cap: 1_000_000_000,
            spending_period_blocks: 100,
            value_time_lock_duration_blocks: 17_280,
            max_operations_per_batch: 10_000,
            max_transactions_per_height: 100,
            max_operations_per_height: 10_000,
            did_method_name: "example".to_string(),
        }
    }
}
