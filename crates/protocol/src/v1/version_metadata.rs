use anchor_versioning::VersionMetadata;

pub struct V1VersionMetadata {
    pub max_operations_per_batch: u32,
}

impl V1VersionMetadata {
    pub fn new(max_operations_per_batch: u32) -> Self {
        Self { max_operations_per_batch }
    }
}

impl VersionMetadata for V1VersionMetadata {
    fn hash_algorithm_code(&self) -> u64 {
        // sha2-256, per the multicodec table.
        0x12
    }

    fn max_operations_per_batch(&self) -> u32 {
        self.max_operations_per_batch
    }

    fn max_core_index_file_size_bytes(&self) -> usize {
        1_000_000
    }

    fn max_chunk_file_size_bytes(&self) -> usize {
        10_000_000
    }

    fn max_operation_size_bytes(&self) -> usize {
        50_000
    }
}
