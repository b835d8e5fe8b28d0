use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Create,
    Update,
    Recover,
    Deactivate,
}

/// One operation anchored for a given DID suffix. Immutable once persisted;
/// ordering key is `(transaction_number, operation_index)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchoredOperation {
    pub did_suffix: String,
    pub operation_type: OperationType,
    pub transaction_time: u64,
    pub transaction_number: i64,
    pub operation_index: u32,
    pub operation_buffer: Vec<u8>,
}

impl AnchoredOperation {
    /// Ordering key used everywhere operations must be sorted: ascending
    /// `(transaction_number, operation_index)`.
    pub fn ordering_key(&self) -> (i64, u32) {
        (self.transaction_number, self.operation_index)
    }
}

/// A single operation waiting to be included in the next batch. At most one
/// queued entry may exist per `did_suffix` at any time; enforced by the
/// queue, not this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedOperation {
    pub did_suffix: String,
    pub operation_buffer: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(number: i64, index: u32) -> AnchoredOperation {
        AnchoredOperation {
            did_suffix: "abc".to_string(),
            operation_type: OperationType::Update,
            transaction_time: 100,
            transaction_number: number,
            operation_index: index,
            operation_buffer: vec![],
        }
    }

    #[test]
    fn ordering_key_sorts_by_number_then_index() {
        let mut ops = vec![op(5, 2), op(5, 0), op(3, 9), op(5, 1)];
        ops.sort_by_key(|o| o.ordering_key());
        let keys: Vec<_> = ops.iter().map(|o| o.ordering_key()).collect();
        assert_eq!(keys, vec![(3, 9), (5, 0), (5, 1), (5, 2)]);
    }
}
