use std::collections::HashMap;

use parking_lot::Mutex;

use crate::operation::QueuedOperation;

/// Shared queue of operations awaiting the next batch. At most one entry
/// per `did_suffix` (spec §3): a later enqueue for the same suffix
/// replaces the earlier one rather than appending. `RequestHandler`
/// implementations push into this; `BatchWriter` drains it atomically.
#[derive(Default)]
pub struct OperationQueue {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl OperationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, did_suffix: String, operation_buffer: Vec<u8>) {
        self.entries.lock().insert(did_suffix, operation_buffer);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Atomically remove up to `max` entries and return them as
    /// `QueuedOperation`s, in no particular order (the batch writer does
    /// not depend on ordering among distinct DIDs).
    pub fn dequeue_batch(&self, max: usize) -> Vec<QueuedOperation> {
        let mut entries = self.entries.lock();
        let keys: Vec<String> = entries.keys().take(max).cloned().collect();
        keys.into_iter()
            .filter_map(|did_suffix| {
                entries
                    .remove(&did_suffix)
                    .map(|operation_buffer| QueuedOperation { did_suffix, operation_buffer })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueue_replaces_existing_entry_for_same_suffix() {
        let queue = OperationQueue::new();
        queue.enqueue("abc".to_string(), vec![1]);
        queue.enqueue("abc".to_string(), vec![2]);
        assert_eq!(queue.len(), 1);
        let batch = queue.dequeue_batch(10);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].operation_buffer, vec![2]);
    }

    #[test]
    fn dequeue_batch_respects_max_and_empties_on_full_drain() {
        let queue = OperationQueue::new();
        for i in 0..5 {
            queue.enqueue(format!("did-{i}"), vec![i as u8]);
        }
        let first = queue.dequeue_batch(3);
        assert_eq!(first.len(), 3);
        assert_eq!(queue.len(), 2);
        let rest = queue.dequeue_batch(10);
        assert_eq!(rest.len(), 2);
        assert!(queue.is_empty());
    }
}
