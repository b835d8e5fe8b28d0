use std::collections::HashMap;

use anchor_types::AnchorResult;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use crate::traits::ServiceStateStore;

#[derive(Default)]
pub struct InMemoryServiceStateStore {
    rows: RwLock<HashMap<String, Value>>,
}

impl InMemoryServiceStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ServiceStateStore for InMemoryServiceStateStore {
    async fn get(&self, key: &str) -> AnchorResult<Option<Value>> {
        Ok(self.rows.read().get(key).cloned())
    }

    async fn put(&self, key: &str, value: Value) -> AnchorResult<()> {
        self.rows.write().insert(key.to_string(), value);
        Ok(())
    }
}
