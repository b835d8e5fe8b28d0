use std::sync::Arc;

use anchor_types::{AnchorError, AnchorResult, OperationQueue};
use anchor_versioning::RequestHandler;
use async_trait::async_trait;

use crate::wire::OperationPayload;

pub struct V1RequestHandler {
    queue: Arc<OperationQueue>,
}

impl V1RequestHandler {
    pub fn new(queue: Arc<OperationQueue>) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl RequestHandler for V1RequestHandler {
    async fn enqueue(&self, did_suffix: String, operation_buffer: Vec<u8>) -> AnchorResult<()> {
        let payload: OperationPayload = serde_json::from_slice(&operation_buffer)
            .map_err(|e| AnchorError::permanent(format!("malformed operation buffer: {e}")))?;

        if payload.did_suffix() != did_suffix {
            return Err(AnchorError::permanent(
                "operation buffer's didSuffix does not match the request".to_string(),
            ));
        }

        self.queue.enqueue(did_suffix, operation_buffer);
        Ok(())
    }
}
