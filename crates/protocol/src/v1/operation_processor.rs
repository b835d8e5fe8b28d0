use anchor_types::{AnchoredOperation, DidState};
use anchor_versioning::OperationProcessor;

use crate::{commitment::commitment_hash, wire::OperationPayload};

pub struct V1OperationProcessor;

impl V1OperationProcessor {
    fn parse(operation: &AnchoredOperation) -> Option<OperationPayload> {
        serde_json::from_slice(&operation.operation_buffer).ok()
    }
}

impl OperationProcessor for V1OperationProcessor {
    fn reveal_commitment_hash(&self, operation: &AnchoredOperation) -> Option<String> {
        let payload = Self::parse(operation)?;
        let reveal_value = payload.reveal_value()?;
        Some(commitment_hash(reveal_value.as_bytes()))
    }

    fn apply_create(&self, operation: &AnchoredOperation) -> Option<DidState> {
        let payload = Self::parse(operation)?;
        let OperationPayload::Create {
            did_suffix: _,
            document,
            recovery_key,
            next_recovery_commitment_hash,
            next_update_commitment_hash,
        } = payload
        else {
            return None;
        };

        Some(DidState {
            document,
            recovery_key: Some(recovery_key),
            next_recovery_commitment_hash: Some(next_recovery_commitment_hash),
            next_update_commitment_hash: Some(next_update_commitment_hash),
            last_operation_transaction_number: operation.transaction_number,
        })
    }

    fn apply_operation(&self, state: &DidState, operation: &AnchoredOperation) -> Option<DidState> {
        let payload = Self::parse(operation)?;
        if payload.operation_type() != operation.operation_type {
            return None;
        }

        match payload {
            OperationPayload::Create { .. } => None,
            OperationPayload::Update { reveal_value, patch, next_update_commitment_hash, .. } => {
                let expected = state.next_update_commitment_hash.as_deref()?;
                if commitment_hash(reveal_value.as_bytes()) != expected {
                    return None;
                }
                let mut document = state.document.clone();
                merge_patch(&mut document, &patch);
                Some(DidState {
                    document,
                    recovery_key: state.recovery_key.clone(),
                    next_recovery_commitment_hash: state.next_recovery_commitment_hash.clone(),
                    next_update_commitment_hash: Some(next_update_commitment_hash),
                    last_operation_transaction_number: operation.transaction_number,
                })
            }
            OperationPayload::Recover {
                reveal_value,
                document,
                recovery_key,
                next_recovery_commitment_hash,
                next_update_commitment_hash,
                ..
            } => {
                let expected = state.next_recovery_commitment_hash.as_deref()?;
                if commitment_hash(reveal_value.as_bytes()) != expected {
                    return None;
                }
                Some(DidState {
                    document,
                    recovery_key: Some(recovery_key),
                    next_recovery_commitment_hash: Some(next_recovery_commitment_hash),
                    next_update_commitment_hash: Some(next_update_commitment_hash),
                    last_operation_transaction_number: operation.transaction_number,
                })
            }
            OperationPayload::Deactivate { reveal_value, .. } => {
                let expected = state.next_recovery_commitment_hash.as_deref()?;
                if commitment_hash(reveal_value.as_bytes()) != expected {
                    return None;
                }
                Some(DidState {
                    document: state.document.clone(),
                    recovery_key: state.recovery_key.clone(),
                    next_recovery_commitment_hash: None,
                    next_update_commitment_hash: None,
                    last_operation_transaction_number: operation.transaction_number,
                })
            }
        }
    }
}

/// Shallow merge of `patch`'s top-level keys into `document`, the only
/// patch semantics this version supports.
fn merge_patch(document: &mut serde_json::Value, patch: &serde_json::Value) {
    if let (Some(doc_obj), Some(patch_obj)) = (document.as_object_mut(), patch.as_object()) {
        for (key, value) in patch_obj {
            doc_obj.insert(key.clone(), value.clone());
        }
    }
}
