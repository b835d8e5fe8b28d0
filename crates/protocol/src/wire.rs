//! The v1 on-the-wire JSON schema for operations and batch files. A real
//! protocol version would use a compact binary encoding; JSON keeps this
//! implementation's shape legible while the wire format itself is not the
//! subject of the specification.

use anchor_types::OperationType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OperationPayload {
    Create {
        did_suffix: String,
        document: Value,
        recovery_key: String,
        next_recovery_commitment_hash: String,
        next_update_commitment_hash: String,
    },
    Update {
        did_suffix: String,
        reveal_value: String,
        patch: Value,
        next_update_commitment_hash: String,
    },
    Recover {
        did_suffix: String,
        reveal_value: String,
        document: Value,
        recovery_key: String,
        next_recovery_commitment_hash: String,
        next_update_commitment_hash: String,
    },
    Deactivate { did_suffix: String, reveal_value: String },
}

impl OperationPayload {
    pub fn did_suffix(&self) -> &str {
        match self {
            Self::Create { did_suffix, .. }
            | Self::Update { did_suffix, .. }
            | Self::Recover { did_suffix, .. }
            | Self::Deactivate { did_suffix, .. } => did_suffix,
        }
    }

    pub fn operation_type(&self) -> OperationType {
        match self {
            Self::Create { .. } => OperationType::Create,
            Self::Update { .. } => OperationType::Update,
            Self::Recover { .. } => OperationType::Recover,
            Self::Deactivate { .. } => OperationType::Deactivate,
        }
    }

    pub fn reveal_value(&self) -> Option<&str> {
        match self {
            Self::Create { .. } => None,
            Self::Update { reveal_value, .. }
            | Self::Recover { reveal_value, .. }
            | Self::Deactivate { reveal_value, .. } => Some(reveal_value),
        }
    }
}

/// One entry in the core index file: identifies the DID and operation type
/// without carrying the operation payload itself (that lives in the chunk
/// file, at the same index).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreIndexEntry {
    pub did_suffix: String,
    pub operation_type: OperationType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreIndexFile {
    pub operations: Vec<CoreIndexEntry>,
    pub chunk_file_hash: String,
}

/// The chunk file holds the raw operation buffers, aligned index-for-index
/// with `CoreIndexFile::operations`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkFile {
    pub operation_buffers: Vec<Vec<u8>>,
}
