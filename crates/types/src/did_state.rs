use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The resolved state of a DID, produced lazily by the resolver. Never
/// persisted: every resolve replays the operation log from scratch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DidState {
    pub document: Value,
    pub recovery_key: Option<String>,
    /// Absent after a deactivate; becomes absent together with
    /// `next_update_commitment_hash`.
    pub next_recovery_commitment_hash: Option<String>,
    pub next_update_commitment_hash: Option<String>,
    pub last_operation_transaction_number: i64,
}

impl DidState {
    pub fn is_deactivated(&self) -> bool {
        self.next_recovery_commitment_hash.is_none() && self.next_update_commitment_hash.is_none()
    }
}

/// The outcome of resolving a DID, distinguishing the three user-visible
/// cases from spec §7.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResolutionResult {
    NotFound,
    Deactivated,
    Found(DidState),
}
