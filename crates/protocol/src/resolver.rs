//! The pure resolver (spec §4.3): replays an ordered operation log into a
//! `ResolutionResult` with no I/O beyond the initial fetch. Every operation
//! is applied through the `OperationProcessor` registered for the protocol
//! version active at that operation's transaction time, so a resolve can
//! span a version upgrade without special-casing it here.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use anchor_types::{AnchoredOperation, DidState, OperationType, ResolutionResult};
use tracing::warn;

/// Looks up the `OperationProcessor` valid at a height. Implemented by
/// `VersioningDispatcher`; kept as its own trait so the resolver does not
/// need the rest of `VersionMetadataFetcher`'s surface.
pub trait OperationProcessorFetcher: Send + Sync {
    fn operation_processor_at(
        &self,
        height: u64,
    ) -> anchor_types::AnchorResult<Arc<dyn anchor_versioning::OperationProcessor>>;
}

impl OperationProcessorFetcher for anchor_versioning::VersioningDispatcher {
    fn operation_processor_at(
        &self,
        height: u64,
    ) -> anchor_types::AnchorResult<Arc<dyn anchor_versioning::OperationProcessor>> {
        Ok(self.version_at(height)?.operation_processor.clone())
    }
}

/// Replays `operations` (already fetched for a single DID suffix, any
/// order) into a `ResolutionResult`.
pub fn resolve(
    operations: Vec<AnchoredOperation>,
    processors: &dyn OperationProcessorFetcher,
) -> ResolutionResult {
    let mut operations = operations;
    operations.sort_by_key(|op| op.ordering_key());

    let creates: Vec<&AnchoredOperation> =
        operations.iter().filter(|op| op.operation_type == OperationType::Create).collect();

    let Some(mut state) = creates.iter().find_map(|op| apply_create(*op, processors)) else {
        return ResolutionResult::NotFound;
    };

    let recovery_map = commitment_map(&operations, processors, |t| {
        matches!(t, OperationType::Recover | OperationType::Deactivate)
    });
    let update_map = commitment_map(&operations, processors, |t| t == OperationType::Update);

    loop {
        let Some(hash) = state.next_recovery_commitment_hash.clone() else { break };
        let Some(candidates) = recovery_map.get(&hash) else { break };

        match apply_first_valid(&state, candidates, processors) {
            Some(next) => {
                let deactivated = next.is_deactivated();
                state = next;
                if deactivated {
                    return ResolutionResult::Deactivated;
                }
            }
            None => break,
        }
    }

    loop {
        let Some(hash) = state.next_update_commitment_hash.clone() else { break };
        let Some(candidates) = update_map.get(&hash) else { break };

        match apply_first_valid(&state, candidates, processors) {
            Some(next) => state = next,
            None => break,
        }
    }

    if state.is_deactivated() {
        ResolutionResult::Deactivated
    } else {
        ResolutionResult::Found(state)
    }
}

fn apply_create(
    operation: &AnchoredOperation,
    processors: &dyn OperationProcessorFetcher,
) -> Option<DidState> {
    let processor = processors.operation_processor_at(operation.transaction_time).ok()?;
    guarded(|| processor.apply_create(operation))
}

/// Groups operations of the given types by the commitment hash their
/// *previous* operation in the chain must reveal, i.e. the key the resolver
/// matches against `state.next_{recovery,update}_commitment_hash`. Built
/// from `reveal_commitment_hash`, so an operation with no usable reveal
/// value (malformed payload) is simply absent from the map. Ties — two
/// operations revealing the same commitment — keep all candidates; callers
/// resolve them by `transaction_number` ascending.
fn commitment_map(
    operations: &[AnchoredOperation],
    processors: &dyn OperationProcessorFetcher,
    want: impl Fn(OperationType) -> bool,
) -> HashMap<String, Vec<AnchoredOperation>> {
    let mut by_hash: HashMap<String, Vec<AnchoredOperation>> = HashMap::new();
    for op in operations.iter().filter(|op| want(op.operation_type)) {
        let Ok(processor) = processors.operation_processor_at(op.transaction_time) else { continue };
        let Some(hash) = guarded(|| processor.reveal_commitment_hash(op)) else { continue };
        by_hash.entry(hash).or_default().push(op.clone());
    }
    by_hash
}

/// Applies the first candidate whose result is a *strictly new* state, per
/// spec §4.3: `lastOperationTransactionNumber` must increase. An operation
/// that parses and reveals correctly but yields a state that does not
/// advance (e.g. an adversarial op whose own reveal matches its own next
/// commitment, which would otherwise re-match this same map entry forever)
/// is treated as inapplicable rather than accepted, so the recover/update
/// chase always terminates.
fn apply_first_valid(
    state: &DidState,
    candidates: &[AnchoredOperation],
    processors: &dyn OperationProcessorFetcher,
) -> Option<DidState> {
    let mut candidates: Vec<&AnchoredOperation> = candidates.iter().collect();
    candidates.sort_by_key(|op| op.ordering_key());

    for op in candidates {
        let Ok(processor) = processors.operation_processor_at(op.transaction_time) else { continue };
        if let Some(next) = guarded(|| processor.apply_operation(state, op)) {
            if next.last_operation_transaction_number > state.last_operation_transaction_number {
                return Some(next);
            }
        }
    }
    None
}

/// Isolates one operation's failure (a malformed payload triggering a panic
/// deep in a version's codec, not just the `None` the trait contract
/// expects) from the rest of the resolve.
fn guarded<T>(f: impl FnOnce() -> Option<T>) -> Option<T> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(_) => {
            warn!("operation processor panicked while applying an operation, treating as inapplicable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use anchor_types::AnchorResult;
    use anchor_versioning::OperationProcessor;
    use serde_json::json;

    use super::*;
    use crate::commitment::commitment_hash;
    use crate::v1::V1OperationProcessor;
    use crate::wire::OperationPayload;

    struct SingleVersion(Arc<dyn OperationProcessor>);

    impl OperationProcessorFetcher for SingleVersion {
        fn operation_processor_at(&self, _height: u64) -> AnchorResult<Arc<dyn OperationProcessor>> {
            Ok(self.0.clone())
        }
    }

    fn fetcher() -> SingleVersion {
        SingleVersion(Arc::new(V1OperationProcessor))
    }

    fn op(number: i64, operation_type: OperationType, payload: &OperationPayload) -> AnchoredOperation {
        AnchoredOperation {
            did_suffix: "abc".to_string(),
            operation_type,
            transaction_time: 1,
            transaction_number: number,
            operation_index: 0,
            operation_buffer: serde_json::to_vec(payload).unwrap(),
        }
    }

    #[test]
    fn not_found_without_a_create() {
        let result = resolve(vec![], &fetcher());
        assert_eq!(result, ResolutionResult::NotFound);
    }

    #[test]
    fn applies_create_then_chained_update() {
        let create = OperationPayload::Create {
            did_suffix: "abc".to_string(),
            document: json!({"v": 0}),
            recovery_key: "rk".to_string(),
            next_recovery_commitment_hash: commitment_hash(b"recovery-reveal-1"),
            next_update_commitment_hash: commitment_hash(b"update-reveal-1"),
        };
        let update = OperationPayload::Update {
            did_suffix: "abc".to_string(),
            reveal_value: "update-reveal-1".to_string(),
            patch: json!({"v": 1}),
            next_update_commitment_hash: commitment_hash(b"update-reveal-2"),
        };

        let operations =
            vec![op(1, OperationType::Create, &create), op(2, OperationType::Update, &update)];

        match resolve(operations, &fetcher()) {
            ResolutionResult::Found(state) => {
                assert_eq!(state.document, json!({"v": 1}));
                assert_eq!(state.next_update_commitment_hash, Some(commitment_hash(b"update-reveal-2")));
            }
            other => panic!("expected Found, got {other:?}"),
        }
    }

    #[test]
    fn earliest_transaction_wins_on_commitment_collision() {
        let create = OperationPayload::Create {
            did_suffix: "abc".to_string(),
            document: json!({"v": 0}),
            recovery_key: "rk".to_string(),
            next_recovery_commitment_hash: commitment_hash(b"recovery-reveal-1"),
            next_update_commitment_hash: commitment_hash(b"update-reveal-1"),
        };
        let early = OperationPayload::Update {
            did_suffix: "abc".to_string(),
            reveal_value: "update-reveal-1".to_string(),
            patch: json!({"from": "early"}),
            next_update_commitment_hash: commitment_hash(b"update-reveal-2"),
        };
        let late = OperationPayload::Update {
            did_suffix: "abc".to_string(),
            reveal_value: "update-reveal-1".to_string(),
            patch: json!({"from": "late"}),
            next_update_commitment_hash: commitment_hash(b"update-reveal-3"),
        };

        let operations = vec![
            op(1, OperationType::Create, &create),
            op(3, OperationType::Update, &late),
            op(2, OperationType::Update, &early),
        ];

        match resolve(operations, &fetcher()) {
            ResolutionResult::Found(state) => assert_eq!(state.document, json!({"from": "early"})),
            other => panic!("expected Found, got {other:?}"),
        }
    }

    #[test]
    fn self_referential_update_does_not_loop_forever() {
        // An adversarial update whose next_update_commitment_hash equals the
        // hash of its own reveal_value would, without a progress check,
        // re-match the same commitment_map entry and re-apply forever.
        let create = OperationPayload::Create {
            did_suffix: "abc".to_string(),
            document: json!({"v": 0}),
            recovery_key: "rk".to_string(),
            next_recovery_commitment_hash: commitment_hash(b"recovery-reveal-1"),
            next_update_commitment_hash: commitment_hash(b"self-reveal"),
        };
        let self_referential = OperationPayload::Update {
            did_suffix: "abc".to_string(),
            reveal_value: "self-reveal".to_string(),
            patch: json!({"v": 1}),
            next_update_commitment_hash: commitment_hash(b"self-reveal"),
        };

        let operations =
            vec![op(1, OperationType::Create, &create), op(2, OperationType::Update, &self_referential)];

        // Resolution must terminate (the test itself times out if it doesn't)
        // and the self-referential op is applied exactly once.
        match resolve(operations, &fetcher()) {
            ResolutionResult::Found(state) => {
                assert_eq!(state.document, json!({"v": 1}));
                assert_eq!(state.last_operation_transaction_number, 2);
            }
            other => panic!("expected Found, got {other:?}"),
        }
    }

    #[test]
    fn deactivate_halts_resolution() {
        let create = OperationPayload::Create {
            did_suffix: "abc".to_string(),
            document: json!({"v": 0}),
            recovery_key: "rk".to_string(),
            next_recovery_commitment_hash: commitment_hash(b"recovery-reveal-1"),
            next_update_commitment_hash: commitment_hash(b"update-reveal-1"),
        };
        let deactivate = OperationPayload::Deactivate {
            did_suffix: "abc".to_string(),
            reveal_value: "recovery-reveal-1".to_string(),
        };

        let operations =
            vec![op(1, OperationType::Create, &create), op(2, OperationType::Deactivate, &deactivate)];

        assert_eq!(resolve(operations, &fetcher()), ResolutionResult::Deactivated);
    }
}
