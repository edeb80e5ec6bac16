use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use kedge_core::{
    AnchoredOperationModel, DidState, DidSuffix, OperationStore, OperationType,
    ProtocolParameters, StoreError,
};
use kedge_crypto::multihash;
use tracing::warn;

use crate::version::ProcessorLookup;

// Identity of one anchored operation within the resolver's working set.
type OpKey = (u64, u32);

fn op_key(op: &AnchoredOperationModel) -> OpKey {
    (op.transaction_number, op.operation_index)
}

/// Reconstructs DID states from the operation store.
///
/// The single hard rule: `resolve` never fails because of operation
/// content. Malformed, forged, or replayed operations are logged and
/// skipped, so an attacker who anchors junk around a DID cannot make that
/// DID unresolvable. Only store I/O surfaces as an error.
pub struct Resolver {
    store: Arc<dyn OperationStore>,
    lookup: Arc<dyn ProcessorLookup>,
    params: ProtocolParameters,
}

impl Resolver {
    pub fn new(
        store: Arc<dyn OperationStore>,
        lookup: Arc<dyn ProcessorLookup>,
        params: ProtocolParameters,
    ) -> Self {
        Self { store, lookup, params }
    }

    /// Current state of `did_suffix`, or `None` when no valid create is
    /// anchored for it.
    pub async fn resolve(&self, did_suffix: &DidSuffix) -> Result<Option<DidState>, StoreError> {
        let operations = self.store.get(did_suffix).await?;

        let mut creates = Vec::new();
        let mut updates = Vec::new();
        let mut rotations = Vec::new(); // recover + deactivate share the recovery chain
        for operation in &operations {
            match operation.operation_type {
                OperationType::Create => creates.push(operation),
                OperationType::Update => updates.push(operation),
                OperationType::Recover | OperationType::Deactivate => rotations.push(operation),
            }
        }

        // Budget across all phases; adversarial stores cannot spin us.
        let mut budget = self.params.max_operations_per_did;

        // ── Phase 1: first applicable create wins ───────────────────────────
        let mut state: Option<DidState> = None;
        let mut consumed: HashSet<OpKey> = HashSet::new();
        for create in creates.iter().copied() {
            if budget == 0 {
                break;
            }
            budget -= 1;
            state = self.try_apply(create, None);
            if state.is_some() {
                consumed.insert(op_key(create));
                break;
            }
        }
        let Some(mut state) = state else {
            return Ok(None);
        };

        // ── Phase 2: walk the recovery chain ────────────────────────────────
        let rotation_map = self.commitment_map(&rotations);
        self.walk_chain(
            &mut state,
            &rotation_map,
            &mut consumed,
            &mut budget,
            |state| state.next_recovery_commitment.clone(),
        );

        // ── Phase 3: walk the update chain ──────────────────────────────────
        let update_map = self.commitment_map(&updates);
        self.walk_chain(
            &mut state,
            &update_map,
            &mut consumed,
            &mut budget,
            |state| state.next_update_commitment.clone(),
        );

        Ok(Some(state))
    }

    // One link per iteration: take the bucket for the state's pending
    // commitment, try candidates in transaction order, keep the first that
    // actually advances the state. Preimage resistance guarantees at most
    // one authentic candidate per link; the transaction-number sort is a
    // deterministic tie-break among forgeries.
    fn walk_chain<'a>(
        &self,
        state: &mut DidState,
        commitment_map: &HashMap<String, Vec<&'a AnchoredOperationModel>>,
        consumed: &mut HashSet<OpKey>,
        budget: &mut usize,
        pending_commitment: impl Fn(&DidState) -> Option<String>,
    ) {
        loop {
            let Some(commitment) = pending_commitment(state) else {
                return;
            };
            let Some(candidates) = commitment_map.get(&commitment) else {
                return;
            };
            let mut candidates: Vec<&AnchoredOperationModel> = candidates
                .iter()
                .copied()
                .filter(|op| !consumed.contains(&op_key(op)))
                .collect();
            candidates.sort_by_key(|op| (op.transaction_number, op.operation_index));

            let mut advanced = false;
            for candidate in candidates {
                if *budget == 0 {
                    return;
                }
                *budget -= 1;
                let Some(new_state) = self.try_apply(candidate, Some(state)) else {
                    continue;
                };
                if new_state.last_operation_transaction_number
                    != state.last_operation_transaction_number
                {
                    *state = new_state;
                    consumed.insert(op_key(candidate));
                    advanced = true;
                    break;
                }
            }
            if !advanced {
                return;
            }
        }
    }

    // Bucket operations under every commitment their reveal value could
    // satisfy, one key per supported hash algorithm. This is what keeps
    // legacy operations resolvable across a hash migration.
    fn commitment_map<'a>(
        &self,
        operations: &[&'a AnchoredOperationModel],
    ) -> HashMap<String, Vec<&'a AnchoredOperationModel>> {
        let mut map: HashMap<String, Vec<&AnchoredOperationModel>> = HashMap::new();
        for &operation in operations {
            let Some(processor) = self.lookup.processor_for(operation.transaction_time) else {
                warn!(
                    transaction_time = operation.transaction_time,
                    "no processor registered for operation's ledger time; skipping"
                );
                continue;
            };
            let reveal_value = match processor.get_reveal_value(operation) {
                Ok(reveal_value) => reveal_value,
                Err(err) => {
                    warn!(
                        did = %operation.did_suffix,
                        transaction_number = operation.transaction_number,
                        error = %err,
                        "operation has no usable reveal value; skipping"
                    );
                    continue;
                }
            };
            match multihash::candidate_commitments(&reveal_value) {
                Ok(commitments) => {
                    for commitment in commitments {
                        map.entry(commitment).or_default().push(operation);
                    }
                }
                Err(err) => {
                    warn!(
                        did = %operation.did_suffix,
                        error = %err,
                        "operation reveal value is not a decodable multihash; skipping"
                    );
                }
            }
        }
        map
    }

    fn try_apply(
        &self,
        operation: &AnchoredOperationModel,
        state: Option<&DidState>,
    ) -> Option<DidState> {
        let Some(processor) = self.lookup.processor_for(operation.transaction_time) else {
            warn!(
                transaction_time = operation.transaction_time,
                "no processor registered for operation's ledger time; skipping"
            );
            return state.cloned();
        };
        match processor.apply(operation, state) {
            Ok(new_state) => new_state,
            Err(err) => {
                warn!(
                    did = %operation.did_suffix,
                    transaction_number = operation.transaction_number,
                    code = err.code(),
                    "operation failed to apply; skipping"
                );
                state.cloned()
            }
        }
    }
}
