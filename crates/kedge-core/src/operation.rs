use serde::{Deserialize, Serialize};
use std::fmt;

use crate::document::{DocumentModel, Patch};
use crate::types::DidSuffix;

// ── OperationType ────────────────────────────────────────────────────────────

/// The four operation kinds of the protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Create,
    Update,
    Recover,
    Deactivate,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Create => "create",
            OperationType::Update => "update",
            OperationType::Recover => "recover",
            OperationType::Deactivate => "deactivate",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Wire payloads ────────────────────────────────────────────────────────────

/// The anchored half of a create operation. Its canonical hash IS the DID's
/// unique suffix, so every field is consensus-critical.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuffixData {
    /// Hash of the canonical initial delta.
    pub delta_hash: String,
    /// Commitment pinning the first recovery key.
    pub recovery_commitment: String,
}

/// The mutable half of create/update/recover operations: document patches plus
/// the commitment pinning the next update key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Delta {
    pub patches: Vec<Patch>,
    pub update_commitment: String,
}

// ── AnchoredOperationModel ───────────────────────────────────────────────────

/// An operation as persisted in the operation store: the canonical operation
/// bytes plus its ledger coordinates. `(did_suffix, transaction_number,
/// operation_index)` is the idempotency key across all store implementations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnchoredOperationModel {
    pub operation_type: OperationType,
    pub did_suffix: DidSuffix,
    /// Canonical JSON bytes of the operation envelope.
    pub operation_buffer: Vec<u8>,
    pub transaction_time: u64,
    pub transaction_number: u64,
    /// Position within the transaction's canonical operation order.
    pub operation_index: u32,
}

// ── DidState ─────────────────────────────────────────────────────────────────

/// The reconstructed state of one DID. Ephemeral: recomputed on every
/// resolution from the operation store.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DidState {
    pub document: DocumentModel,
    /// Commitment the next recover/deactivate must reveal against.
    /// `None` once the DID is deactivated.
    pub next_recovery_commitment: Option<String>,
    /// Commitment the next update must reveal against. `None` after
    /// deactivation or when the active delta was unusable.
    pub next_update_commitment: Option<String>,
    pub last_operation_transaction_number: u64,
}

impl DidState {
    /// A DID is deactivated when no further operation can ever apply.
    pub fn is_deactivated(&self) -> bool {
        self.next_recovery_commitment.is_none() && self.next_update_commitment.is_none()
    }
}
