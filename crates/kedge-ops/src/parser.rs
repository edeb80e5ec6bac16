use kedge_core::{
    AnchoredOperationModel, DidSuffix, OperationType, ProtocolError, ProtocolParameters,
};
use kedge_crypto::{multihash, CompactJws};
use serde::Deserialize;
use serde_json::Value;

use crate::create::{self, CreateOperation};
use crate::deactivate::{self, DeactivateOperation};
use crate::recover::{self, RecoverOperation};
use crate::update::{self, UpdateOperation};

// ── Operation ────────────────────────────────────────────────────────────────

/// A fully parsed operation of any kind.
#[derive(Clone, Debug)]
pub enum Operation {
    Create(CreateOperation),
    Update(UpdateOperation),
    Recover(RecoverOperation),
    Deactivate(DeactivateOperation),
}

impl Operation {
    pub fn operation_type(&self) -> OperationType {
        match self {
            Operation::Create(_) => OperationType::Create,
            Operation::Update(_) => OperationType::Update,
            Operation::Recover(_) => OperationType::Recover,
            Operation::Deactivate(_) => OperationType::Deactivate,
        }
    }

    pub fn did_suffix(&self) -> &DidSuffix {
        match self {
            Operation::Create(op) => &op.did_suffix,
            Operation::Update(op) => &op.did_suffix,
            Operation::Recover(op) => &op.did_suffix,
            Operation::Deactivate(op) => &op.did_suffix,
        }
    }

    /// The on-wire reveal value; creates have none.
    pub fn reveal_value(&self) -> Option<&str> {
        match self {
            Operation::Create(_) => None,
            Operation::Update(op) => Some(&op.reveal_value),
            Operation::Recover(op) => Some(&op.reveal_value),
            Operation::Deactivate(op) => Some(&op.reveal_value),
        }
    }
}

// ── Envelope ─────────────────────────────────────────────────────────────────

// Superset of all four kinds; kind dispatch decides which fields are
// required and which are forbidden.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Envelope {
    #[serde(rename = "type")]
    operation_type: String,
    #[serde(default)]
    suffix_data: Option<Value>,
    #[serde(default)]
    did_suffix: Option<String>,
    #[serde(default)]
    reveal_value: Option<String>,
    #[serde(default)]
    signed_data: Option<String>,
    #[serde(default)]
    delta: Option<Value>,
}

// ── OperationParser ──────────────────────────────────────────────────────────

/// Parses operation buffers into validated operations. All inputs are
/// treated as untrusted bytes; every reject is a typed `ProtocolError`.
#[derive(Clone, Debug)]
pub struct OperationParser {
    params: ProtocolParameters,
}

impl OperationParser {
    pub fn new(params: ProtocolParameters) -> Self {
        Self { params }
    }

    /// Parse an anchored operation's buffer and cross-check it against the
    /// anchored envelope. A type or suffix disagreement means the store
    /// contents were composed wrongly — a programmer bug, not a protocol
    /// violation.
    pub fn parse_anchored(
        &self,
        anchored: &AnchoredOperationModel,
    ) -> Result<Operation, ProtocolError> {
        let operation = self.parse_buffer(&anchored.operation_buffer)?;
        if operation.operation_type() != anchored.operation_type {
            return Err(ProtocolError::OperationTypeMismatch {
                expected: anchored.operation_type.to_string(),
                found: operation.operation_type().to_string(),
            });
        }
        if operation.did_suffix() != &anchored.did_suffix {
            return Err(ProtocolError::OperationDidSuffixMissingOrInvalid);
        }
        Ok(operation)
    }

    /// Parse a raw operation buffer.
    pub fn parse_buffer(&self, buffer: &[u8]) -> Result<Operation, ProtocolError> {
        let value: Value =
            serde_json::from_slice(buffer).map_err(|_| ProtocolError::OperationNotJson)?;
        if !value.is_object() {
            return Err(ProtocolError::OperationNotJson);
        }
        let envelope: Envelope =
            serde_json::from_value(value).map_err(|_| ProtocolError::OperationNotJson)?;

        match envelope.operation_type.as_str() {
            "create" => {
                forbid(envelope.did_suffix.is_some())?;
                forbid(envelope.reveal_value.is_some())?;
                forbid(envelope.signed_data.is_some())?;
                let op = create::parse(
                    envelope.suffix_data.as_ref(),
                    envelope.delta.as_ref(),
                    self.params.max_delta_bytes,
                )?;
                Ok(Operation::Create(op))
            }
            "update" => {
                forbid(envelope.suffix_data.is_some())?;
                let did_suffix = require_did_suffix(envelope.did_suffix.as_deref())?;
                let reveal_value = require_reveal_value(envelope.reveal_value.as_deref())?;
                let jws = require_jws(
                    envelope.signed_data.as_deref(),
                    ProtocolError::UpdateOperationSignedDataMalformed,
                )?;
                let op = update::parse(
                    did_suffix,
                    reveal_value,
                    jws,
                    envelope.delta.as_ref(),
                    self.params.max_delta_bytes,
                )?;
                Ok(Operation::Update(op))
            }
            "recover" => {
                forbid(envelope.suffix_data.is_some())?;
                let did_suffix = require_did_suffix(envelope.did_suffix.as_deref())?;
                let reveal_value = require_reveal_value(envelope.reveal_value.as_deref())?;
                let jws = require_jws(
                    envelope.signed_data.as_deref(),
                    ProtocolError::RecoverOperationSignedDataMalformed,
                )?;
                let op = recover::parse(
                    did_suffix,
                    reveal_value,
                    jws,
                    envelope.delta.as_ref(),
                    self.params.max_delta_bytes,
                )?;
                Ok(Operation::Recover(op))
            }
            "deactivate" => {
                forbid(envelope.suffix_data.is_some())?;
                forbid(envelope.delta.is_some())?;
                let did_suffix = require_did_suffix(envelope.did_suffix.as_deref())?;
                let reveal_value = require_reveal_value(envelope.reveal_value.as_deref())?;
                let jws = require_jws(
                    envelope.signed_data.as_deref(),
                    ProtocolError::DeactivateOperationSignedDataMalformed,
                )?;
                let op = deactivate::parse(did_suffix, reveal_value, jws)?;
                Ok(Operation::Deactivate(op))
            }
            other => Err(ProtocolError::OperationTypeUnknown(other.to_string())),
        }
    }
}

fn forbid(present: bool) -> Result<(), ProtocolError> {
    if present {
        Err(ProtocolError::OperationEnvelopeExtraneousField)
    } else {
        Ok(())
    }
}

fn require_did_suffix(value: Option<&str>) -> Result<DidSuffix, ProtocolError> {
    match value {
        Some(suffix) if multihash::is_valid_encoded_multihash(suffix) => {
            Ok(DidSuffix::new(suffix))
        }
        _ => Err(ProtocolError::OperationDidSuffixMissingOrInvalid),
    }
}

fn require_reveal_value(value: Option<&str>) -> Result<String, ProtocolError> {
    match value {
        Some(reveal) if multihash::is_valid_encoded_multihash(reveal) => {
            Ok(reveal.to_string())
        }
        _ => Err(ProtocolError::OperationRevealValueMissingOrInvalid),
    }
}

fn require_jws(value: Option<&str>, missing: ProtocolError) -> Result<CompactJws, ProtocolError> {
    match value {
        Some(compact) => CompactJws::parse(compact),
        None => Err(missing),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
