use kedge_core::{Delta, ProtocolError};
use kedge_crypto::{canonicalize, multihash};
use serde_json::Value;

use crate::document;

/// A delta parsed from its raw JSON form, keeping the canonical hash of the
/// bytes as anchored. Hash checks always run against `canonical_hash`, never
/// against a re-serialisation of the typed struct, so extra properties an
/// attacker smuggles past lenient layers cannot shift the hash.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedDelta {
    pub delta: Delta,
    pub canonical_hash: String,
}

/// Parse and validate one delta value.
pub fn parse_delta(value: &Value, max_bytes: usize) -> Result<ParsedDelta, ProtocolError> {
    if !value.is_object() {
        return Err(ProtocolError::DeltaMissingOrNotObject);
    }
    let canonical = canonicalize(value)?;
    if canonical.len() > max_bytes {
        return Err(ProtocolError::DeltaExceedsMaximumSize {
            got: canonical.len(),
            limit: max_bytes,
        });
    }
    let canonical_hash =
        multihash::hash_then_encode(&canonical, multihash::DEFAULT_HASH_CODE)?;
    let delta: Delta = serde_json::from_value(value.clone())
        .map_err(|e| ProtocolError::DeltaMalformed(e.to_string()))?;
    if !multihash::is_valid_encoded_multihash(&delta.update_commitment) {
        return Err(ProtocolError::DeltaMalformed(
            "update_commitment is not a valid encoded multihash".to_string(),
        ));
    }
    document::validate_patches(&delta.patches)?;
    Ok(ParsedDelta { delta, canonical_hash })
}
