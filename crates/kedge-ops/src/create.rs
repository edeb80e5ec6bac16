use kedge_core::{DidSuffix, ProtocolError, SuffixData};
use kedge_crypto::multihash;
use serde_json::Value;

use crate::delta::{parse_delta, ParsedDelta};

/// A structurally valid create operation. The DID suffix is always derived
/// from the anchored suffix data, never taken from the wire, so a forged
/// suffix/suffix-data pairing is unrepresentable.
#[derive(Clone, Debug)]
pub struct CreateOperation {
    pub did_suffix: DidSuffix,
    pub suffix_data: SuffixData,
    /// `None` when the chunk file never delivered a delta, or delivered one
    /// too malformed to use. The processor then creates the DID with an
    /// empty document.
    pub delta: Option<ParsedDelta>,
}

pub(crate) fn parse(
    suffix_data: Option<&Value>,
    delta: Option<&Value>,
    max_delta_bytes: usize,
) -> Result<CreateOperation, ProtocolError> {
    let suffix_value = suffix_data.ok_or(ProtocolError::CreateOperationMissingSuffixData)?;
    let parsed: SuffixData = serde_json::from_value(suffix_value.clone())
        .map_err(|_| ProtocolError::CreateOperationSuffixDataMalformed)?;
    if !multihash::is_valid_encoded_multihash(&parsed.delta_hash)
        || !multihash::is_valid_encoded_multihash(&parsed.recovery_commitment)
    {
        return Err(ProtocolError::CreateOperationSuffixDataMalformed);
    }
    // The suffix hashes the raw anchored value, not the typed struct, so the
    // derived identifier is exactly what the writer committed to.
    let did_suffix = DidSuffix::new(multihash::canonicalize_then_hash_then_encode(suffix_value)?);

    // A create with an unusable delta is still a create; the document just
    // starts empty.
    let delta = delta.and_then(|value| parse_delta(value, max_delta_bytes).ok());

    Ok(CreateOperation { did_suffix, suffix_data: parsed, delta })
}
