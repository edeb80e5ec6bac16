use kedge_core::{DidSuffix, Jwk, ProtocolError};
use kedge_crypto::{multihash, reveal_value_from_jwk, CompactJws};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::delta::{parse_delta, ParsedDelta};

/// Payload of a recover operation's JWS.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecoverSignedData {
    /// The revealed recovery key.
    pub recovery_key: Jwk,
    /// Commitment pinning the NEXT recovery key.
    pub recovery_commitment: String,
    /// Hash of the canonical delta this signature authorises.
    pub delta_hash: String,
}

/// A structurally valid recover operation.
#[derive(Clone, Debug)]
pub struct RecoverOperation {
    pub did_suffix: DidSuffix,
    pub reveal_value: String,
    pub jws: CompactJws,
    pub signed_data: RecoverSignedData,
    /// `None` when the chunk file never delivered a delta or delivered an
    /// unusable one; the processor still rotates commitments in that case.
    pub delta: Option<ParsedDelta>,
}

pub(crate) fn parse(
    did_suffix: DidSuffix,
    reveal_value: String,
    jws: CompactJws,
    delta: Option<&Value>,
    max_delta_bytes: usize,
) -> Result<RecoverOperation, ProtocolError> {
    let signed_data: RecoverSignedData = jws
        .payload_as()
        .map_err(|_| ProtocolError::RecoverOperationSignedDataMalformed)?;
    if !multihash::is_valid_encoded_multihash(&signed_data.recovery_commitment)
        || !multihash::is_valid_encoded_multihash(&signed_data.delta_hash)
    {
        return Err(ProtocolError::RecoverOperationSignedDataMalformed);
    }

    jws.verify(&signed_data.recovery_key)?;

    if reveal_value_from_jwk(&signed_data.recovery_key)? != reveal_value {
        return Err(ProtocolError::OperationRevealValueMismatch);
    }

    // Lenient: a recover with an unusable delta still rotates the recovery
    // chain (the processor empties the document instead of rejecting).
    let delta = delta.and_then(|value| parse_delta(value, max_delta_bytes).ok());

    Ok(RecoverOperation { did_suffix, reveal_value, jws, signed_data, delta })
}
