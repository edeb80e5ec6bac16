use kedge_core::{DidSuffix, Jwk, ProtocolError};
use kedge_crypto::{multihash, reveal_value_from_jwk, CompactJws};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::delta::{parse_delta, ParsedDelta};

/// Payload of an update operation's JWS.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateSignedData {
    /// The revealed update key.
    pub update_key: Jwk,
    /// Hash of the canonical delta this signature authorises.
    pub delta_hash: String,
}

/// A structurally valid update operation: signature checked against the
/// embedded key, reveal value bound to that key, delta hash cross-checked.
#[derive(Clone, Debug)]
pub struct UpdateOperation {
    pub did_suffix: DidSuffix,
    pub reveal_value: String,
    pub jws: CompactJws,
    pub signed_data: UpdateSignedData,
    /// `None` only when the chunk file never delivered the delta.
    pub delta: Option<ParsedDelta>,
}

pub(crate) fn parse(
    did_suffix: DidSuffix,
    reveal_value: String,
    jws: CompactJws,
    delta: Option<&Value>,
    max_delta_bytes: usize,
) -> Result<UpdateOperation, ProtocolError> {
    let signed_data: UpdateSignedData = jws
        .payload_as()
        .map_err(|_| ProtocolError::UpdateOperationSignedDataMalformed)?;
    if !multihash::is_valid_encoded_multihash(&signed_data.delta_hash) {
        return Err(ProtocolError::UpdateOperationSignedDataMalformed);
    }

    jws.verify(&signed_data.update_key)?;

    if reveal_value_from_jwk(&signed_data.update_key)? != reveal_value {
        return Err(ProtocolError::OperationRevealValueMismatch);
    }

    // Unlike create/recover there is no empty-document fallback for updates,
    // so a present delta is held to the signed hash here.
    let delta = match delta {
        None => None,
        Some(value) => {
            let parsed = parse_delta(value, max_delta_bytes)?;
            if parsed.canonical_hash != signed_data.delta_hash {
                return Err(ProtocolError::UpdateOperationDeltaHashMismatch);
            }
            Some(parsed)
        }
    };

    Ok(UpdateOperation { did_suffix, reveal_value, jws, signed_data, delta })
}
