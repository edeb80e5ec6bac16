use kedge_core::{DidSuffix, Jwk, ProtocolError};
use kedge_crypto::{reveal_value_from_jwk, CompactJws};
use serde::{Deserialize, Serialize};

/// Payload of a deactivate operation's JWS. Unlike update/recover there is
/// no delta, so the signed payload names the DID explicitly to stop a
/// deactivation being replayed against a different suffix.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeactivateSignedData {
    pub did_suffix: String,
    /// The revealed recovery key.
    pub recovery_key: Jwk,
}

/// A structurally valid deactivate operation.
#[derive(Clone, Debug)]
pub struct DeactivateOperation {
    pub did_suffix: DidSuffix,
    pub reveal_value: String,
    pub jws: CompactJws,
    pub signed_data: DeactivateSignedData,
}

pub(crate) fn parse(
    did_suffix: DidSuffix,
    reveal_value: String,
    jws: CompactJws,
) -> Result<DeactivateOperation, ProtocolError> {
    let signed_data: DeactivateSignedData = jws
        .payload_as()
        .map_err(|_| ProtocolError::DeactivateOperationSignedDataMalformed)?;

    if signed_data.did_suffix != did_suffix.as_str() {
        return Err(ProtocolError::DeactivateOperationDidSuffixMismatch);
    }

    jws.verify(&signed_data.recovery_key)?;

    if reveal_value_from_jwk(&signed_data.recovery_key)? != reveal_value {
        return Err(ProtocolError::OperationRevealValueMismatch);
    }

    Ok(DeactivateOperation { did_suffix, reveal_value, jws, signed_data })
}
