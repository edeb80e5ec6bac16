//! Compact JWS over canonical JSON payloads.
//!
//! The protocol signs with EdDSA (Ed25519) or ES256K (secp256k1) and nothing
//! else; a protected header carrying any other algorithm, or any parameter
//! besides `alg`, fails to parse. Signatures are raw 64-byte `R‖s` / `r‖s`.

use ed25519_dalek::Verifier as _;
use k256::ecdsa::signature::Verifier as _;
use kedge_core::{Jwk, ProtocolError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::canonical;
use crate::encode;
use crate::keypair::KeyPair;

// ── Algorithm ────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JwsAlgorithm {
    EdDsa,
    Es256k,
}

impl JwsAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            JwsAlgorithm::EdDsa => "EdDSA",
            JwsAlgorithm::Es256k => "ES256K",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "EdDSA" => Some(JwsAlgorithm::EdDsa),
            "ES256K" => Some(JwsAlgorithm::Es256k),
            _ => None,
        }
    }
}

// ── CompactJws ───────────────────────────────────────────────────────────────

/// A parsed compact JWS: three base64url segments. The protected header has
/// already been validated; payload and signature are decoded on demand.
/// Deliberately not `Deserialize` — construction goes through `parse` or
/// `sign` so the segment invariants always hold.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CompactJws {
    compact: String,
}

impl CompactJws {
    /// Parse and structurally validate a compact JWS string.
    pub fn parse(compact: &str) -> Result<Self, ProtocolError> {
        let parts: Vec<&str> = compact.split('.').collect();
        if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
            return Err(ProtocolError::JwsMalformed);
        }
        let header_bytes = encode::decode(parts[0]).map_err(|_| ProtocolError::JwsMalformed)?;
        let header: Value =
            serde_json::from_slice(&header_bytes).map_err(|_| ProtocolError::JwsMalformed)?;
        let object = header
            .as_object()
            .ok_or(ProtocolError::JwsHeaderMissingOrUnknownAlgorithm)?;
        if object.len() != 1 {
            return Err(ProtocolError::JwsHeaderMissingOrUnknownAlgorithm);
        }
        let alg = object
            .get("alg")
            .and_then(Value::as_str)
            .ok_or(ProtocolError::JwsHeaderMissingOrUnknownAlgorithm)?;
        if JwsAlgorithm::from_name(alg).is_none() {
            return Err(ProtocolError::JwsHeaderMissingOrUnknownAlgorithm);
        }
        // Decode the remaining segments now so a malformed JWS never gets
        // past parsing.
        encode::decode(parts[1]).map_err(|_| ProtocolError::JwsMalformed)?;
        encode::decode(parts[2]).map_err(|_| ProtocolError::JwsMalformed)?;
        Ok(Self { compact: compact.to_string() })
    }

    /// Sign `payload` (canonical JSON) with `key`.
    pub fn sign<T: Serialize>(payload: &T, key: &KeyPair) -> Result<Self, ProtocolError> {
        let header = json!({ "alg": key.algorithm().name() });
        let protected = encode::encode(canonical::canonicalize(&header)?);
        let payload = encode::encode(canonical::canonicalize(payload)?);
        let signing_input = format!("{protected}.{payload}");
        let signature = encode::encode(key.sign_bytes(signing_input.as_bytes()));
        Ok(Self { compact: format!("{signing_input}.{signature}") })
    }

    pub fn as_compact(&self) -> &str {
        &self.compact
    }

    fn segments(&self) -> (&str, &str, &str) {
        let mut parts = self.compact.splitn(3, '.');
        // Parsing guaranteed three segments.
        (
            parts.next().expect("jws has a protected segment"),
            parts.next().expect("jws has a payload segment"),
            parts.next().expect("jws has a signature segment"),
        )
    }

    pub fn algorithm(&self) -> Result<JwsAlgorithm, ProtocolError> {
        let (protected, _, _) = self.segments();
        let header: Value = serde_json::from_slice(&encode::decode(protected)?)
            .map_err(|_| ProtocolError::JwsMalformed)?;
        header
            .get("alg")
            .and_then(Value::as_str)
            .and_then(JwsAlgorithm::from_name)
            .ok_or(ProtocolError::JwsHeaderMissingOrUnknownAlgorithm)
    }

    /// Deserialize the payload segment as JSON.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        let (_, payload, _) = self.segments();
        let bytes = encode::decode(payload)?;
        serde_json::from_slice(&bytes).map_err(|_| ProtocolError::JwsPayloadNotJson)
    }

    /// Verify the signature under `key`. The key's curve must match the
    /// header algorithm.
    pub fn verify(&self, key: &Jwk) -> Result<(), ProtocolError> {
        let (protected, payload, signature) = self.segments();
        let signing_input = format!("{protected}.{payload}");
        let signature = encode::decode(signature)?;
        match (self.algorithm()?, key.crv.as_str()) {
            (JwsAlgorithm::EdDsa, Jwk::CRV_ED25519) => {
                verify_ed25519(key, signing_input.as_bytes(), &signature)
            }
            (JwsAlgorithm::Es256k, Jwk::CRV_SECP256K1) => {
                verify_secp256k1(key, signing_input.as_bytes(), &signature)
            }
            (_, Jwk::CRV_ED25519 | Jwk::CRV_SECP256K1) => Err(ProtocolError::JwsSignatureInvalid),
            (_, other) => Err(ProtocolError::JwkUnsupportedCurve(other.to_string())),
        }
    }
}

// ── Curve plumbing ───────────────────────────────────────────────────────────

fn verify_ed25519(key: &Jwk, message: &[u8], signature: &[u8]) -> Result<(), ProtocolError> {
    let x = encode::decode(&key.x)?;
    let x: [u8; 32] = x.try_into().map_err(|_| ProtocolError::JwkPointMalformed)?;
    let verifying = ed25519_dalek::VerifyingKey::from_bytes(&x)
        .map_err(|_| ProtocolError::JwkPointMalformed)?;
    let signature: [u8; 64] = signature
        .try_into()
        .map_err(|_| ProtocolError::JwsSignatureInvalid)?;
    verifying
        .verify(message, &ed25519_dalek::Signature::from_bytes(&signature))
        .map_err(|_| ProtocolError::JwsSignatureInvalid)
}

fn verify_secp256k1(key: &Jwk, message: &[u8], signature: &[u8]) -> Result<(), ProtocolError> {
    let x = encode::decode(&key.x)?;
    let y = key
        .y
        .as_deref()
        .ok_or(ProtocolError::JwkPointMalformed)
        .and_then(encode::decode)?;
    if x.len() != 32 || y.len() != 32 {
        return Err(ProtocolError::JwkPointMalformed);
    }
    let point = k256::EncodedPoint::from_affine_coordinates(
        k256::FieldBytes::from_slice(&x),
        k256::FieldBytes::from_slice(&y),
        false,
    );
    let verifying = k256::ecdsa::VerifyingKey::from_encoded_point(&point)
        .map_err(|_| ProtocolError::JwkPointMalformed)?;
    let signature = k256::ecdsa::Signature::from_slice(signature)
        .map_err(|_| ProtocolError::JwsSignatureInvalid)?;
    verifying
        .verify(message, &signature)
        .map_err(|_| ProtocolError::JwsSignatureInvalid)
}
