//! Commitment/reveal derivation over JWKs.
//!
//! A DID state pins its next update and recovery keys as double-hash
//! commitments. The matching operation reveals the key: the wire carries the
//! single hash (`reveal_value`), and the full JWK rides inside the signed
//! payload. Revealing therefore never exposes the commitment pre-image.

use kedge_core::{Jwk, ProtocolError};

use crate::multihash;

/// Commitment to `jwk`: the encoded double hash of its canonical form.
pub fn commitment_from_jwk(jwk: &Jwk) -> Result<String, ProtocolError> {
    multihash::canonicalize_then_double_hash_then_encode(jwk)
}

/// On-wire reveal value for `jwk`: the encoded single hash of its canonical
/// form.
pub fn reveal_value_from_jwk(jwk: &Jwk) -> Result<String, ProtocolError> {
    multihash::canonicalize_then_hash_then_encode(jwk)
}

/// True when revealing `jwk` satisfies `commitment` under any supported hash
/// algorithm. Never fails on malformed input.
pub fn jwk_satisfies_commitment(jwk: &Jwk, commitment: &str) -> bool {
    match reveal_value_from_jwk(jwk) {
        Ok(reveal) => multihash::reveal_satisfies_commitment(&reveal, commitment),
        Err(_) => false,
    }
}
