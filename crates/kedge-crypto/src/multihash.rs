//! Multihash production and verification.
//!
//! Every on-wire hash is a base64url multihash: `<code><length><digest>`.
//! The protocol produces SHA2-256 (0x12) and additionally recognises
//! SHA3-256 (0x16) so that a future version can migrate algorithms while
//! legacy operations stay resolvable. Both codes fit a single varint byte.

use kedge_core::ProtocolError;
use serde::Serialize;
use sha2::{Digest as _, Sha256};
use sha3::Sha3_256;

use crate::canonical;
use crate::encode;

/// SHA2-256 multihash code. The only code the protocol writes.
pub const SHA2_256_CODE: u64 = 0x12;

/// SHA3-256 multihash code. Recognised on read for algorithm agility.
pub const SHA3_256_CODE: u64 = 0x16;

/// Codes the resolver tries when matching reveals against commitments.
pub const SUPPORTED_HASH_CODES: [u64; 2] = [SHA2_256_CODE, SHA3_256_CODE];

pub const DEFAULT_HASH_CODE: u64 = SHA2_256_CODE;

const DIGEST_LENGTH: usize = 32;

/// A multihash buffer split into its algorithm code and raw digest.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedMultihash {
    pub code: u64,
    pub digest: Vec<u8>,
}

impl std::fmt::Debug for DecodedMultihash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DecodedMultihash(0x{:x}, {})", self.code, hex::encode(&self.digest))
    }
}

// ── Hashing ──────────────────────────────────────────────────────────────────

/// Raw digest of `data` under the algorithm `code`.
pub fn digest(data: &[u8], code: u64) -> Result<Vec<u8>, ProtocolError> {
    match code {
        SHA2_256_CODE => Ok(Sha256::digest(data).to_vec()),
        SHA3_256_CODE => Ok(Sha3_256::digest(data).to_vec()),
        other => Err(ProtocolError::MultihashUnsupportedAlgorithm(other)),
    }
}

/// Multihash buffer (`<code><length><digest>`) of `data` under `code`.
pub fn hash(data: &[u8], code: u64) -> Result<Vec<u8>, ProtocolError> {
    let digest = digest(data, code)?;
    let mut buffer = Vec::with_capacity(2 + digest.len());
    buffer.push(code as u8);
    buffer.push(digest.len() as u8);
    buffer.extend_from_slice(&digest);
    Ok(buffer)
}

/// Base64url multihash of `data` under `code`.
pub fn hash_then_encode(data: &[u8], code: u64) -> Result<String, ProtocolError> {
    Ok(encode::encode(hash(data, code)?))
}

/// Base64url multihash of the canonical form of `value`, under the default
/// algorithm. This is how DID suffixes and reveal values are derived.
pub fn canonicalize_then_hash_then_encode<T: Serialize>(
    value: &T,
) -> Result<String, ProtocolError> {
    let canonical = canonical::canonicalize(value)?;
    hash_then_encode(&canonical, DEFAULT_HASH_CODE)
}

/// Double-hash commitment of the canonical form of `value`:
/// `encode(multihash(digest(digest(canonical(value)))))`, both rounds under
/// the default algorithm. Revealing `value` later only ever exposes the
/// single hash, never the commitment pre-image directly.
pub fn canonicalize_then_double_hash_then_encode<T: Serialize>(
    value: &T,
) -> Result<String, ProtocolError> {
    let canonical = canonical::canonicalize(value)?;
    let inner = digest(&canonical, DEFAULT_HASH_CODE)?;
    hash_then_encode(&inner, DEFAULT_HASH_CODE)
}

// ── Decoding / verification ──────────────────────────────────────────────────

/// Decode a base64url multihash string into code + digest.
pub fn decode(encoded: &str) -> Result<DecodedMultihash, ProtocolError> {
    let bytes = encode::decode(encoded)?;
    decode_buffer(&bytes)
}

fn decode_buffer(bytes: &[u8]) -> Result<DecodedMultihash, ProtocolError> {
    if bytes.len() < 2 {
        return Err(ProtocolError::MultihashMalformed);
    }
    let code = bytes[0] as u64;
    if !SUPPORTED_HASH_CODES.contains(&code) {
        return Err(ProtocolError::MultihashUnsupportedAlgorithm(code));
    }
    let length = bytes[1] as usize;
    let digest = &bytes[2..];
    if length != DIGEST_LENGTH || digest.len() != length {
        return Err(ProtocolError::MultihashMalformed);
    }
    Ok(DecodedMultihash { code, digest: digest.to_vec() })
}

/// True when `encoded` is a well-formed multihash under a supported code.
pub fn is_valid_encoded_multihash(encoded: &str) -> bool {
    decode(encoded).is_ok()
}

/// True when `encoded` was produced under the algorithm `code`.
/// Never fails on malformed input.
pub fn is_computed_using(encoded: &str, code: u64) -> bool {
    match decode(encoded) {
        Ok(decoded) => decoded.code == code,
        Err(_) => false,
    }
}

/// True when hashing `data` under `encoded`'s own algorithm reproduces it.
/// Never fails on malformed input.
pub fn verify(data: &[u8], encoded: &str) -> bool {
    let Ok(decoded) = decode(encoded) else {
        return false;
    };
    match digest(data, decoded.code) {
        Ok(computed) => computed == decoded.digest,
        Err(_) => false,
    }
}

/// True when `reveal_value` (the encoded single hash) satisfies
/// `commitment` (the encoded double hash) under any supported algorithm.
/// Never fails on malformed input.
pub fn reveal_satisfies_commitment(reveal_value: &str, commitment: &str) -> bool {
    let Ok(reveal) = decode(reveal_value) else {
        return false;
    };
    SUPPORTED_HASH_CODES.iter().any(|&code| {
        hash_then_encode(&reveal.digest, code)
            .map(|candidate| candidate == commitment)
            .unwrap_or(false)
    })
}

/// Candidate commitment strings a reveal could satisfy, one per supported
/// algorithm. The resolver keys its commitment map with these.
pub fn candidate_commitments(reveal_value: &str) -> Result<Vec<String>, ProtocolError> {
    let reveal = decode(reveal_value)?;
    SUPPORTED_HASH_CODES
        .iter()
        .map(|&code| hash_then_encode(&reveal.digest, code))
        .collect()
}
