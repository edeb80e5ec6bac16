//! kedge-crypto
//!
//! The hashing and signing primitives every other crate builds on: multihash
//! wrapping, RFC 8785 canonical JSON, base64url, compact JWS over Ed25519 and
//! secp256k1, and the commitment/reveal derivation scheme.

pub mod canonical;
pub mod commitment;
pub mod encode;
pub mod jws;
pub mod keypair;
pub mod multihash;

pub use canonical::canonicalize;
pub use commitment::{commitment_from_jwk, jwk_satisfies_commitment, reveal_value_from_jwk};
pub use jws::{CompactJws, JwsAlgorithm};
pub use keypair::KeyPair;
