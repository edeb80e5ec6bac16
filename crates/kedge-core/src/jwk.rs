use serde::{Deserialize, Serialize};

/// Public key in JSON Web Key form. Only the two curves the protocol signs
/// with are representable: Ed25519 (OKP) and secp256k1 (EC).
///
/// The JWK doubles as the commitment/reveal value: a commitment is the
/// double-hash of the canonical form of one of these, and revealing the key
/// later proves knowledge of the pre-image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Jwk {
    /// Key type: "OKP" for Ed25519, "EC" for secp256k1.
    pub kty: String,
    /// Curve name: "Ed25519" or "secp256k1".
    pub crv: String,
    /// Base64url-encoded x coordinate (32 bytes).
    pub x: String,
    /// Base64url-encoded y coordinate (32 bytes). Present for EC keys only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
}

impl Jwk {
    pub const CRV_ED25519: &'static str = "Ed25519";
    pub const CRV_SECP256K1: &'static str = "secp256k1";

    /// Ed25519 public key JWK from an encoded x coordinate.
    pub fn okp_ed25519(x: impl Into<String>) -> Self {
        Self {
            kty: "OKP".to_string(),
            crv: Self::CRV_ED25519.to_string(),
            x: x.into(),
            y: None,
        }
    }

    /// secp256k1 public key JWK from encoded affine coordinates.
    pub fn ec_secp256k1(x: impl Into<String>, y: impl Into<String>) -> Self {
        Self {
            kty: "EC".to_string(),
            crv: Self::CRV_SECP256K1.to_string(),
            x: x.into(),
            y: Some(y.into()),
        }
    }
}
