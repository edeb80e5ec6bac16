use ed25519_dalek::Signer as _;
use k256::ecdsa::signature::Signer as _;
use kedge_core::Jwk;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use crate::encode;
use crate::jws::JwsAlgorithm;

/// A signing keypair on one of the two protocol curves.
///
/// Secret material lives inside the curve crates' own zeroizing key types;
/// the raw-byte export below is wrapped in `Zeroizing` so callers cannot
/// accidentally keep an unwiped copy.
pub enum KeyPair {
    Ed25519(ed25519_dalek::SigningKey),
    Secp256k1(k256::ecdsa::SigningKey),
}

impl KeyPair {
    /// Generate a fresh Ed25519 keypair.
    pub fn generate_ed25519() -> Self {
        Self::Ed25519(ed25519_dalek::SigningKey::generate(&mut OsRng))
    }

    /// Generate a fresh secp256k1 keypair.
    pub fn generate_secp256k1() -> Self {
        Self::Secp256k1(k256::ecdsa::SigningKey::random(&mut OsRng))
    }

    /// The JWS algorithm this key signs with.
    pub fn algorithm(&self) -> JwsAlgorithm {
        match self {
            KeyPair::Ed25519(_) => JwsAlgorithm::EdDsa,
            KeyPair::Secp256k1(_) => JwsAlgorithm::Es256k,
        }
    }

    /// Public half as a JWK.
    pub fn public_jwk(&self) -> Jwk {
        match self {
            KeyPair::Ed25519(signing) => {
                let verifying = signing.verifying_key();
                Jwk::okp_ed25519(encode::encode(verifying.to_bytes()))
            }
            KeyPair::Secp256k1(signing) => {
                let point = signing.verifying_key().to_encoded_point(false);
                let x = point.x().expect("uncompressed point has x coordinate");
                let y = point.y().expect("uncompressed point has y coordinate");
                Jwk::ec_secp256k1(encode::encode(x), encode::encode(y))
            }
        }
    }

    /// Raw signature over `message` (64 bytes on both curves).
    pub fn sign_bytes(&self, message: &[u8]) -> Vec<u8> {
        match self {
            KeyPair::Ed25519(signing) => signing.sign(message).to_bytes().to_vec(),
            KeyPair::Secp256k1(signing) => {
                let signature: k256::ecdsa::Signature = signing.sign(message);
                signature.to_bytes().to_vec()
            }
        }
    }

    /// Secret scalar bytes, wiped on drop.
    pub fn secret_key_bytes(&self) -> Zeroizing<Vec<u8>> {
        match self {
            KeyPair::Ed25519(signing) => Zeroizing::new(signing.to_bytes().to_vec()),
            KeyPair::Secp256k1(signing) => Zeroizing::new(signing.to_bytes().to_vec()),
        }
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyPair({})", self.algorithm().name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ed25519_jwk_has_no_y() {
        let jwk = KeyPair::generate_ed25519().public_jwk();
        assert_eq!(jwk.crv, Jwk::CRV_ED25519);
        assert!(jwk.y.is_none());
    }

    #[test]
    fn secp256k1_jwk_has_both_coordinates() {
        let jwk = KeyPair::generate_secp256k1().public_jwk();
        assert_eq!(jwk.crv, Jwk::CRV_SECP256K1);
        assert_eq!(encode::decode(&jwk.x).unwrap().len(), 32);
        assert_eq!(encode::decode(jwk.y.as_deref().unwrap()).unwrap().len(), 32);
    }
}
