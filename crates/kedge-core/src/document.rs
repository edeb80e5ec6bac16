use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::jwk::Jwk;

// ── DocumentModel ────────────────────────────────────────────────────────────

/// The DID document a resolution produces: verification keys plus service
/// endpoints. Everything else in a rendered DID document (contexts, controller,
/// derived verification relationships) is presentation-layer and out of scope.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct DocumentModel {
    pub public_keys: Vec<PublicKeyEntry>,
    pub services: Vec<ServiceEntry>,
}

impl DocumentModel {
    /// True when the document carries neither keys nor services.
    pub fn is_empty(&self) -> bool {
        self.public_keys.is_empty() && self.services.is_empty()
    }
}

/// One verification key inside a DID document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublicKeyEntry {
    /// Fragment identifier, unique within the document.
    pub id: String,
    /// Verification method type, e.g. "JsonWebKey2020".
    #[serde(rename = "type")]
    pub key_type: String,
    pub public_key_jwk: Jwk,
    /// Verification relationships ("authentication", "assertionMethod", …).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub purposes: Vec<String>,
}

/// One service endpoint inside a DID document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceEntry {
    /// Fragment identifier, unique within the document.
    pub id: String,
    #[serde(rename = "type")]
    pub service_type: String,
    /// URI string or endpoint object; the protocol does not interpret it.
    pub service_endpoint: Value,
}

// ── Patch ────────────────────────────────────────────────────────────────────

/// A single document mutation carried inside an operation delta.
///
/// Application semantics (see `kedge-ops::document`): additions overwrite an
/// existing entry with the same id, removals of absent ids are no-ops, and
/// `replace` swaps the whole document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum Patch {
    #[serde(rename = "add-public-keys")]
    AddPublicKeys { public_keys: Vec<PublicKeyEntry> },
    #[serde(rename = "remove-public-keys")]
    RemovePublicKeys { ids: Vec<String> },
    #[serde(rename = "add-services")]
    AddServices { services: Vec<ServiceEntry> },
    #[serde(rename = "remove-services")]
    RemoveServices { ids: Vec<String> },
    #[serde(rename = "replace")]
    Replace { document: DocumentModel },
}
