use serde::{Deserialize, Serialize};
use std::fmt;

/// Ledger-assigned position of a transaction (total order across the chain).
pub type TransactionNumber = u64;

/// Ledger time (block height or equivalent) at which a transaction was anchored.
pub type TransactionTime = u64;

// ── DidSuffix ────────────────────────────────────────────────────────────────

/// Method-local DID identifier: the base64url multihash of the canonical
/// `suffix_data` of the creating operation. Primary key across all stores.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DidSuffix(String);

impl DidSuffix {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self(suffix.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DidSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for DidSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head = self.0.get(..12).unwrap_or(&self.0);
        write!(f, "DidSuffix({head}…)")
    }
}

impl From<&str> for DidSuffix {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
