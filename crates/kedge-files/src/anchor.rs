use kedge_core::{ProtocolError, ProtocolParameters};
use kedge_crypto::multihash;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use crate::compress::{self, DecompressError};

// ── Entries ──────────────────────────────────────────────────────────────────

/// Anchor-file create entry: the suffix data alone. Kept as raw JSON so the
/// derived DID suffix hashes exactly what the writer anchored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateEntry {
    pub suffix_data: Value,
}

/// Entry shape shared by recover/deactivate (anchor file) and update
/// (map file): the target DID, the reveal against its commitment, and the
/// compact JWS authorising the change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignedOperationEntry {
    pub did_suffix: String,
    pub reveal_value: String,
    pub signed_data: String,
}

// ── AnchorFileModel ──────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AnchorFileOperations {
    pub create: Vec<CreateEntry>,
    pub recover: Vec<SignedOperationEntry>,
    pub deactivate: Vec<SignedOperationEntry>,
}

/// The first file tier: references the map file and carries every
/// create/recover/deactivate of the batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnchorFileModel {
    /// Identifier of the writer's value time lock, when one backs the batch.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub writer_lock_id: Option<String>,
    pub map_file_uri: String,
    pub operations: AnchorFileOperations,
}

impl AnchorFileModel {
    /// Decompress, parse, and structurally validate an anchor file.
    pub fn parse(bytes: &[u8], params: &ProtocolParameters) -> Result<Self, ProtocolError> {
        let max = params.max_anchor_file_bytes * params.max_decompression_factor;
        let json = compress::decompress(bytes, max).map_err(|e| match e {
            DecompressError::Malformed => ProtocolError::AnchorFileDecompressionFailure,
            DecompressError::TooLarge => ProtocolError::AnchorFileMalformed(
                "decompressed size exceeds limit".to_string(),
            ),
        })?;
        let file: AnchorFileModel = serde_json::from_slice(&json)
            .map_err(|e| ProtocolError::AnchorFileMalformed(e.to_string()))?;

        if !multihash::is_valid_encoded_multihash(&file.map_file_uri) {
            return Err(ProtocolError::AnchorFileMapFileUriInvalid);
        }

        let count = file.operation_count();
        if count > params.max_operations_per_transaction {
            return Err(ProtocolError::AnchorFileOperationCountExceededLimit {
                count,
                max: params.max_operations_per_transaction,
            });
        }

        for entry in file.operations.recover.iter().chain(&file.operations.deactivate) {
            if !multihash::is_valid_encoded_multihash(&entry.did_suffix) {
                return Err(ProtocolError::AnchorFileMalformed(
                    "entry did_suffix is not a valid encoded multihash".to_string(),
                ));
            }
            if !multihash::is_valid_encoded_multihash(&entry.reveal_value) {
                return Err(ProtocolError::AnchorFileMalformed(
                    "entry reveal_value is not a valid encoded multihash".to_string(),
                ));
            }
        }

        // One operation per DID per transaction within this file (I1 begins
        // here; the map file extends the same set).
        let mut seen = HashSet::new();
        for suffix in file.did_suffixes()? {
            if !seen.insert(suffix.clone()) {
                return Err(ProtocolError::AnchorFileDuplicateDidSuffix(suffix));
            }
        }

        Ok(file)
    }

    /// Serialize and compress for CAS upload.
    pub fn create_buffer(&self) -> Result<Vec<u8>, ProtocolError> {
        let json = serde_json::to_vec(self)
            .map_err(|e| ProtocolError::AnchorFileMalformed(e.to_string()))?;
        Ok(compress::compress(&json))
    }

    /// Total operations across all three entry lists.
    pub fn operation_count(&self) -> u64 {
        (self.operations.create.len()
            + self.operations.recover.len()
            + self.operations.deactivate.len()) as u64
    }

    /// Error when this file anchors more operations than the writer paid for.
    pub fn ensure_within_paid_limit(&self, paid_operation_count: u64) -> Result<(), ProtocolError> {
        let count = self.operation_count();
        if count > paid_operation_count {
            return Err(ProtocolError::AnchorFileOperationCountExceededPaidLimit {
                count,
                paid: paid_operation_count,
            });
        }
        Ok(())
    }

    /// Every DID suffix this file touches; create suffixes are derived from
    /// their suffix data.
    pub fn did_suffixes(&self) -> Result<Vec<String>, ProtocolError> {
        let mut suffixes = Vec::with_capacity(self.operation_count() as usize);
        for entry in &self.operations.create {
            suffixes.push(multihash::canonicalize_then_hash_then_encode(&entry.suffix_data)?);
        }
        for entry in self.operations.recover.iter().chain(&self.operations.deactivate) {
            suffixes.push(entry.did_suffix.clone());
        }
        Ok(suffixes)
    }
}
