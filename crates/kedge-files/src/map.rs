use kedge_core::{ProtocolError, ProtocolParameters};
use kedge_crypto::multihash;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::anchor::SignedOperationEntry;
use crate::compress::{self, DecompressError};

// ── MapFileModel ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChunkReference {
    pub chunk_file_uri: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct MapFileOperations {
    pub update: Vec<SignedOperationEntry>,
}

/// The second file tier: references the chunk file and carries the batch's
/// update operations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapFileModel {
    pub chunks: Vec<ChunkReference>,
    #[serde(default)]
    pub operations: MapFileOperations,
}

impl MapFileModel {
    /// Decompress, parse, and validate a map file, including the cross-file
    /// invariants against its anchor file: the combined operation count cap
    /// and one-operation-per-DID-per-transaction (I1).
    pub fn parse(
        bytes: &[u8],
        params: &ProtocolParameters,
        anchor_did_suffixes: &HashSet<String>,
        anchor_operation_count: u64,
    ) -> Result<Self, ProtocolError> {
        let max = params.max_map_file_bytes * params.max_decompression_factor;
        let json = compress::decompress(bytes, max).map_err(|e| match e {
            DecompressError::Malformed => ProtocolError::MapFileDecompressionFailure,
            DecompressError::TooLarge => {
                ProtocolError::MapFileMalformed("decompressed size exceeds limit".to_string())
            }
        })?;
        let file: MapFileModel = serde_json::from_slice(&json)
            .map_err(|e| ProtocolError::MapFileMalformed(e.to_string()))?;

        if file.chunks.len() != 1 {
            return Err(ProtocolError::MapFileChunkReferenceCountInvalid(file.chunks.len()));
        }
        if !multihash::is_valid_encoded_multihash(&file.chunks[0].chunk_file_uri) {
            return Err(ProtocolError::MapFileChunkFileUriInvalid);
        }

        let count = anchor_operation_count + file.operations.update.len() as u64;
        if count > params.max_operations_per_transaction {
            return Err(ProtocolError::MapFileOperationCountExceededLimit {
                count,
                max: params.max_operations_per_transaction,
            });
        }

        let mut seen = HashSet::new();
        for entry in &file.operations.update {
            if !multihash::is_valid_encoded_multihash(&entry.did_suffix)
                || !multihash::is_valid_encoded_multihash(&entry.reveal_value)
            {
                return Err(ProtocolError::MapFileMalformed(
                    "update entry carries an invalid encoded multihash".to_string(),
                ));
            }
            if anchor_did_suffixes.contains(&entry.did_suffix) || !seen.insert(&entry.did_suffix) {
                return Err(ProtocolError::DuplicateOperationForDid(entry.did_suffix.clone()));
            }
        }

        Ok(file)
    }

    /// Serialize and compress for CAS upload.
    pub fn create_buffer(&self) -> Result<Vec<u8>, ProtocolError> {
        let json = serde_json::to_vec(self)
            .map_err(|e| ProtocolError::MapFileMalformed(e.to_string()))?;
        Ok(compress::compress(&json))
    }

    pub fn chunk_file_uri(&self) -> &str {
        &self.chunks[0].chunk_file_uri
    }
}
