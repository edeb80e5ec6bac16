use kedge_core::{ProtocolError, ProtocolParameters};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::compress::{self, DecompressError};

/// The third file tier: one delta per create/recover/update of the batch, in
/// that concatenated order. Deltas stay raw JSON here; each is parsed
/// strictly only when its operation is, so one bad delta cannot poison the
/// rest of the batch.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChunkFileModel {
    pub deltas: Vec<Value>,
}

impl ChunkFileModel {
    /// Decompress, parse, and structurally validate a chunk file.
    pub fn parse(bytes: &[u8], params: &ProtocolParameters) -> Result<Self, ProtocolError> {
        let max = params.max_chunk_file_bytes * params.max_decompression_factor;
        let json = compress::decompress(bytes, max).map_err(|e| match e {
            DecompressError::Malformed => ProtocolError::ChunkFileDecompressionFailure,
            DecompressError::TooLarge => {
                ProtocolError::ChunkFileMalformed("decompressed size exceeds limit".to_string())
            }
        })?;
        let file: ChunkFileModel = serde_json::from_slice(&json)
            .map_err(|e| ProtocolError::ChunkFileMalformed(e.to_string()))?;

        if let Some(position) = file.deltas.iter().position(|d| !d.is_object()) {
            return Err(ProtocolError::ChunkFileMalformed(format!(
                "delta at index {position} is not a JSON object"
            )));
        }

        Ok(file)
    }

    /// Serialize and compress for CAS upload.
    pub fn create_buffer(&self) -> Result<Vec<u8>, ProtocolError> {
        let json = serde_json::to_vec(self)
            .map_err(|e| ProtocolError::ChunkFileMalformed(e.to_string()))?;
        Ok(compress::compress(&json))
    }
}
