//! Protocol limits and tunables.
//!
//! The constants are the genesis defaults; `ProtocolParameters` carries them
//! at runtime so a future protocol version can re-tune without code changes.

use once_cell::sync::Lazy;

// ── Batch limits ─────────────────────────────────────────────────────────────

/// Maximum operations a single transaction may anchor across all file tiers.
pub const MAX_OPERATIONS_PER_TRANSACTION: u64 = 10_000;

/// Maximum compressed anchor file size accepted from the CAS.
pub const MAX_ANCHOR_FILE_BYTES: usize = 1_000_000;

/// Maximum compressed map file size accepted from the CAS.
pub const MAX_MAP_FILE_BYTES: usize = 1_000_000;

/// Maximum compressed chunk file size accepted from the CAS.
pub const MAX_CHUNK_FILE_BYTES: usize = 10_000_000;

/// Decompression expansion allowance: a file may inflate to at most this
/// multiple of its compressed-size cap before parsing aborts.
pub const MAX_DECOMPRESSION_FACTOR: usize = 3;

// ── Operation limits ─────────────────────────────────────────────────────────

/// Maximum canonical byte size of a single delta.
pub const MAX_DELTA_BYTES: usize = 1_000;

/// Hard cap on operations the resolver will apply for one DID. Bounds the
/// commitment-chain walk against adversarial store contents.
pub const MAX_OPERATIONS_PER_DID: usize = 10_000;

// ── ProtocolParameters ───────────────────────────────────────────────────────

/// Runtime view of the protocol limits above.
#[derive(Debug, Clone)]
pub struct ProtocolParameters {
    pub max_operations_per_transaction: u64,
    pub max_anchor_file_bytes: usize,
    pub max_map_file_bytes: usize,
    pub max_chunk_file_bytes: usize,
    pub max_decompression_factor: usize,
    pub max_delta_bytes: usize,
    pub max_operations_per_did: usize,
}

impl Default for ProtocolParameters {
    fn default() -> Self {
        Self {
            max_operations_per_transaction: MAX_OPERATIONS_PER_TRANSACTION,
            max_anchor_file_bytes: MAX_ANCHOR_FILE_BYTES,
            max_map_file_bytes: MAX_MAP_FILE_BYTES,
            max_chunk_file_bytes: MAX_CHUNK_FILE_BYTES,
            max_decompression_factor: MAX_DECOMPRESSION_FACTOR,
            max_delta_bytes: MAX_DELTA_BYTES,
            max_operations_per_did: MAX_OPERATIONS_PER_DID,
        }
    }
}

static DEFAULT_PARAMETERS: Lazy<ProtocolParameters> = Lazy::new(ProtocolParameters::default);

impl ProtocolParameters {
    /// Shared genesis-default parameter set.
    pub fn genesis() -> &'static ProtocolParameters {
        &DEFAULT_PARAMETERS
    }
}
