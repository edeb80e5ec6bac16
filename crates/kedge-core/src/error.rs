use thiserror::Error;

/// The closed protocol error enumeration.
///
/// Every variant carries a stable string code (`code()`) so embedders can
/// match on failures without depending on display text. Infrastructure
/// faults (storage, ledger reachability) are deliberately NOT here; they use
/// the small local enums next to their traits.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProtocolError {
    // ── Multihash / encoding ─────────────────────────────────────────────────
    #[error("multihash algorithm 0x{0:x} is not supported")]
    MultihashUnsupportedAlgorithm(u64),

    #[error("malformed multihash buffer")]
    MultihashMalformed,

    #[error("invalid base64url content")]
    Base64DecodeFailure,

    #[error("value cannot be canonicalized: {0}")]
    CanonicalizationFailure(String),

    // ── JWK / JWS ────────────────────────────────────────────────────────────
    #[error("unsupported JWK key type: {0}")]
    JwkUnsupportedKeyType(String),

    #[error("unsupported JWK curve: {0}")]
    JwkUnsupportedCurve(String),

    #[error("JWK point is malformed for its declared curve")]
    JwkPointMalformed,

    #[error("compact JWS is malformed")]
    JwsMalformed,

    #[error("JWS protected header algorithm missing or unknown")]
    JwsHeaderMissingOrUnknownAlgorithm,

    #[error("JWS payload is not a JSON object")]
    JwsPayloadNotJson,

    #[error("JWS signature verification failed")]
    JwsSignatureInvalid,

    // ── Operation envelope ───────────────────────────────────────────────────
    #[error("operation buffer is not a JSON object")]
    OperationNotJson,

    #[error("unknown operation type: {0}")]
    OperationTypeUnknown(String),

    #[error("operation buffer type '{found}' does not match anchored type '{expected}'")]
    OperationTypeMismatch { expected: String, found: String },

    #[error("operation envelope carries a field foreign to its kind")]
    OperationEnvelopeExtraneousField,

    #[error("operation did_suffix missing or not a valid encoded multihash")]
    OperationDidSuffixMissingOrInvalid,

    #[error("operation reveal_value missing or not a valid encoded multihash")]
    OperationRevealValueMissingOrInvalid,

    #[error("revealed public key does not hash to the operation's reveal_value")]
    OperationRevealValueMismatch,

    #[error("reveal value is not defined for create operations")]
    OperationRevealValueNotAvailable,

    // ── Per-kind structural errors ───────────────────────────────────────────
    #[error("create operation is missing suffix_data")]
    CreateOperationMissingSuffixData,

    #[error("create operation suffix_data is malformed")]
    CreateOperationSuffixDataMalformed,

    #[error("update operation signed_data payload is malformed")]
    UpdateOperationSignedDataMalformed,

    #[error("update operation delta hash does not match signed delta_hash")]
    UpdateOperationDeltaHashMismatch,

    #[error("recover operation signed_data payload is malformed")]
    RecoverOperationSignedDataMalformed,

    #[error("deactivate operation signed_data payload is malformed")]
    DeactivateOperationSignedDataMalformed,

    #[error("deactivate operation signed did_suffix does not match envelope")]
    DeactivateOperationDidSuffixMismatch,

    // ── Delta ────────────────────────────────────────────────────────────────
    #[error("operation delta is missing or not a JSON object")]
    DeltaMissingOrNotObject,

    #[error("operation delta is malformed: {0}")]
    DeltaMalformed(String),

    #[error("operation delta exceeds {limit} bytes (got {got})")]
    DeltaExceedsMaximumSize { got: usize, limit: usize },

    // ── Document patches ─────────────────────────────────────────────────────
    #[error("document patch action missing or unknown")]
    DocumentPatchMissingOrUnknownAction,

    #[error("document patch public key entry is malformed")]
    DocumentPatchPublicKeyMalformed,

    #[error("document patch contains duplicated public key id: {0}")]
    DocumentPatchPublicKeyIdDuplicated(String),

    #[error("document patch service entry is malformed")]
    DocumentPatchServiceMalformed,

    #[error("document patch contains duplicated service id: {0}")]
    DocumentPatchServiceIdDuplicated(String),

    // ── Anchor string ────────────────────────────────────────────────────────
    #[error("anchor string is malformed")]
    AnchorStringMalformed,

    #[error("anchor string operation count is invalid")]
    AnchorStringOperationCountInvalid,

    // ── Anchor file ──────────────────────────────────────────────────────────
    #[error("anchor file failed to decompress")]
    AnchorFileDecompressionFailure,

    #[error("anchor file is malformed: {0}")]
    AnchorFileMalformed(String),

    #[error("anchor file map_file_uri is not a valid encoded multihash")]
    AnchorFileMapFileUriInvalid,

    #[error("anchor file contains duplicate did suffix: {0}")]
    AnchorFileDuplicateDidSuffix(String),

    #[error("anchor file operation count {count} exceeds protocol maximum {max}")]
    AnchorFileOperationCountExceededLimit { count: u64, max: u64 },

    #[error("anchor file operation count {count} exceeds paid operation count {paid}")]
    AnchorFileOperationCountExceededPaidLimit { count: u64, paid: u64 },

    // ── Map file ─────────────────────────────────────────────────────────────
    #[error("map file failed to decompress")]
    MapFileDecompressionFailure,

    #[error("map file is malformed: {0}")]
    MapFileMalformed(String),

    #[error("map file must reference exactly one chunk file (got {0})")]
    MapFileChunkReferenceCountInvalid(usize),

    #[error("map file chunk_file_uri is not a valid encoded multihash")]
    MapFileChunkFileUriInvalid,

    #[error("combined anchor+map operation count {count} exceeds protocol maximum {max}")]
    MapFileOperationCountExceededLimit { count: u64, max: u64 },

    #[error("did suffix {0} appears in more than one operation for this transaction")]
    DuplicateOperationForDid(String),

    // ── Chunk file ───────────────────────────────────────────────────────────
    #[error("chunk file failed to decompress")]
    ChunkFileDecompressionFailure,

    #[error("chunk file is malformed: {0}")]
    ChunkFileMalformed(String),

    #[error("chunk file delta count {got} does not match expected {expected}")]
    ChunkFileDeltaCountIncorrect { expected: usize, got: usize },

    // ── Fees / value time locks ──────────────────────────────────────────────
    #[error("transaction fee {fee_paid} is below the required {required}")]
    TransactionFeeBelowRequired { fee_paid: u64, required: u64 },

    #[error("value time lock is invalid: {0}")]
    ValueTimeLockInvalid(String),
}

impl ProtocolError {
    /// Stable machine-readable code for this error. Never reworded once
    /// released; embedders key retries and telemetry on these.
    pub fn code(&self) -> &'static str {
        use ProtocolError::*;
        match self {
            MultihashUnsupportedAlgorithm(_) => "multihash-unsupported-algorithm",
            MultihashMalformed => "multihash-malformed",
            Base64DecodeFailure => "base64-decode-failure",
            CanonicalizationFailure(_) => "canonicalization-failure",
            JwkUnsupportedKeyType(_) => "jwk-unsupported-key-type",
            JwkUnsupportedCurve(_) => "jwk-unsupported-curve",
            JwkPointMalformed => "jwk-point-malformed",
            JwsMalformed => "jws-malformed",
            JwsHeaderMissingOrUnknownAlgorithm => "jws-header-missing-or-unknown-algorithm",
            JwsPayloadNotJson => "jws-payload-not-json",
            JwsSignatureInvalid => "jws-signature-invalid",
            OperationNotJson => "operation-not-json",
            OperationTypeUnknown(_) => "operation-type-unknown",
            OperationTypeMismatch { .. } => "operation-type-mismatch",
            OperationEnvelopeExtraneousField => "operation-envelope-extraneous-field",
            OperationDidSuffixMissingOrInvalid => "operation-did-suffix-missing-or-invalid",
            OperationRevealValueMissingOrInvalid => "operation-reveal-value-missing-or-invalid",
            OperationRevealValueMismatch => "operation-reveal-value-mismatch",
            OperationRevealValueNotAvailable => "operation-reveal-value-not-available",
            CreateOperationMissingSuffixData => "create-operation-missing-suffix-data",
            CreateOperationSuffixDataMalformed => "create-operation-suffix-data-malformed",
            UpdateOperationSignedDataMalformed => "update-operation-signed-data-malformed",
            UpdateOperationDeltaHashMismatch => "update-operation-delta-hash-mismatch",
            RecoverOperationSignedDataMalformed => "recover-operation-signed-data-malformed",
            DeactivateOperationSignedDataMalformed => "deactivate-operation-signed-data-malformed",
            DeactivateOperationDidSuffixMismatch => "deactivate-operation-did-suffix-mismatch",
            DeltaMissingOrNotObject => "delta-missing-or-not-object",
            DeltaMalformed(_) => "delta-malformed",
            DeltaExceedsMaximumSize { .. } => "delta-exceeds-maximum-size",
            DocumentPatchMissingOrUnknownAction => "document-patch-missing-or-unknown-action",
            DocumentPatchPublicKeyMalformed => "document-patch-public-key-malformed",
            DocumentPatchPublicKeyIdDuplicated(_) => "document-patch-public-key-id-duplicated",
            DocumentPatchServiceMalformed => "document-patch-service-malformed",
            DocumentPatchServiceIdDuplicated(_) => "document-patch-service-id-duplicated",
            AnchorStringMalformed => "anchor-string-malformed",
            AnchorStringOperationCountInvalid => "anchor-string-operation-count-invalid",
            AnchorFileDecompressionFailure => "anchor-file-decompression-failure",
            AnchorFileMalformed(_) => "anchor-file-malformed",
            AnchorFileMapFileUriInvalid => "anchor-file-map-file-uri-invalid",
            AnchorFileDuplicateDidSuffix(_) => "anchor-file-duplicate-did-suffix",
            AnchorFileOperationCountExceededLimit { .. } => {
                "anchor-file-operation-count-exceeded-limit"
            }
            AnchorFileOperationCountExceededPaidLimit { .. } => {
                "anchor-file-operation-count-exceeded-paid-limit"
            }
            MapFileDecompressionFailure => "map-file-decompression-failure",
            MapFileMalformed(_) => "map-file-malformed",
            MapFileChunkReferenceCountInvalid(_) => "map-file-chunk-reference-count-invalid",
            MapFileChunkFileUriInvalid => "map-file-chunk-file-uri-invalid",
            MapFileOperationCountExceededLimit { .. } => "map-file-operation-count-exceeded-limit",
            DuplicateOperationForDid(_) => "duplicate-operation-for-did",
            ChunkFileDecompressionFailure => "chunk-file-decompression-failure",
            ChunkFileMalformed(_) => "chunk-file-malformed",
            ChunkFileDeltaCountIncorrect { .. } => "chunk-file-delta-count-incorrect",
            TransactionFeeBelowRequired { .. } => "transaction-fee-below-required",
            ValueTimeLockInvalid(_) => "value-time-lock-invalid",
        }
    }
}
