use std::collections::HashSet;
use std::sync::Arc;

use kedge_core::{
    AnchoredOperationModel, DidSuffix, FeeManager, FetchResult, FetchResultCode, Ledger,
    OperationStore, OperationType, ProtocolError, ProtocolParameters, TransactionModel,
    ValueTimeLockVerifier,
};
use kedge_crypto::{canonicalize, multihash};
use kedge_files::{AnchorFileModel, AnchoredData, ChunkFileModel, MapFileModel};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::download::DownloadManager;

// ── Failure taxonomy ─────────────────────────────────────────────────────────

// Internal classification backing the boolean contract of
// `process_transaction`: protocol violations and permanently-unfetchable
// content poison the transaction (do not retry); everything else is
// transient.
enum Failure {
    Protocol(ProtocolError),
    Unfetchable(FetchResultCode),
    Transient(String),
}

impl From<ProtocolError> for Failure {
    fn from(err: ProtocolError) -> Self {
        Failure::Protocol(err)
    }
}

// ── TransactionProcessor ─────────────────────────────────────────────────────

/// Materialises one ledger transaction into persisted anchored operations.
///
/// The pipeline is opportunistic: a valid anchor file is enough to persist
/// its create/recover/deactivate operations; a missing or invalid map file
/// loses only the updates; a missing or invalid chunk file loses only the
/// deltas.
pub struct TransactionProcessor {
    downloads: DownloadManager,
    operation_store: Arc<dyn OperationStore>,
    ledger: Arc<dyn Ledger>,
    fee_manager: Arc<dyn FeeManager>,
    lock_verifier: Arc<dyn ValueTimeLockVerifier>,
    params: ProtocolParameters,
}

impl TransactionProcessor {
    pub fn new(
        downloads: DownloadManager,
        operation_store: Arc<dyn OperationStore>,
        ledger: Arc<dyn Ledger>,
        fee_manager: Arc<dyn FeeManager>,
        lock_verifier: Arc<dyn ValueTimeLockVerifier>,
        params: ProtocolParameters,
    ) -> Self {
        Self { downloads, operation_store, ledger, fee_manager, lock_verifier, params }
    }

    /// Process one transaction end to end. Returns `true` when the
    /// transaction is fully handled (including permanently unprocessable
    /// ones) and `false` when a transient failure warrants a retry.
    pub async fn process_transaction(&self, transaction: &TransactionModel) -> bool {
        match self.process(transaction).await {
            Ok(operation_count) => {
                info!(
                    transaction_number = transaction.transaction_number,
                    operations = operation_count,
                    "processed transaction"
                );
                true
            }
            Err(Failure::Protocol(err)) => {
                warn!(
                    transaction_number = transaction.transaction_number,
                    code = err.code(),
                    error = %err,
                    "transaction violates the protocol; will not retry"
                );
                true
            }
            Err(Failure::Unfetchable(code)) => {
                warn!(
                    transaction_number = transaction.transaction_number,
                    code = ?code,
                    "anchor file content is permanently unfetchable; will not retry"
                );
                true
            }
            Err(Failure::Transient(reason)) => {
                warn!(
                    transaction_number = transaction.transaction_number,
                    reason = %reason,
                    "transient failure; transaction will be retried"
                );
                false
            }
        }
    }

    async fn process(&self, transaction: &TransactionModel) -> Result<usize, Failure> {
        // 1. The anchor string itself.
        let anchored_data = AnchoredData::parse(&transaction.anchor_string)?;
        let paid_operation_count = anchored_data.number_of_operations;

        // 2. Fee entitlement.
        self.fee_manager.verify(
            paid_operation_count,
            transaction.transaction_fee_paid,
            transaction.transaction_time,
        )?;

        // 3. Anchor file (mandatory tier).
        let anchor_file = self
            .download_and_verify_anchor_file(
                transaction,
                &anchored_data.anchor_file_uri,
                paid_operation_count,
            )
            .await?;

        // 4. Map file (optional tier: expected failures degrade to None).
        let map_file = self
            .download_and_verify_map_file(&anchor_file, anchor_file.operation_count())
            .await?;

        // 5. Chunk file (optional tier).
        let chunk_file = match &map_file {
            Some(map_file) => {
                let expected_deltas = anchor_file.operations.create.len()
                    + anchor_file.operations.recover.len()
                    + map_file.operations.update.len();
                self.download_and_verify_chunk_file(map_file, expected_deltas).await?
            }
            None => None,
        };

        // 6. Compose the canonical operation stream.
        let operations = compose_anchored_operations(
            transaction,
            &anchor_file,
            map_file.as_ref(),
            chunk_file.as_ref(),
        )?;

        // 7. Persist in one batch; the store's composite key makes replays
        // after a partial failure idempotent.
        self.operation_store
            .put(&operations)
            .await
            .map_err(|e| Failure::Transient(e.to_string()))?;

        Ok(operations.len())
    }

    // ── Tier downloads ───────────────────────────────────────────────────────

    async fn download_and_verify_anchor_file(
        &self,
        transaction: &TransactionModel,
        anchor_file_uri: &str,
        paid_operation_count: u64,
    ) -> Result<AnchorFileModel, Failure> {
        let content =
            required_content(self.downloads.download(anchor_file_uri, self.params.max_anchor_file_bytes).await)?;
        let anchor_file = AnchorFileModel::parse(&content, &self.params)?;
        anchor_file.ensure_within_paid_limit(paid_operation_count)?;

        // Value time lock: lock lookups are ledger I/O (transient on
        // failure); an invalid lock is a protocol violation.
        let lock = match &anchor_file.writer_lock_id {
            Some(lock_id) => self
                .ledger
                .get_value_time_lock(lock_id)
                .await
                .map_err(|e| Failure::Transient(e.to_string()))?,
            None => None,
        };
        self.lock_verifier.verify(
            lock.as_ref(),
            paid_operation_count,
            transaction.transaction_time,
            &transaction.writer,
        )?;

        Ok(anchor_file)
    }

    async fn download_and_verify_map_file(
        &self,
        anchor_file: &AnchorFileModel,
        anchor_operation_count: u64,
    ) -> Result<Option<MapFileModel>, Failure> {
        let fetch = self
            .downloads
            .download(&anchor_file.map_file_uri, self.params.max_map_file_bytes)
            .await;
        let Some(content) = optional_content(fetch, "map file")? else {
            return Ok(None);
        };

        let anchor_suffixes: HashSet<String> =
            anchor_file.did_suffixes()?.into_iter().collect();
        match MapFileModel::parse(&content, &self.params, &anchor_suffixes, anchor_operation_count)
        {
            Ok(map_file) => Ok(Some(map_file)),
            Err(err) => {
                warn!(code = err.code(), error = %err, "map file rejected; updates lost");
                Ok(None)
            }
        }
    }

    async fn download_and_verify_chunk_file(
        &self,
        map_file: &MapFileModel,
        expected_delta_count: usize,
    ) -> Result<Option<ChunkFileModel>, Failure> {
        let fetch = self
            .downloads
            .download(map_file.chunk_file_uri(), self.params.max_chunk_file_bytes)
            .await;
        let Some(content) = optional_content(fetch, "chunk file")? else {
            return Ok(None);
        };

        match ChunkFileModel::parse(&content, &self.params) {
            Ok(chunk_file) if chunk_file.deltas.len() == expected_delta_count => {
                Ok(Some(chunk_file))
            }
            Ok(chunk_file) => {
                let err = ProtocolError::ChunkFileDeltaCountIncorrect {
                    expected: expected_delta_count,
                    got: chunk_file.deltas.len(),
                };
                warn!(code = err.code(), error = %err, "chunk file rejected; deltas lost");
                Ok(None)
            }
            Err(err) => {
                warn!(code = err.code(), error = %err, "chunk file rejected; deltas lost");
                Ok(None)
            }
        }
    }
}

// The mandatory tier: anything but success fails the transaction, split by
// the retry taxonomy (not-yet-propagated content and unreachable CAS are
// transient; the rest can never succeed).
fn required_content(fetch: FetchResult) -> Result<Vec<u8>, Failure> {
    match fetch.code {
        FetchResultCode::Success => Ok(fetch.content.unwrap_or_default()),
        FetchResultCode::NotFound | FetchResultCode::CasNotReachable => {
            Err(Failure::Transient(format!("anchor file fetch failed: {:?}", fetch.code)))
        }
        code => Err(Failure::Unfetchable(code)),
    }
}

// Optional tiers: only an unreachable CAS propagates (the whole transaction
// retries); every other failure degrades to None.
fn optional_content(fetch: FetchResult, tier: &str) -> Result<Option<Vec<u8>>, Failure> {
    match fetch.code {
        FetchResultCode::Success => Ok(fetch.content),
        FetchResultCode::CasNotReachable => {
            Err(Failure::Transient(format!("{tier} fetch failed: CAS not reachable")))
        }
        code => {
            warn!(tier = tier, code = ?code, "tier unavailable; continuing without it");
            Ok(None)
        }
    }
}

// ── Composition ──────────────────────────────────────────────────────────────

// Zip file entries with their deltas in canonical order (creates, recovers,
// updates, deactivates; deltas indexed create‖recover‖update) and emit one
// anchored operation per entry. `operation_index` is the position in that
// order, which together with the transaction number forms the store's
// idempotency key.
fn compose_anchored_operations(
    transaction: &TransactionModel,
    anchor_file: &AnchorFileModel,
    map_file: Option<&MapFileModel>,
    chunk_file: Option<&ChunkFileModel>,
) -> Result<Vec<AnchoredOperationModel>, Failure> {
    let deltas: Option<&[Value]> = chunk_file.map(|chunk| chunk.deltas.as_slice());
    let delta_at = |i: usize| -> Option<Value> { deltas.and_then(|d| d.get(i)).cloned() };

    let create_count = anchor_file.operations.create.len();
    let recover_count = anchor_file.operations.recover.len();

    let mut operations = Vec::new();
    let mut operation_index: u32 = 0;

    for (i, entry) in anchor_file.operations.create.iter().enumerate() {
        let did_suffix =
            DidSuffix::new(multihash::canonicalize_then_hash_then_encode(&entry.suffix_data)?);
        let mut envelope = Map::new();
        envelope.insert("type".to_string(), Value::from("create"));
        envelope.insert("suffix_data".to_string(), entry.suffix_data.clone());
        if let Some(delta) = delta_at(i) {
            envelope.insert("delta".to_string(), delta);
        }
        operations.push(anchored_operation(
            OperationType::Create,
            did_suffix,
            envelope,
            transaction,
            &mut operation_index,
        )?);
    }

    for (i, entry) in anchor_file.operations.recover.iter().enumerate() {
        let mut envelope = signed_envelope("recover", entry);
        if let Some(delta) = delta_at(create_count + i) {
            envelope.insert("delta".to_string(), delta);
        }
        operations.push(anchored_operation(
            OperationType::Recover,
            DidSuffix::new(&*entry.did_suffix),
            envelope,
            transaction,
            &mut operation_index,
        )?);
    }

    if let Some(map_file) = map_file {
        for (i, entry) in map_file.operations.update.iter().enumerate() {
            let mut envelope = signed_envelope("update", entry);
            if let Some(delta) = delta_at(create_count + recover_count + i) {
                envelope.insert("delta".to_string(), delta);
            }
            operations.push(anchored_operation(
                OperationType::Update,
                DidSuffix::new(&*entry.did_suffix),
                envelope,
                transaction,
                &mut operation_index,
            )?);
        }
    }

    for entry in &anchor_file.operations.deactivate {
        let envelope = signed_envelope("deactivate", entry);
        operations.push(anchored_operation(
            OperationType::Deactivate,
            DidSuffix::new(&*entry.did_suffix),
            envelope,
            transaction,
            &mut operation_index,
        )?);
    }

    Ok(operations)
}

fn signed_envelope(kind: &str, entry: &kedge_files::SignedOperationEntry) -> Map<String, Value> {
    let mut envelope = Map::new();
    envelope.insert("type".to_string(), Value::from(kind));
    envelope.insert("did_suffix".to_string(), Value::from(entry.did_suffix.clone()));
    envelope.insert("reveal_value".to_string(), Value::from(entry.reveal_value.clone()));
    envelope.insert("signed_data".to_string(), Value::from(entry.signed_data.clone()));
    envelope
}

fn anchored_operation(
    operation_type: OperationType,
    did_suffix: DidSuffix,
    envelope: Map<String, Value>,
    transaction: &TransactionModel,
    operation_index: &mut u32,
) -> Result<AnchoredOperationModel, Failure> {
    let operation_buffer = canonicalize(&Value::Object(envelope))?;
    let operation = AnchoredOperationModel {
        operation_type,
        did_suffix,
        operation_buffer,
        transaction_time: transaction.transaction_time,
        transaction_number: transaction.transaction_number,
        operation_index: *operation_index,
    };
    *operation_index += 1;
    Ok(operation)
}
