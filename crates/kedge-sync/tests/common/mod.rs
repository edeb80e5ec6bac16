//! Mock CAS/ledger and batch-file builders for the sync test suites.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use kedge_core::{
    Cas, DidSuffix, FetchResult, FetchResultCode, Ledger, LedgerError, LedgerReadResult,
    LedgerTimeModel, OperationStore, ProtocolParameters, TransactionModel, ValueTimeLockModel,
};
use kedge_crypto::{
    commitment_from_jwk, multihash, reveal_value_from_jwk, CompactJws, KeyPair,
};
use kedge_files::{
    AnchorFileModel, AnchorFileOperations, ChunkFileModel, ChunkReference, CreateEntry,
    MapFileModel, MapFileOperations, SignedOperationEntry,
};
use kedge_resolver::{OperationProcessor, Resolver, VersionRegistry};
use kedge_sync::{
    DownloadManager, LockAmountVerifier, PerOperationFeeManager, TransactionProcessor,
};
use serde_json::{json, Value};

// ── MockCas ──────────────────────────────────────────────────────────────────

/// Content-addressed in-memory CAS. Unknown addresses come back `NotFound`
/// unless an explicit result was scripted for them.
#[derive(Default)]
pub struct MockCas {
    entries: Mutex<HashMap<String, FetchResult>>,
}

impl MockCas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `content` under its own multihash and return the address.
    pub fn put(&self, content: &[u8]) -> String {
        let address =
            multihash::hash_then_encode(content, multihash::DEFAULT_HASH_CODE).unwrap();
        self.entries
            .lock()
            .unwrap()
            .insert(address.clone(), FetchResult::success(content.to_vec()));
        address
    }

    /// Script an exact fetch result for `address`.
    pub fn script(&self, address: &str, code: FetchResultCode) {
        self.entries
            .lock()
            .unwrap()
            .insert(address.to_string(), FetchResult::of(code));
    }

    pub fn remove(&self, address: &str) {
        self.entries.lock().unwrap().remove(address);
    }
}

#[async_trait]
impl Cas for MockCas {
    async fn read(&self, address: &str, max_size_bytes: usize) -> FetchResult {
        match self.entries.lock().unwrap().get(address) {
            Some(result) => {
                if let Some(content) = &result.content {
                    if content.len() > max_size_bytes {
                        return FetchResult::of(FetchResultCode::MaxSizeExceeded);
                    }
                }
                result.clone()
            }
            None => FetchResult::of(FetchResultCode::NotFound),
        }
    }
}

// ── MockLedger ───────────────────────────────────────────────────────────────

/// Scripted ledger: a canonical transaction list, optional value time
/// locks, and a one-shot cursor rejection to simulate a fork.
#[derive(Default)]
pub struct MockLedger {
    pub canonical: Mutex<Vec<TransactionModel>>,
    pub locks: Mutex<HashMap<String, ValueTimeLockModel>>,
    pub reject_next_read: Mutex<bool>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_transaction(&self, transaction: TransactionModel) {
        let mut canonical = self.canonical.lock().unwrap();
        canonical.push(transaction);
        canonical.sort_by_key(|tx| tx.transaction_number);
    }

    pub fn set_lock(&self, lock: ValueTimeLockModel) {
        self.locks.lock().unwrap().insert(lock.identifier.clone(), lock);
    }

    pub fn reject_next_read(&self) {
        *self.reject_next_read.lock().unwrap() = true;
    }
}

#[async_trait]
impl Ledger for MockLedger {
    async fn read(
        &self,
        since_transaction_number: Option<u64>,
        _transaction_time_hash: Option<&str>,
    ) -> Result<LedgerReadResult, LedgerError> {
        let mut reject = self.reject_next_read.lock().unwrap();
        if *reject {
            *reject = false;
            return Err(LedgerError::Request("transaction no longer on chain".to_string()));
        }
        drop(reject);

        let canonical = self.canonical.lock().unwrap();
        let transactions: Vec<TransactionModel> = canonical
            .iter()
            .filter(|tx| match since_transaction_number {
                Some(since) => tx.transaction_number > since,
                None => true,
            })
            .cloned()
            .collect();
        Ok(LedgerReadResult { more_transactions: false, transactions })
    }

    async fn write(&self, _anchor_string: &str, _fee: u64) -> Result<(), LedgerError> {
        Ok(())
    }

    async fn approximate_time(&self) -> Result<LedgerTimeModel, LedgerError> {
        let canonical = self.canonical.lock().unwrap();
        Ok(canonical
            .last()
            .map(|tx| LedgerTimeModel {
                time: tx.transaction_time,
                hash: tx.transaction_time_hash.clone(),
            })
            .unwrap_or(LedgerTimeModel { time: 0, hash: String::new() }))
    }

    async fn get_value_time_lock(
        &self,
        identifier: &str,
    ) -> Result<Option<ValueTimeLockModel>, LedgerError> {
        Ok(self.locks.lock().unwrap().get(identifier).cloned())
    }

    async fn get_first_valid_transaction(
        &self,
        transactions: &[TransactionModel],
    ) -> Result<Option<TransactionModel>, LedgerError> {
        let canonical = self.canonical.lock().unwrap();
        Ok(transactions
            .iter()
            .find(|candidate| {
                canonical.iter().any(|tx| {
                    tx.transaction_number == candidate.transaction_number
                        && tx.transaction_time_hash == candidate.transaction_time_hash
                })
            })
            .cloned())
    }
}

// ── Batch building ───────────────────────────────────────────────────────────

/// Key material and file fragments for one DID in a batch.
pub struct TestDid {
    pub recovery_key: KeyPair,
    pub update_key: KeyPair,
    pub signing_key: KeyPair,
    pub suffix_data: Value,
    pub delta: Value,
    pub did_suffix: DidSuffix,
}

pub fn new_did() -> TestDid {
    let recovery_key = KeyPair::generate_ed25519();
    let update_key = KeyPair::generate_ed25519();
    let signing_key = KeyPair::generate_ed25519();
    let delta = json!({
        "patches": [{
            "action": "add-public-keys",
            "public_keys": [{
                "id": "signing-key",
                "type": "JsonWebKey2020",
                "public_key_jwk": signing_key.public_jwk(),
                "purposes": ["authentication"],
            }],
        }],
        "update_commitment": commitment_from_jwk(&update_key.public_jwk()).unwrap(),
    });
    let suffix_data = json!({
        "delta_hash": multihash::canonicalize_then_hash_then_encode(&delta).unwrap(),
        "recovery_commitment": commitment_from_jwk(&recovery_key.public_jwk()).unwrap(),
    });
    let did_suffix =
        DidSuffix::new(multihash::canonicalize_then_hash_then_encode(&suffix_data).unwrap());
    TestDid { recovery_key, update_key, signing_key, suffix_data, delta, did_suffix }
}

/// A scripted update for the map file tier.
pub struct TestUpdate {
    pub entry: SignedOperationEntry,
    pub delta: Value,
}

pub fn service_update(did: &TestDid, next_update_key: &KeyPair, service_id: &str) -> TestUpdate {
    let delta = json!({
        "patches": [{
            "action": "add-services",
            "services": [{
                "id": service_id,
                "type": "LinkedDomains",
                "service_endpoint": format!("https://svc.example.com/{service_id}"),
            }],
        }],
        "update_commitment": commitment_from_jwk(&next_update_key.public_jwk()).unwrap(),
    });
    let payload = json!({
        "update_key": did.update_key.public_jwk(),
        "delta_hash": multihash::canonicalize_then_hash_then_encode(&delta).unwrap(),
    });
    let jws = CompactJws::sign(&payload, &did.update_key).unwrap();
    TestUpdate {
        entry: SignedOperationEntry {
            did_suffix: did.did_suffix.as_str().to_string(),
            reveal_value: reveal_value_from_jwk(&did.update_key.public_jwk()).unwrap(),
            signed_data: jws.as_compact().to_string(),
        },
        delta,
    }
}

/// Addresses of one uploaded batch.
pub struct BatchFiles {
    pub anchor_string: String,
    pub anchor_uri: String,
    pub map_uri: String,
    pub chunk_uri: String,
}

/// Upload a full anchor/map/chunk bundle for `creates` + `updates`.
/// `declared_operations` overrides the anchor-string count when given.
pub fn upload_batch(
    cas: &MockCas,
    creates: &[&TestDid],
    updates: &[&TestUpdate],
    declared_operations: Option<u64>,
) -> BatchFiles {
    let deltas: Vec<Value> = creates
        .iter()
        .map(|did| did.delta.clone())
        .chain(updates.iter().map(|u| u.delta.clone()))
        .collect();
    let chunk = ChunkFileModel { deltas };
    let chunk_uri = cas.put(&chunk.create_buffer().unwrap());

    let map = MapFileModel {
        chunks: vec![ChunkReference { chunk_file_uri: chunk_uri.clone() }],
        operations: MapFileOperations {
            update: updates.iter().map(|u| u.entry.clone()).collect(),
        },
    };
    let map_uri = cas.put(&map.create_buffer().unwrap());

    let anchor = AnchorFileModel {
        writer_lock_id: None,
        map_file_uri: map_uri.clone(),
        operations: AnchorFileOperations {
            create: creates
                .iter()
                .map(|did| CreateEntry { suffix_data: did.suffix_data.clone() })
                .collect(),
            recover: vec![],
            deactivate: vec![],
        },
    };
    let anchor_uri = cas.put(&anchor.create_buffer().unwrap());

    let count = declared_operations.unwrap_or((creates.len() + updates.len()) as u64);
    BatchFiles {
        anchor_string: format!("{count}.{anchor_uri}"),
        anchor_uri,
        map_uri,
        chunk_uri,
    }
}

// ── Harness ──────────────────────────────────────────────────────────────────

pub fn transaction(number: u64, anchor_string: &str, fee: u64) -> TransactionModel {
    TransactionModel {
        transaction_number: number,
        transaction_time: number,
        transaction_time_hash: format!("time-hash-{number}"),
        anchor_string: anchor_string.to_string(),
        transaction_fee_paid: fee,
        normalized_transaction_fee: Some(1),
        writer: "writer-1".to_string(),
    }
}

pub fn processor(
    cas: Arc<MockCas>,
    store: Arc<dyn OperationStore>,
    ledger: Arc<MockLedger>,
) -> TransactionProcessor {
    TransactionProcessor::new(
        DownloadManager::new(cas, 4),
        store,
        ledger,
        Arc::new(PerOperationFeeManager { fee_per_operation: 1 }),
        Arc::new(LockAmountVerifier { max_operations_without_lock: 100 }),
        ProtocolParameters::default(),
    )
}

pub fn resolver(store: Arc<dyn OperationStore>) -> Resolver {
    Resolver::new(
        store,
        Arc::new(VersionRegistry::single(OperationProcessor::new(
            ProtocolParameters::default(),
        ))),
        ProtocolParameters::default(),
    )
}
