//! Operation builders shared by the resolver test suites.

#![allow(dead_code)]

use std::sync::Arc;

use kedge_core::{
    AnchoredOperationModel, DidSuffix, OperationStore, OperationType, ProtocolParameters,
};
use kedge_crypto::{
    canonicalize, commitment_from_jwk, multihash, reveal_value_from_jwk, CompactJws, KeyPair,
};
use kedge_resolver::{OperationProcessor, Resolver, VersionRegistry};
use serde_json::{json, Value};

pub fn processor() -> OperationProcessor {
    OperationProcessor::new(ProtocolParameters::default())
}

pub fn resolver(store: Arc<dyn OperationStore>) -> Resolver {
    Resolver::new(
        store,
        Arc::new(VersionRegistry::single(processor())),
        ProtocolParameters::default(),
    )
}

fn buffer(envelope: &Value) -> Vec<u8> {
    canonicalize(envelope).expect("test envelopes always canonicalize")
}

pub fn add_key_patch(key: &KeyPair, id: &str) -> Value {
    json!({
        "action": "add-public-keys",
        "public_keys": [{
            "id": id,
            "type": "JsonWebKey2020",
            "public_key_jwk": key.public_jwk(),
            "purposes": ["authentication"],
        }],
    })
}

pub fn add_service_patch(id: &str) -> Value {
    json!({
        "action": "add-services",
        "services": [{
            "id": id,
            "type": "LinkedDomains",
            "service_endpoint": format!("https://svc.example.com/{id}"),
        }],
    })
}

pub fn remove_service_patch(id: &str) -> Value {
    json!({ "action": "remove-services", "ids": [id] })
}

pub fn delta(patches: Vec<Value>, next_update_key: &KeyPair) -> Value {
    json!({
        "patches": patches,
        "update_commitment": commitment_from_jwk(&next_update_key.public_jwk()).unwrap(),
    })
}

pub fn delta_hash(delta: &Value) -> String {
    multihash::canonicalize_then_hash_then_encode(delta).unwrap()
}

fn anchored(
    operation_type: OperationType,
    did_suffix: &DidSuffix,
    envelope: &Value,
    transaction_number: u64,
    operation_index: u32,
) -> AnchoredOperationModel {
    AnchoredOperationModel {
        operation_type,
        did_suffix: did_suffix.clone(),
        operation_buffer: buffer(envelope),
        transaction_time: transaction_number,
        transaction_number,
        operation_index,
    }
}

/// A create operation plus the DID it mints.
pub struct CreatedDid {
    pub anchored: AnchoredOperationModel,
    pub did_suffix: DidSuffix,
}

pub fn create_op(
    recovery_key: &KeyPair,
    first_update_key: &KeyPair,
    patches: Vec<Value>,
    transaction_number: u64,
) -> CreatedDid {
    let delta = delta(patches, first_update_key);
    let suffix_data = json!({
        "delta_hash": delta_hash(&delta),
        "recovery_commitment": commitment_from_jwk(&recovery_key.public_jwk()).unwrap(),
    });
    let did_suffix =
        DidSuffix::new(multihash::canonicalize_then_hash_then_encode(&suffix_data).unwrap());
    let envelope = json!({"type": "create", "suffix_data": suffix_data, "delta": delta});
    CreatedDid {
        anchored: anchored(OperationType::Create, &did_suffix, &envelope, transaction_number, 0),
        did_suffix,
    }
}

/// Update signed by `signer`; honest updates pass `current_update_key` as
/// the signer, forgeries pass something else.
pub fn update_op_signed_by(
    did_suffix: &DidSuffix,
    current_update_key: &KeyPair,
    signer: &KeyPair,
    next_update_key: &KeyPair,
    patches: Vec<Value>,
    transaction_number: u64,
) -> AnchoredOperationModel {
    let delta = delta(patches, next_update_key);
    let payload = json!({
        "update_key": current_update_key.public_jwk(),
        "delta_hash": delta_hash(&delta),
    });
    let jws = CompactJws::sign(&payload, signer).unwrap();
    let envelope = json!({
        "type": "update",
        "did_suffix": did_suffix.as_str(),
        "reveal_value": reveal_value_from_jwk(&current_update_key.public_jwk()).unwrap(),
        "signed_data": jws.as_compact(),
        "delta": delta,
    });
    anchored(OperationType::Update, did_suffix, &envelope, transaction_number, 0)
}

pub fn update_op(
    did_suffix: &DidSuffix,
    current_update_key: &KeyPair,
    next_update_key: &KeyPair,
    patches: Vec<Value>,
    transaction_number: u64,
) -> AnchoredOperationModel {
    update_op_signed_by(
        did_suffix,
        current_update_key,
        current_update_key,
        next_update_key,
        patches,
        transaction_number,
    )
}

pub fn recover_op(
    did_suffix: &DidSuffix,
    current_recovery_key: &KeyPair,
    next_recovery_key: &KeyPair,
    next_update_key: &KeyPair,
    patches: Vec<Value>,
    transaction_number: u64,
) -> AnchoredOperationModel {
    let delta = delta(patches, next_update_key);
    let payload = json!({
        "recovery_key": current_recovery_key.public_jwk(),
        "recovery_commitment": commitment_from_jwk(&next_recovery_key.public_jwk()).unwrap(),
        "delta_hash": delta_hash(&delta),
    });
    let jws = CompactJws::sign(&payload, current_recovery_key).unwrap();
    let envelope = json!({
        "type": "recover",
        "did_suffix": did_suffix.as_str(),
        "reveal_value": reveal_value_from_jwk(&current_recovery_key.public_jwk()).unwrap(),
        "signed_data": jws.as_compact(),
        "delta": delta,
    });
    anchored(OperationType::Recover, did_suffix, &envelope, transaction_number, 0)
}

pub fn deactivate_op(
    did_suffix: &DidSuffix,
    recovery_key: &KeyPair,
    transaction_number: u64,
) -> AnchoredOperationModel {
    let payload = json!({
        "did_suffix": did_suffix.as_str(),
        "recovery_key": recovery_key.public_jwk(),
    });
    let jws = CompactJws::sign(&payload, recovery_key).unwrap();
    let envelope = json!({
        "type": "deactivate",
        "did_suffix": did_suffix.as_str(),
        "reveal_value": reveal_value_from_jwk(&recovery_key.public_jwk()).unwrap(),
        "signed_data": jws.as_compact(),
    });
    anchored(OperationType::Deactivate, did_suffix, &envelope, transaction_number, 0)
}

/// All permutations of `0..n` (test sizes only).
pub fn permutations(n: usize) -> Vec<Vec<usize>> {
    fn recurse(prefix: &mut Vec<usize>, remaining: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if remaining.is_empty() {
            out.push(prefix.clone());
            return;
        }
        for i in 0..remaining.len() {
            let item = remaining.remove(i);
            prefix.push(item);
            recurse(prefix, remaining, out);
            prefix.pop();
            remaining.insert(i, item);
        }
    }
    let mut out = Vec::new();
    recurse(&mut Vec::new(), &mut (0..n).collect(), &mut out);
    out
}
