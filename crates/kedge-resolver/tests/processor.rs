//! Apply-semantics tests for the operation processor: commitment/reveal
//! enforcement, replay handling, the degraded delta paths, and the
//! programmer-bug error cases.

mod common;

use common::*;
use kedge_core::{OperationType, ProtocolError};
use kedge_crypto::KeyPair;

#[test]
fn create_builds_initial_state() {
    let recovery = KeyPair::generate_ed25519();
    let update = KeyPair::generate_ed25519();
    let signing = KeyPair::generate_ed25519();
    let created = create_op(&recovery, &update, vec![add_key_patch(&signing, "signing-key")], 1);

    let state = processor().apply(&created.anchored, None).unwrap().unwrap();
    assert_eq!(state.document.public_keys.len(), 1);
    assert_eq!(state.document.public_keys[0].id, "signing-key");
    assert!(state.next_recovery_commitment.is_some());
    assert!(state.next_update_commitment.is_some());
    assert_eq!(state.last_operation_transaction_number, 1);
}

#[test]
fn duplicate_create_is_ignored() {
    let recovery = KeyPair::generate_ed25519();
    let update = KeyPair::generate_ed25519();
    let created = create_op(&recovery, &update, vec![], 1);

    let processor = processor();
    let state = processor.apply(&created.anchored, None).unwrap().unwrap();
    let mut replay = created.anchored.clone();
    replay.transaction_number = 9;
    replay.transaction_time = 9;
    let after = processor.apply(&replay, Some(&state)).unwrap().unwrap();
    assert_eq!(after, state);
}

#[test]
fn update_rotates_commitment_and_applies_patches() {
    let recovery = KeyPair::generate_ed25519();
    let update1 = KeyPair::generate_ed25519();
    let update2 = KeyPair::generate_ed25519();
    let created = create_op(&recovery, &update1, vec![add_service_patch("s0")], 1);

    let processor = processor();
    let state = processor.apply(&created.anchored, None).unwrap().unwrap();
    let update = update_op(
        &created.did_suffix,
        &update1,
        &update2,
        vec![remove_service_patch("s0"), add_service_patch("s1")],
        2,
    );
    let after = processor.apply(&update, Some(&state)).unwrap().unwrap();
    assert_eq!(after.last_operation_transaction_number, 2);
    let ids: Vec<&str> = after.document.services.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["s1"]);
    assert_ne!(after.next_update_commitment, state.next_update_commitment);
    assert_eq!(after.next_recovery_commitment, state.next_recovery_commitment);
}

#[test]
fn update_with_wrong_reveal_key_is_a_no_op() {
    let recovery = KeyPair::generate_ed25519();
    let update1 = KeyPair::generate_ed25519();
    let wrong = KeyPair::generate_ed25519();
    let next = KeyPair::generate_ed25519();
    let created = create_op(&recovery, &update1, vec![], 1);

    let processor = processor();
    let state = processor.apply(&created.anchored, None).unwrap().unwrap();
    // Structurally valid, signed by `wrong`, but `wrong` does not hash to
    // the DID's next update commitment.
    let update = update_op(&created.did_suffix, &wrong, &next, vec![], 2);
    let after = processor.apply(&update, Some(&state)).unwrap().unwrap();
    assert_eq!(after, state);
}

#[test]
fn forged_signature_is_a_no_op() {
    let recovery = KeyPair::generate_ed25519();
    let update1 = KeyPair::generate_ed25519();
    let next = KeyPair::generate_ed25519();
    let created = create_op(&recovery, &update1, vec![], 1);

    let processor = processor();
    let state = processor.apply(&created.anchored, None).unwrap().unwrap();
    // Reveals the right key but the JWS is signed by the recovery key.
    let forged = update_op_signed_by(&created.did_suffix, &update1, &recovery, &next, vec![], 2);
    let after = processor.apply(&forged, Some(&state)).unwrap().unwrap();
    assert_eq!(after, state);
}

#[test]
fn recover_resets_document_and_rotates_both_commitments() {
    let recovery1 = KeyPair::generate_ed25519();
    let recovery2 = KeyPair::generate_ed25519();
    let update1 = KeyPair::generate_ed25519();
    let update2 = KeyPair::generate_secp256k1();
    let signing = KeyPair::generate_secp256k1();
    let created = create_op(&recovery1, &update1, vec![add_service_patch("s0")], 1);

    let processor = processor();
    let state = processor.apply(&created.anchored, None).unwrap().unwrap();
    let recover = recover_op(
        &created.did_suffix,
        &recovery1,
        &recovery2,
        &update2,
        vec![add_key_patch(&signing, "recovered-key")],
        2,
    );
    let after = processor.apply(&recover, Some(&state)).unwrap().unwrap();
    // The old document is gone wholesale, not layered under the new one.
    assert!(after.document.services.is_empty());
    assert_eq!(after.document.public_keys[0].id, "recovered-key");
    assert_ne!(after.next_recovery_commitment, state.next_recovery_commitment);
    assert!(after.next_update_commitment.is_some());
}

#[test]
fn recover_with_mismatched_delta_still_rotates() {
    let recovery1 = KeyPair::generate_ed25519();
    let recovery2 = KeyPair::generate_ed25519();
    let update1 = KeyPair::generate_ed25519();
    let update2 = KeyPair::generate_ed25519();
    let created = create_op(&recovery1, &update1, vec![add_service_patch("s0")], 1);

    let processor = processor();
    let state = processor.apply(&created.anchored, None).unwrap().unwrap();

    let mut recover = recover_op(
        &created.did_suffix,
        &recovery1,
        &recovery2,
        &update2,
        vec![add_service_patch("s1")],
        2,
    );
    // Swap in a delta the signature never covered.
    let mut envelope: serde_json::Value =
        serde_json::from_slice(&recover.operation_buffer).unwrap();
    envelope["delta"] = delta(vec![add_service_patch("evil")], &update2);
    recover.operation_buffer = serde_json::to_vec(&envelope).unwrap();

    let after = processor.apply(&recover, Some(&state)).unwrap().unwrap();
    // Rotation survives, document does not.
    assert_ne!(after.next_recovery_commitment, state.next_recovery_commitment);
    assert!(after.document.public_keys.is_empty() && after.document.services.is_empty());
    assert!(after.next_update_commitment.is_none());
    assert_eq!(after.last_operation_transaction_number, 2);
}

#[test]
fn create_with_mismatched_delta_hash_still_creates() {
    let recovery = KeyPair::generate_ed25519();
    let update1 = KeyPair::generate_ed25519();
    let created = create_op(&recovery, &update1, vec![add_service_patch("s0")], 1);

    let mut envelope: serde_json::Value =
        serde_json::from_slice(&created.anchored.operation_buffer).unwrap();
    envelope["delta"] = delta(vec![add_service_patch("other")], &update1);
    let mut anchored = created.anchored.clone();
    anchored.operation_buffer = serde_json::to_vec(&envelope).unwrap();

    let state = processor().apply(&anchored, None).unwrap().unwrap();
    assert!(state.document.services.is_empty());
    assert!(state.next_update_commitment.is_none());
    assert!(state.next_recovery_commitment.is_some());
}

#[test]
fn deactivate_clears_both_commitments() {
    let recovery = KeyPair::generate_ed25519();
    let update1 = KeyPair::generate_ed25519();
    let created = create_op(&recovery, &update1, vec![add_service_patch("s0")], 1);

    let processor = processor();
    let state = processor.apply(&created.anchored, None).unwrap().unwrap();
    let deactivate = deactivate_op(&created.did_suffix, &recovery, 2);
    let after = processor.apply(&deactivate, Some(&state)).unwrap().unwrap();
    assert!(after.is_deactivated());
    assert!(after.next_recovery_commitment.is_none());
    assert!(after.next_update_commitment.is_none());
    assert_eq!(after.last_operation_transaction_number, 2);

    // Terminal: a perfectly valid recover afterwards changes nothing.
    let late_recover = recover_op(
        &created.did_suffix,
        &recovery,
        &KeyPair::generate_ed25519(),
        &KeyPair::generate_ed25519(),
        vec![],
        3,
    );
    let unchanged = processor.apply(&late_recover, Some(&after)).unwrap().unwrap();
    assert_eq!(unchanged, after);
}

#[test]
fn non_create_without_state_yields_none() {
    let update1 = KeyPair::generate_ed25519();
    let next = KeyPair::generate_ed25519();
    let did = create_op(&KeyPair::generate_ed25519(), &update1, vec![], 1).did_suffix;
    let update = update_op(&did, &update1, &next, vec![], 2);
    assert!(processor().apply(&update, None).unwrap().is_none());
}

#[test]
fn envelope_type_disagreeing_with_buffer_is_an_error() {
    let recovery = KeyPair::generate_ed25519();
    let update1 = KeyPair::generate_ed25519();
    let mut created = create_op(&recovery, &update1, vec![], 1).anchored;
    created.operation_type = OperationType::Update;

    let err = processor().apply(&created, None).unwrap_err();
    assert!(matches!(err, ProtocolError::OperationTypeMismatch { .. }));
}

#[test]
fn reveal_value_is_unavailable_for_create() {
    let created = create_op(
        &KeyPair::generate_ed25519(),
        &KeyPair::generate_ed25519(),
        vec![],
        1,
    );
    assert_eq!(
        processor().get_reveal_value(&created.anchored).unwrap_err(),
        ProtocolError::OperationRevealValueNotAvailable
    );

    let update1 = KeyPair::generate_ed25519();
    let update = update_op(&created.did_suffix, &update1, &update1, vec![], 2);
    assert!(processor().get_reveal_value(&update).is_ok());
}
