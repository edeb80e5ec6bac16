//! Document patch validation and application.
//!
//! Validation runs at parse time and is strict; application runs at
//! processing time and is total — a validated patch list always applies.

use kedge_core::{DocumentModel, Patch, ProtocolError, PublicKeyEntry, ServiceEntry};
use std::collections::HashSet;

const MAX_ID_LENGTH: usize = 50;

// ── Validation ───────────────────────────────────────────────────────────────

/// Structural validation of a patch list: id charset/length, no duplicate
/// ids within one patch, non-empty removals.
pub fn validate_patches(patches: &[Patch]) -> Result<(), ProtocolError> {
    for patch in patches {
        match patch {
            Patch::AddPublicKeys { public_keys } => validate_public_keys(public_keys)?,
            Patch::RemovePublicKeys { ids } => {
                for id in ids {
                    if !is_valid_id(id) {
                        return Err(ProtocolError::DocumentPatchPublicKeyMalformed);
                    }
                }
            }
            Patch::AddServices { services } => validate_services(services)?,
            Patch::RemoveServices { ids } => {
                for id in ids {
                    if !is_valid_id(id) {
                        return Err(ProtocolError::DocumentPatchServiceMalformed);
                    }
                }
            }
            Patch::Replace { document } => {
                validate_public_keys(&document.public_keys)?;
                validate_services(&document.services)?;
            }
        }
    }
    Ok(())
}

fn validate_public_keys(entries: &[PublicKeyEntry]) -> Result<(), ProtocolError> {
    let mut seen = HashSet::new();
    for entry in entries {
        if !is_valid_id(&entry.id) || entry.key_type.is_empty() {
            return Err(ProtocolError::DocumentPatchPublicKeyMalformed);
        }
        if !seen.insert(entry.id.as_str()) {
            return Err(ProtocolError::DocumentPatchPublicKeyIdDuplicated(
                entry.id.clone(),
            ));
        }
    }
    Ok(())
}

fn validate_services(entries: &[ServiceEntry]) -> Result<(), ProtocolError> {
    let mut seen = HashSet::new();
    for entry in entries {
        if !is_valid_id(&entry.id) || entry.service_type.is_empty() {
            return Err(ProtocolError::DocumentPatchServiceMalformed);
        }
        if !(entry.service_endpoint.is_string() || entry.service_endpoint.is_object()) {
            return Err(ProtocolError::DocumentPatchServiceMalformed);
        }
        if !seen.insert(entry.id.as_str()) {
            return Err(ProtocolError::DocumentPatchServiceIdDuplicated(
                entry.id.clone(),
            ));
        }
    }
    Ok(())
}

// Fragment ids are restricted to the base64url charset so they survive DID
// URL dereferencing unescaped.
fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_ID_LENGTH
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

// ── Application ──────────────────────────────────────────────────────────────

/// Apply a validated patch list to `document`, returning the new document.
///
/// Additions overwrite entries with the same id (last write wins), removals
/// of absent ids are no-ops, `replace` swaps the document wholesale. Total:
/// cannot fail on validated input.
pub fn apply_patches(document: &DocumentModel, patches: &[Patch]) -> DocumentModel {
    let mut result = document.clone();
    for patch in patches {
        match patch {
            Patch::AddPublicKeys { public_keys } => {
                for entry in public_keys {
                    result.public_keys.retain(|existing| existing.id != entry.id);
                    result.public_keys.push(entry.clone());
                }
            }
            Patch::RemovePublicKeys { ids } => {
                result
                    .public_keys
                    .retain(|existing| !ids.contains(&existing.id));
            }
            Patch::AddServices { services } => {
                for entry in services {
                    result.services.retain(|existing| existing.id != entry.id);
                    result.services.push(entry.clone());
                }
            }
            Patch::RemoveServices { ids } => {
                result.services.retain(|existing| !ids.contains(&existing.id));
            }
            Patch::Replace { document } => {
                result = document.clone();
            }
        }
    }
    result
}
