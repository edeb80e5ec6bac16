//! kedge-store
//!
//! Concrete implementations of the operation and transaction stores:
//! sled-backed for persistence, in-memory for tests and light embedders.
//! Both are idempotent on `(did_suffix, transaction_number, operation_index)`
//! as the store contracts require.

pub mod memory;
pub mod sled_store;

pub use memory::{MemoryOperationStore, MemoryTransactionStore};
pub use sled_store::{SledOperationStore, SledTransactionStore};

/// Offsets 0, 1, 2, 4, 8, … back from the newest element of a length-`len`
/// list, plus the oldest, deduplicated, newest first. Shared by both
/// transaction store implementations.
pub(crate) fn exponentially_spaced_indices(len: usize) -> Vec<usize> {
    let Some(last) = len.checked_sub(1) else {
        return Vec::new();
    };
    let mut indices = vec![last];
    let mut offset = 1usize;
    while offset <= last {
        indices.push(last - offset);
        match offset.checked_mul(2) {
            Some(next) => offset = next,
            None => break,
        }
    }
    if *indices.last().expect("list is non-empty") != 0 {
        indices.push(0);
    }
    indices
}
