use std::sync::Arc;

use crate::processor::OperationProcessor;

/// Lookup of the operation processor in force at a given ledger time.
///
/// The resolver depends on this capability rather than on a concrete
/// processor so that protocol upgrades slot in as new registrations instead
/// of cross-module cycles.
pub trait ProcessorLookup: Send + Sync {
    fn processor_for(&self, transaction_time: u64) -> Option<Arc<OperationProcessor>>;
}

/// Registry mapping half-open `[effective_from, next)` ledger-time ranges to
/// processors. The entry with the greatest `effective_from` at or below the
/// queried time wins.
#[derive(Default)]
pub struct VersionRegistry {
    entries: Vec<(u64, Arc<OperationProcessor>)>,
}

impl VersionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with one processor covering all of ledger time.
    pub fn single(processor: OperationProcessor) -> Self {
        let mut registry = Self::new();
        registry.register(0, Arc::new(processor));
        registry
    }

    pub fn register(&mut self, effective_from: u64, processor: Arc<OperationProcessor>) {
        self.entries.push((effective_from, processor));
        self.entries.sort_by_key(|(from, _)| *from);
    }
}

impl ProcessorLookup for VersionRegistry {
    fn processor_for(&self, transaction_time: u64) -> Option<Arc<OperationProcessor>> {
        self.entries
            .iter()
            .rev()
            .find(|(from, _)| *from <= transaction_time)
            .map(|(_, processor)| Arc::clone(processor))
    }
}
