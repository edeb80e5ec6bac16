//! kedge-resolver
//!
//! State reconstruction: the operation processor applies one validated
//! operation atop a DID state under commitment/reveal and signature rules;
//! the resolver folds an unordered, possibly adversarial multiset of
//! anchored operations into the DID's current state by walking the
//! commitment chain. Resolution never fails on operation content.

pub mod processor;
pub mod resolver;
pub mod version;

pub use processor::OperationProcessor;
pub use resolver::Resolver;
pub use version::{ProcessorLookup, VersionRegistry};
