//! kedge-sync
//!
//! The ledger-to-store pipeline: the observer polls the ledger for anchoring
//! transactions, and the transaction processor materialises each one into a
//! canonical stream of anchored operations by downloading and validating the
//! anchor/map/chunk file bundle, enforcing fee and lock entitlements, and
//! persisting the result.

pub mod config;
pub mod download;
pub mod fee;
pub mod lock;
pub mod observer;
pub mod processor;

pub use config::SyncConfig;
pub use download::DownloadManager;
pub use fee::PerOperationFeeManager;
pub use lock::LockAmountVerifier;
pub use observer::Observer;
pub use processor::TransactionProcessor;
