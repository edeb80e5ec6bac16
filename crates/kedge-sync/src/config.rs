use std::time::Duration;

/// Tunables for the sync pipeline.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Upper bound on concurrent CAS downloads across all in-flight
    /// transactions. Protects the CAS client, not the local process.
    pub max_concurrent_downloads: usize,
    /// How often the observer polls the ledger when it is caught up.
    pub polling_interval: Duration,
    /// How many times a transiently-failing transaction is retried before
    /// it is dropped from the queue (it will be seen again on restart).
    pub max_retry_attempts: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_concurrent_downloads: 20,
            polling_interval: Duration::from_secs(60),
            max_retry_attempts: 3,
        }
    }
}
