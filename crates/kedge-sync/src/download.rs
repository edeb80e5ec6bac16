use std::sync::Arc;

use kedge_core::{Cas, FetchResult, FetchResultCode};
use tokio::sync::Semaphore;

/// Semaphore-bounded front door to the CAS client.
///
/// Every download in the pipeline goes through here, so the configured
/// concurrency cap holds even when many transactions are processed at once.
pub struct DownloadManager {
    cas: Arc<dyn Cas>,
    permits: Arc<Semaphore>,
}

impl DownloadManager {
    pub fn new(cas: Arc<dyn Cas>, max_concurrent_downloads: usize) -> Self {
        Self { cas, permits: Arc::new(Semaphore::new(max_concurrent_downloads)) }
    }

    /// Fetch `address`, holding a concurrency permit for the duration.
    pub async fn download(&self, address: &str, max_size_bytes: usize) -> FetchResult {
        let _permit = match self.permits.acquire().await {
            Ok(permit) => permit,
            // The semaphore only closes on shutdown; report the store as
            // unreachable so the transaction is retried later.
            Err(_) => return FetchResult::of(FetchResultCode::CasNotReachable),
        };
        self.cas.read(address, max_size_bytes).await
    }
}
