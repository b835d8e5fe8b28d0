//! Bounded-concurrency CAS fetch scheduler (spec §2/§4.2): every chunk and
//! core index file fetch during transaction processing goes through here so
//! the number of in-flight CAS reads never exceeds
//! `max_concurrent_downloads`.

use std::sync::Arc;

use anchor_ledger::{CasClient, CasFetchCode};
use anchor_types::{AnchorError, AnchorResult};
use tokio::sync::Semaphore;

pub struct DownloadManager {
    cas: Arc<dyn CasClient>,
    semaphore: Arc<Semaphore>,
}

impl DownloadManager {
    pub fn new(cas: Arc<dyn CasClient>, max_concurrent_downloads: usize) -> Self {
        Self { cas, semaphore: Arc::new(Semaphore::new(max_concurrent_downloads.max(1))) }
    }

    /// Fetch `hash`, bounded to `max_bytes`. Maps CAS fetch codes onto the
    /// error kinds the rest of the pipeline understands: a missing,
    /// oversize or malformed file is a permanent discard; an unreachable
    /// CAS is a transient failure worth retrying.
    pub async fn download(&self, hash: &str, max_bytes: usize) -> AnchorResult<Vec<u8>> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .expect("semaphore is never closed");

        let result = self
            .cas
            .read(hash, max_bytes)
            .await
            .map_err(|e| AnchorError::transient(e.to_string()))?;

        match result.code {
            CasFetchCode::Success => result
                .content
                .ok_or_else(|| AnchorError::LogicInvariantViolation(
                    "CAS reported Success with no content".to_string(),
                )),
            CasFetchCode::NotFound => {
                Err(AnchorError::permanent(format!("content not found for hash {hash}")))
            }
            CasFetchCode::MaxSizeExceeded => {
                Err(AnchorError::permanent(format!("content for hash {hash} exceeds {max_bytes} bytes")))
            }
            CasFetchCode::InvalidHash => {
                Err(AnchorError::permanent(format!("invalid hash: {hash}")))
            }
            CasFetchCode::CasNotReachable => {
                Err(AnchorError::transient(format!("CAS unreachable while fetching {hash}")))
            }
        }
    }

    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use anchor_ledger::mock::MockCasClient;

    use super::*;

    #[tokio::test]
    async fn download_round_trips_through_cas() {
        let cas = Arc::new(MockCasClient::new());
        let hash = cas.write(b"batch bytes".to_vec()).await.unwrap();
        let manager = DownloadManager::new(cas, 4);

        let bytes = manager.download(&hash, 1_000).await.unwrap();
        assert_eq!(bytes, b"batch bytes");
    }

    #[tokio::test]
    async fn missing_hash_is_permanent_not_transient() {
        let cas = Arc::new(MockCasClient::new());
        let manager = DownloadManager::new(cas, 4);

        let err = manager.download("does-not-exist", 1_000).await.unwrap_err();
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn oversize_content_is_permanent() {
        let cas = Arc::new(MockCasClient::new());
        let hash = cas.write(vec![0u8; 100]).await.unwrap();
        let manager = DownloadManager::new(cas, 4);

        let err = manager.download(&hash, 10).await.unwrap_err();
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn concurrency_is_bounded() {
        let cas = Arc::new(MockCasClient::new());
        let manager = Arc::new(DownloadManager::new(cas, 2));
        assert_eq!(manager.available_permits(), 2);
    }
}
