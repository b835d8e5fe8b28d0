use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasFetchCode {
    Success,
    NotFound,
    MaxSizeExceeded,
    InvalidHash,
    CasNotReachable,
}

pub struct FetchResult {
    pub code: CasFetchCode,
    pub content: Option<Vec<u8>>,
}

#[derive(Error, Debug)]
pub enum CasError {
    #[error("CAS unreachable: {0}")]
    NotReachable(String),
}

/// Out-of-scope collaborator (spec §6): content-addressed store client.
#[async_trait]
pub trait CasClient: Send + Sync {
    async fn read(&self, hash: &str, max_bytes: usize) -> Result<FetchResult, CasError>;
    async fn write(&self, bytes: Vec<u8>) -> Result<String, CasError>;
}
