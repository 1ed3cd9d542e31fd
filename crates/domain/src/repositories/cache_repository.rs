use crate::entities::{CacheSnapshot, TorrentHash};
use crate::errors::DomainError;
use async_trait::async_trait;

/// Source of live cache state, one request per call.
#[async_trait]
pub trait CacheRepository: Send + Sync {
    async fn get_cache(&self, hash: &TorrentHash) -> Result<CacheSnapshot, DomainError>;
}
