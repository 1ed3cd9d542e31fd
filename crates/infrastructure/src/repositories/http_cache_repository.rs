use crate::http::BackendClient;
use async_trait::async_trait;
use domain::{CacheRepository, CacheSnapshot, DomainError, TorrentHash};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
struct CacheRequest<'a> {
    action: &'a str,
    hash: &'a str,
}

pub struct HttpCacheRepository {
    client: Arc<BackendClient>,
}

impl HttpCacheRepository {
    pub fn new(client: Arc<BackendClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CacheRepository for HttpCacheRepository {
    async fn get_cache(&self, hash: &TorrentHash) -> Result<CacheSnapshot, DomainError> {
        let request = CacheRequest {
            action: "get",
            hash: hash.as_str(),
        };
        self.client
            .post_action(&self.client.endpoints().cache, &request)
            .await
    }
}
