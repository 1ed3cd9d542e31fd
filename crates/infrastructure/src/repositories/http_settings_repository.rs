use crate::http::BackendClient;
use async_trait::async_trait;
use domain::{DomainError, Settings, SettingsRepository};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
struct SettingsRequest<'a> {
    action: &'a str,
}

pub struct HttpSettingsRepository {
    client: Arc<BackendClient>,
}

impl HttpSettingsRepository {
    pub fn new(client: Arc<BackendClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SettingsRepository for HttpSettingsRepository {
    async fn get_settings(&self) -> Result<Settings, DomainError> {
        self.client
            .post_action(&self.client.endpoints().settings, &SettingsRequest { action: "get" })
            .await
    }
}
