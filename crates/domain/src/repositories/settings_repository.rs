use crate::entities::Settings;
use crate::errors::DomainError;
use async_trait::async_trait;

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn get_settings(&self) -> Result<Settings, DomainError>;
}
