use crate::entities::Settings;
use crate::repositories::SettingsRepository;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::warn;

/// One-shot settings retrieval. No polling, no retry.
pub struct SettingsService {
    settings_repository: Arc<dyn SettingsRepository>,
}

impl SettingsService {
    pub fn new(settings_repository: Arc<dyn SettingsRepository>) -> Self {
        Self {
            settings_repository,
        }
    }

    /// Issue a single request. Failures fall back to empty settings.
    pub async fn fetch(&self) -> Settings {
        fetch_or_empty(self.settings_repository.as_ref()).await
    }

    /// Fetch once now and once more every time `trigger` changes.
    ///
    /// The returned receiver holds `None` until the first response arrives. The
    /// background task ends when the trigger's sender is dropped.
    pub fn watch_trigger<T>(&self, mut trigger: watch::Receiver<T>) -> watch::Receiver<Option<Settings>>
    where
        T: Send + Sync + 'static,
    {
        let (settings_tx, settings_rx) = watch::channel(None);
        let settings_repository = Arc::clone(&self.settings_repository);

        tokio::spawn(async move {
            loop {
                let settings = fetch_or_empty(settings_repository.as_ref()).await;
                if settings_tx.send(Some(settings)).is_err() {
                    break;
                }
                if trigger.changed().await.is_err() {
                    break;
                }
            }
        });

        settings_rx
    }
}

async fn fetch_or_empty(settings_repository: &dyn SettingsRepository) -> Settings {
    match settings_repository.get_settings().await {
        Ok(settings) => settings,
        Err(e) => {
            warn!("⚠️  Settings fetch failed, using empty settings: {}", e);
            Settings::empty()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DomainError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::{self, Duration};

    struct FakeSettingsRepository {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl SettingsRepository for FakeSettingsRepository {
        async fn get_settings(&self) -> Result<Settings, DomainError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail {
                return Err(DomainError::HttpStatus {
                    status: 500,
                    endpoint: "/settings".to_string(),
                });
            }
            Ok(Settings(json!({ "CacheSize": 200, "call": call })))
        }
    }

    fn service(fail: bool) -> (SettingsService, Arc<FakeSettingsRepository>) {
        let repo = Arc::new(FakeSettingsRepository {
            calls: AtomicUsize::new(0),
            fail,
        });
        (SettingsService::new(repo.clone()), repo)
    }

    async fn next_settings(rx: &mut watch::Receiver<Option<Settings>>) -> Settings {
        time::timeout(Duration::from_secs(2), rx.changed())
            .await
            .expect("no settings published")
            .unwrap();
        rx.borrow_and_update().clone().expect("settings missing")
    }

    #[tokio::test]
    async fn fetch_passes_settings_through() {
        let (service, repo) = service(false);
        let settings = service.fetch().await;
        assert_eq!(settings.get("CacheSize"), Some(&json!(200)));
        assert_eq!(repo.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_fetch_yields_empty_settings() {
        let (service, _) = service(true);
        assert_eq!(service.fetch().await, Settings::empty());
    }

    #[tokio::test]
    async fn fetches_once_per_trigger_change() {
        let (service, repo) = service(false);
        let (trigger_tx, trigger_rx) = watch::channel(0u32);
        let mut settings = service.watch_trigger(trigger_rx);

        assert_eq!(next_settings(&mut settings).await.get("call"), Some(&json!(1)));

        time::sleep(Duration::from_millis(30)).await;
        assert_eq!(repo.calls.load(Ordering::SeqCst), 1);

        trigger_tx.send(1).unwrap();
        assert_eq!(next_settings(&mut settings).await.get("call"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn task_ends_with_trigger() {
        let (service, repo) = service(false);
        let (trigger_tx, trigger_rx) = watch::channel(());
        let mut settings = service.watch_trigger(trigger_rx);
        next_settings(&mut settings).await;

        drop(trigger_tx);
        time::timeout(Duration::from_secs(2), async {
            while settings.changed().await.is_ok() {}
        })
        .await
        .expect("settings task kept running");
        assert_eq!(repo.calls.load(Ordering::SeqCst), 1);
    }
}
