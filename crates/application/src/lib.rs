use config::Config;
use domain::*;
use futures::{Stream, StreamExt};
use infrastructure::*;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Piece-map panel - wires the backend client into the polling and derivation services
pub struct PanelApp {
    pub cache_poller: CachePoller,
    pub settings_service: SettingsService,
}

impl PanelApp {
    pub fn from_config(config: &Config) -> Result<Self, DomainError> {
        // Infrastructure layer - one HTTP client shared by every repository
        let endpoints = BackendEndpoints::from_base(
            &config.backend_url,
            &config.cache_path,
            &config.settings_path,
        )?;
        info!("🌐 Backend cache endpoint: {}", endpoints.cache);
        let client = Arc::new(BackendClient::new(endpoints, config.request_timeout)?);

        let cache_repository: Arc<dyn CacheRepository> =
            Arc::new(HttpCacheRepository::new(client.clone()));
        let settings_repository: Arc<dyn SettingsRepository> =
            Arc::new(HttpSettingsRepository::new(client));

        Ok(Self::with_repositories(
            cache_repository,
            settings_repository,
            config,
        ))
    }

    pub fn with_repositories(
        cache_repository: Arc<dyn CacheRepository>,
        settings_repository: Arc<dyn SettingsRepository>,
        config: &Config,
    ) -> Self {
        Self {
            cache_poller: CachePoller::new(cache_repository, config.poll_interval),
            settings_service: SettingsService::new(settings_repository),
        }
    }

    /// Start (or switch) polling. Blank input stops polling.
    pub fn watch(&self, hash: &str) {
        self.cache_poller.set_hash(TorrentHash::parse(hash));
    }

    pub fn stop(&self) {
        self.cache_poller.detach();
    }

    pub fn state(&self) -> PollerState {
        self.cache_poller.state()
    }

    /// Piece map of the latest snapshot.
    pub fn current_piece_map(&self) -> Vec<PieceView> {
        derive_piece_map(&self.cache_poller.current())
    }

    /// A freshly derived piece map for every published snapshot.
    pub fn piece_maps(&self) -> impl Stream<Item = Vec<PieceView>> + Send + 'static {
        self.cache_poller
            .snapshots()
            .map(|snapshot| derive_piece_map(&snapshot))
    }

    pub async fn settings(&self) -> Settings {
        self.settings_service.fetch().await
    }

    pub fn settings_on<T>(&self, trigger: watch::Receiver<T>) -> watch::Receiver<Option<Settings>>
    where
        T: Send + Sync + 'static,
    {
        self.settings_service.watch_trigger(trigger)
    }
}
