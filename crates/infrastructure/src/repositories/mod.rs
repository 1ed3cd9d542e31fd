pub mod http_cache_repository;
pub mod http_settings_repository;

pub use http_cache_repository::HttpCacheRepository;
pub use http_settings_repository::HttpSettingsRepository;
