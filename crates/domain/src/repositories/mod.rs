pub mod cache_repository;
pub mod settings_repository;

pub use cache_repository::CacheRepository;
pub use settings_repository::SettingsRepository;
