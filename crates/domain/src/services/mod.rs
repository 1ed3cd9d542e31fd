pub mod cache_poller;
pub mod piece_map;
pub mod settings_service;

pub use cache_poller::{CachePoller, PollerState};
pub use piece_map::{derive_piece_map, summarize};
pub use settings_service::SettingsService;
