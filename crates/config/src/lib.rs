use std::env;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend_url: Url,
    pub cache_path: String,
    pub settings_path: String,
    pub poll_interval: Duration,
    pub request_timeout: Option<Duration>,
    pub watch_hash: Option<String>,
}

impl Config {
    /// Load configuration from the process environment, after applying `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend_url = lookup("BACKEND_URL").unwrap_or_else(|| "http://127.0.0.1:8090".to_string());
        let backend_url = Url::parse(&backend_url).map_err(|e| ConfigError::InvalidValue {
            name: "BACKEND_URL",
            reason: e.to_string(),
        })?;

        let poll_interval_ms = parse_millis("POLL_INTERVAL_MS", lookup("POLL_INTERVAL_MS"))?.unwrap_or(100);
        if poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                name: "POLL_INTERVAL_MS",
                reason: "must be greater than zero".to_string(),
            });
        }

        let request_timeout =
            parse_millis("REQUEST_TIMEOUT_MS", lookup("REQUEST_TIMEOUT_MS"))?.map(Duration::from_millis);

        Ok(Config {
            backend_url,
            cache_path: lookup("CACHE_PATH").unwrap_or_else(|| "/cache".to_string()),
            settings_path: lookup("SETTINGS_PATH").unwrap_or_else(|| "/settings".to_string()),
            poll_interval: Duration::from_millis(poll_interval_ms),
            request_timeout,
            watch_hash: lookup("WATCH_HASH").filter(|hash| !hash.trim().is_empty()),
        })
    }
}

fn parse_millis(name: &'static str, value: Option<String>) -> Result<Option<u64>, ConfigError> {
    value
        .map(|raw| {
            raw.trim().parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                name,
                reason: format!("'{}': {}", raw, e),
            })
        })
        .transpose()
}
