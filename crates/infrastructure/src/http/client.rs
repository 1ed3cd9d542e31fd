use domain::DomainError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use url::Url;

/// Resolved endpoint URLs of the torrent backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendEndpoints {
    pub cache: Url,
    pub settings: Url,
}

impl BackendEndpoints {
    pub fn from_base(base_url: &Url, cache_path: &str, settings_path: &str) -> Result<Self, DomainError> {
        Ok(Self {
            cache: join(base_url, cache_path)?,
            settings: join(base_url, settings_path)?,
        })
    }
}

fn join(base_url: &Url, path: &str) -> Result<Url, DomainError> {
    base_url
        .join(path)
        .map_err(|e| DomainError::ConfigError(format!("Invalid endpoint path '{}': {}", path, e)))
}

/// Thin JSON-over-POST client shared by the HTTP repositories.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    endpoints: BackendEndpoints,
}

impl BackendClient {
    pub fn new(endpoints: BackendEndpoints, request_timeout: Option<Duration>) -> Result<Self, DomainError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| DomainError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http, endpoints })
    }

    pub fn endpoints(&self) -> &BackendEndpoints {
        &self.endpoints
    }

    /// POST `body` as JSON and decode the response. An empty body decodes as `T::default()`.
    pub async fn post_action<B, T>(&self, url: &Url, body: &B) -> Result<T, DomainError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned + Default,
    {
        let response = self
            .http
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| DomainError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::HttpStatus {
                status: status.as_u16(),
                endpoint: url.path().to_string(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DomainError::NetworkError(e.to_string()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(T::default());
        }

        serde_json::from_slice(&bytes)
            .map_err(|e| DomainError::ParseError(format!("{} response: {}", url.path(), e)))
    }
}
