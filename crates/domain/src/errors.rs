use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Backend returned status {status} for {endpoint}")]
    HttpStatus { status: u16, endpoint: String },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}
