//! Error types for the edge range cache

use thiserror::Error;

/// Result type alias for proxy operations
pub type Result<T> = std::result::Result<T, ProxyError>;

/// Error types that can occur while serving a request
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Object store error: {0}")]
    StoreError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Invalid header value: {0}")]
    HeaderError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for ProxyError {
    fn from(err: std::io::Error) -> Self {
        ProxyError::IoError(err.to_string())
    }
}

impl From<http::header::InvalidHeaderValue> for ProxyError {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        ProxyError::HeaderError(err.to_string())
    }
}

impl ProxyError {
    /// Convert the error to the HTTP status code reported to the client
    ///
    /// Every error here is an internal failure; backend "not found" is not
    /// an error but a negative-cache outcome handled by the proxy itself.
    pub fn to_http_status(&self) -> u16 {
        match self {
            ProxyError::ConfigError(_) => 500,
            ProxyError::StoreError(_) => 500,
            ProxyError::CacheError(_) => 500,
            ProxyError::HeaderError(_) => 500,
            ProxyError::IoError(_) => 500,
        }
    }
}
