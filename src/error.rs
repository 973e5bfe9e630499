//! Error types for the audit system

use thiserror::Error;

/// Result type alias for audit operations
pub type Result<T> = std::result::Result<T, AuditError>;

/// Everything that can go wrong while resolving or auditing a Go project.
///
/// Per-module fetch errors never abort an audit; they are logged and the
/// module is reported without metadata.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Failed to resolve module graph: {0}")]
    ResolveError(String),

    #[error("Failed to parse: {0}")]
    ParseError(String),

    #[error("{service} responded with an error: {message}")]
    ApiError { service: String, message: String },

    #[error("{service} rate limit exceeded")]
    RateLimited { service: String },

    #[error("Module {0} is not known to the proxy")]
    ModuleNotFound(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Audit cancelled")]
    Cancelled,

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid TOML: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl AuditError {
    pub fn resolve(msg: impl Into<String>) -> Self {
        Self::ResolveError(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    pub fn api(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ApiError {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Whether the error came from a remote service rather than local input
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::ApiError { .. } | Self::RateLimited { .. } | Self::ModuleNotFound(_) | Self::HttpError(_)
        )
    }
}
