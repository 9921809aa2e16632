use thiserror::Error;

use crate::platform::Feature;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlatformError {
    #[error("session mode not supported: {0}")]
    NotSupported(String),

    #[error("required feature unavailable: {0:?}")]
    FeatureUnavailable(Feature),

    #[error("request denied by the user")]
    Denied,

    #[error("request cancelled before it resolved")]
    Cancelled,

    #[error("platform error: {0}")]
    Other(String),
}

impl From<&str> for PlatformError {
    fn from(error: &str) -> Self {
        PlatformError::Other(error.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ArError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] ron::error::SpannedError),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("cannot build path curve: {0}")]
    Curve(String),
}
