use quill_api::ApiError;
use quill_service::ServiceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuillError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<Box<dyn std::error::Error + Send + Sync>> for QuillError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        QuillError::Internal(err.to_string())
    }
}

impl From<&str> for QuillError {
    fn from(err: &str) -> Self {
        QuillError::Internal(err.to_string())
    }
}

impl From<String> for QuillError {
    fn from(err: String) -> Self {
        QuillError::Internal(err)
    }
}

pub type Result<T> = std::result::Result<T, QuillError>;
