use thiserror::Error;

/// Core error types for ProjectMesh domain operations
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid object kind: {0}")]
    InvalidObjectKind(String),

    #[error("Invalid object data: {message}")]
    InvalidObject { message: String },

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl CoreError {
    /// Create a new InvalidObjectKind error
    pub fn invalid_object_kind(kind: impl Into<String>) -> Self {
        Self::InvalidObjectKind(kind.into())
    }

    /// Create a new InvalidObject error
    pub fn invalid_object(message: impl Into<String>) -> Self {
        Self::InvalidObject {
            message: message.into(),
        }
    }

    /// Create a new Configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
