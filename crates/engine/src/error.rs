use infra::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EngineError {
    /// HTTP status an outer transport layer should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            EngineError::Validation(_) => 400,
            EngineError::NotFound(_) => 404,
            EngineError::Precondition(_) => 409,
            EngineError::Conflict(_) => 409,
            EngineError::Store(StoreError::NotFound(_)) => 404,
            EngineError::Store(StoreError::Duplicate(_)) => 409,
            EngineError::Other(_) => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
