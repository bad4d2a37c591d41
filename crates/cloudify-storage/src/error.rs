use thiserror::Error;

/// Errors raised by catalog and blueprint store backends.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("schema error: {0}")]
    Schema(String),
    #[error(transparent)]
    Core(#[from] cloudify_core::Error),
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
