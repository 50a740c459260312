#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
