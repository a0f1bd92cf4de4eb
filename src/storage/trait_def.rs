use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// A string key-value store holding serialized registry state.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Initialize the storage (create tables, directories, etc.)
    async fn init(&self) -> Result<()>;

    /// Get the value stored under `key`, if any
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove `key`; returns whether a value was present
    async fn remove(&self, key: &str) -> StorageResult<bool>;
}
