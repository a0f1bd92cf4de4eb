use crate::config::{StorageBackend, StorageConfig};
use std::sync::Arc;
use tracing::info;

pub mod file;
pub mod memory;
pub mod postgres;
pub mod sqlite;
pub mod trait_def;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use postgres::PostgresStorage;
pub use sqlite::SqliteStorage;
pub use trait_def::{KeyValueStorage, StorageError, StorageResult};

/// Build and initialize the backend selected by `config`.
pub async fn open_storage(config: &StorageConfig) -> anyhow::Result<Arc<dyn KeyValueStorage>> {
    let storage: Arc<dyn KeyValueStorage> = match config.backend {
        StorageBackend::Memory => {
            info!("Using in-memory storage (links are lost on exit)");
            Arc::new(MemoryStorage::new())
        }
        StorageBackend::File => {
            info!("Using file storage: {}", config.url);
            Arc::new(FileStorage::new(&config.url))
        }
        StorageBackend::Sqlite => {
            info!("Using SQLite storage: {}", config.url);
            Arc::new(SqliteStorage::new(&config.url, config.max_connections).await?)
        }
        StorageBackend::Postgres => {
            info!("Using PostgreSQL storage: {}", config.url);
            Arc::new(PostgresStorage::new(&config.url, config.max_connections).await?)
        }
    };

    storage.init().await?;
    Ok(storage)
}
