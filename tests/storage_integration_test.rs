//! Integration tests for the key-value storage backends
//!
//! Tests can be filtered by backend using the STORE_BACKEND environment variable:
//! - `STORE_BACKEND=sqlite cargo test` - Run only SQLite tests
//! - `STORE_BACKEND=postgres cargo test` - Run only PostgreSQL tests
//! - By default, every backend is tested; PostgreSQL needs DATABASE_URL

use linkkeep::storage::{FileStorage, KeyValueStorage, PostgresStorage, SqliteStorage};
use std::sync::Arc;

/// Get the backend to test from environment variable
fn should_test_backend(backend: &str) -> bool {
    match std::env::var("STORE_BACKEND") {
        Ok(val) => val.to_lowercase() == backend.to_lowercase(),
        Err(_) => true, // Test all backends if not specified
    }
}

/// Helper to create SQLite test storage
async fn create_sqlite_storage() -> Arc<dyn KeyValueStorage> {
    let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
    storage.init().await.unwrap();
    Arc::new(storage)
}

/// Helper to create PostgreSQL test storage
async fn create_postgres_storage() -> Option<Arc<dyn KeyValueStorage>> {
    let db_url = std::env::var("DATABASE_URL").ok()?;
    let storage = PostgresStorage::new(&db_url, 5).await.ok()?;
    storage.init().await.ok()?;
    Some(Arc::new(storage))
}

async fn check_basic_lifecycle(storage: &Arc<dyn KeyValueStorage>, key: &str) {
    assert_eq!(storage.get(key).await.unwrap(), None);

    storage.set(key, "[]").await.unwrap();
    assert_eq!(storage.get(key).await.unwrap().as_deref(), Some("[]"));

    // Overwrite replaces the value
    storage.set(key, r#"[{"shortCode":"abc"}]"#).await.unwrap();
    assert_eq!(
        storage.get(key).await.unwrap().as_deref(),
        Some(r#"[{"shortCode":"abc"}]"#)
    );

    assert!(storage.remove(key).await.unwrap());
    assert!(!storage.remove(key).await.unwrap());
    assert_eq!(storage.get(key).await.unwrap(), None);
}

async fn check_keys_are_independent(storage: &Arc<dyn KeyValueStorage>, prefix: &str) {
    let a = format!("{prefix}-a");
    let b = format!("{prefix}-b");

    storage.set(&a, "one").await.unwrap();
    storage.set(&b, "two").await.unwrap();
    storage.remove(&a).await.unwrap();

    assert_eq!(storage.get(&a).await.unwrap(), None);
    assert_eq!(storage.get(&b).await.unwrap().as_deref(), Some("two"));

    storage.remove(&b).await.unwrap();
}

#[tokio::test]
async fn test_lifecycle_sqlite() {
    if !should_test_backend("sqlite") {
        return;
    }

    let storage = create_sqlite_storage().await;
    check_basic_lifecycle(&storage, "url-shortener-links").await;
    check_keys_are_independent(&storage, "sqlite").await;
}

#[tokio::test]
async fn test_init_is_idempotent_sqlite() {
    if !should_test_backend("sqlite") {
        return;
    }

    let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
    storage.init().await.unwrap();
    storage.set("links", "[]").await.unwrap();
    storage.init().await.unwrap();

    assert_eq!(storage.get("links").await.unwrap().as_deref(), Some("[]"));
}

#[tokio::test]
async fn test_sqlite_file_database_survives_reopen() {
    if !should_test_backend("sqlite") {
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("links.db").display());

    {
        let storage = SqliteStorage::new(&url, 2).await.unwrap();
        storage.init().await.unwrap();
        storage.set("links", "[1,2,3]").await.unwrap();
    }

    let storage = SqliteStorage::new(&url, 2).await.unwrap();
    storage.init().await.unwrap();
    assert_eq!(storage.get("links").await.unwrap().as_deref(), Some("[1,2,3]"));
}

#[tokio::test]
async fn test_concurrent_writes_sqlite() {
    if !should_test_backend("sqlite") {
        return;
    }

    let storage = create_sqlite_storage().await;

    let mut handles = vec![];
    for i in 0..10 {
        let storage_clone = Arc::clone(&storage);
        handles.push(tokio::spawn(async move {
            storage_clone.set("shared", &format!("value-{i}")).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // Last writer wins; whichever it was, the value is one of the written ones
    let value = storage.get("shared").await.unwrap().unwrap();
    assert!(value.starts_with("value-"), "unexpected value {value}");
}

#[tokio::test]
async fn test_lifecycle_file() {
    if !should_test_backend("file") {
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let storage: Arc<dyn KeyValueStorage> = Arc::new(FileStorage::new(dir.path()));
    storage.init().await.unwrap();

    check_basic_lifecycle(&storage, "url-shortener-links").await;
    check_keys_are_independent(&storage, "file").await;
}

#[tokio::test]
async fn test_lifecycle_postgres() {
    if !should_test_backend("postgres") {
        return;
    }

    let Some(storage) = create_postgres_storage().await else {
        return;
    };

    let key = format!("test-links-{}", std::process::id());
    check_basic_lifecycle(&storage, &key).await;
    check_keys_are_independent(&storage, &key).await;
}
