//! Database connection pool management.
//!
//! Initializes the SQLite connection pool with WAL mode for concurrent
//! access. Failure to create or open the store is the pipeline's one fatal
//! condition: callers are expected to abort the run with the returned
//! diagnostic.

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::sync::Arc;

use log::{error, info};
use sqlx::{Pool, Sqlite, SqlitePool};

use crate::error_handling::DatabaseError;

/// Initializes and returns a database connection pool for the given path.
///
/// Creates the database file (and parent directory) if absent and enables
/// WAL mode.
pub async fn init_db_pool_with_path(
    db_path: &std::path::Path,
) -> Result<Arc<Pool<Sqlite>>, DatabaseError> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| DatabaseError::FileCreationError(e.to_string()))?;
        }
    }

    let db_path_str = db_path.to_string_lossy().to_string();
    match OpenOptions::new()
        .read(true)
        .write(true)
        .create_new(true)
        .open(&db_path_str)
    {
        Ok(_) => info!("Database file created successfully."),
        Err(ref e) if e.kind() == ErrorKind::AlreadyExists => {
            info!("Database file already exists.")
        }
        Err(e) => {
            error!("Failed to create database file: {e}");
            return Err(DatabaseError::FileCreationError(e.to_string()));
        }
    }

    let pool = SqlitePool::connect(&format!("sqlite:{}", db_path_str))
        .await
        .map_err(|e| {
            error!("Failed to connect to database: {e}");
            DatabaseError::SqlError(e)
        })?;

    // Enable WAL mode
    sqlx::query("PRAGMA journal_mode=WAL")
        .execute(&pool)
        .await
        .map_err(|e| {
            error!("Failed to set WAL mode: {e}");
            DatabaseError::SqlError(e)
        })?;

    Ok(Arc::new(pool))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_creates_database_file_and_parent_dir() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let db_path = temp_dir.path().join("nested").join("store.db");
        let pool = init_db_pool_with_path(&db_path)
            .await
            .expect("pool should initialize");
        assert!(db_path.exists());
        drop(pool);
    }

    #[tokio::test]
    async fn test_reopening_existing_database_succeeds() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let db_path = temp_dir.path().join("store.db");
        let first = init_db_pool_with_path(&db_path).await.expect("first open");
        drop(first);
        let second = init_db_pool_with_path(&db_path)
            .await
            .expect("second open should reuse the file");
        drop(second);
    }

    #[tokio::test]
    async fn test_unopenable_path_is_fatal() {
        // A directory path cannot be opened as a database file.
        let temp_dir = TempDir::new().expect("create temp dir");
        let result = init_db_pool_with_path(temp_dir.path()).await;
        assert!(result.is_err());
    }
}
