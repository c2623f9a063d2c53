//! Connection pool setup for the catalog database.

use crate::error::{DatabaseError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;

const MAX_CONNECTIONS: u32 = 5;

/// `SQLite` connection pool for the catalog.
///
/// An in-memory database lives and dies with its connection, so `:memory:`
/// pools are pinned to a single connection that is never recycled.
#[derive(Debug, Clone)]
pub struct CatalogPool {
    pool: Pool<Sqlite>,
}

impl CatalogPool {
    /// Open (creating if missing) the database at `path`.
    ///
    /// # Errors
    /// Returns `DatabaseError` if the path is not valid UTF-8, its parent
    /// directory cannot be created, or the database cannot be opened.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path_str = path.as_ref().to_str().ok_or_else(|| {
            DatabaseError::Open("invalid database path: not valid UTF-8".to_string())
        })?;
        let in_memory = is_memory_path(path_str);

        if !in_memory {
            if let Some(parent) = path.as_ref().parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }

        let mut connect_options = SqliteConnectOptions::from_str(path_str)
            .map_err(|e| DatabaseError::Open(format!("invalid connection string: {e}")))?
            .foreign_keys(true)
            .create_if_missing(true);
        if !in_memory {
            connect_options = connect_options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(MAX_CONNECTIONS)
        };

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .map_err(|e| DatabaseError::Open(format!("failed to initialize pool: {e}")))?;

        tracing::info!("Catalog database pool created at {}", path_str);

        Ok(Self { pool })
    }

    /// Get a reference to the underlying `SQLx` pool.
    #[must_use]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Close the connection pool gracefully.
    pub async fn close(self) {
        self.pool.close().await;
        tracing::info!("Catalog database pool closed");
    }

    /// Check that the database answers queries.
    ///
    /// # Errors
    /// Returns `DatabaseError::Sqlx` if the query fails.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn is_memory_path(path: &str) -> bool {
    path == ":memory:" || path.starts_with("sqlite::memory:")
}
