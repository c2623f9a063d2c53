//! Scoutline Database Layer
//!
//! Provides `SQLite` storage for the scraped catalog. Uses `SQLx` with
//! embedded migrations.
//!
//! # Architecture
//!
//! - **Documents**: Entities are stored as JSON documents keyed by their site
//!   IDs, with a few columns (name, parent IDs) lifted out for lookups
//! - **Upserts**: Every write is an `INSERT ... ON CONFLICT DO UPDATE`, so
//!   re-running a scrape never duplicates rows
//! - **Transactions**: Each batch write commits atomically
//!
//! # Example
//!
//! ```ignore
//! use scoutline_db::{countries, Database};
//!
//! let db = Database::new("catalog.db").await?;
//! db.run_migrations().await?;
//! let stored = countries::count_countries(db.pool()).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod clubs;
pub mod competitions;
pub mod connection;
pub mod countries;
pub mod error;
pub mod migrations;
pub mod player_stats;
pub mod players;

// Re-export commonly used types
pub use connection::CatalogPool;
pub use error::{DatabaseError, Result};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// High-level database interface.
///
/// Wraps a `CatalogPool` and exposes migrations; entity operations live in
/// the per-table modules and take the pool directly.
#[derive(Debug, Clone)]
pub struct Database {
    pool: CatalogPool,
}

impl Database {
    /// Open the database at `path` (or `:memory:` for in-memory).
    ///
    /// # Errors
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let pool = CatalogPool::new(path).await?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub fn from_pool(pool: CatalogPool) -> Self {
        Self { pool }
    }

    /// Run all pending database migrations.
    ///
    /// # Errors
    /// Returns `DatabaseError::Migration` if any migration fails.
    pub async fn run_migrations(&self) -> Result<()> {
        migrations::run_migrations(self.pool.pool()).await
    }

    /// Get the current schema version.
    ///
    /// # Errors
    /// Returns `DatabaseError` if the version cannot be queried.
    pub async fn get_schema_version(&self) -> Result<i64> {
        migrations::get_schema_version(self.pool.pool()).await
    }

    /// Get a reference to the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Sqlite> {
        self.pool.pool()
    }

    /// Close the database connection gracefully.
    pub async fn close(self) {
        self.pool.close().await;
    }
}

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| DatabaseError::SerializationError(e.to_string()))
}

pub(crate) fn decode<T: DeserializeOwned>(table: &str, id: &str, json: &str) -> Result<T> {
    serde_json::from_str(json)
        .map_err(|e| DatabaseError::Decode(format!("{table} row '{id}' is not valid: {e}")))
}

pub(crate) fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
