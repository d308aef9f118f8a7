//! Database layer for data persistence and access.
//!
//! This module implements the data access layer using SQLx with SQLite.
//! It follows the Repository pattern to provide clean abstractions over database operations.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (API request handlers)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - queries)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │   Models    │  (db::models - database records)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │   SQLite    │
//! └─────────────┘
//! ```
//!
//! # Connections
//!
//! Repositories never own a connection. Handlers acquire one from the pool (or begin a
//! transaction) for the duration of a single operation; the handle returns to the pool when it
//! is dropped, on every exit path. Uncommitted transactions roll back on drop.
//!
//! # Migrations
//!
//! The schema lives in `migrations/` and is embedded with [`crate::migrator`]; it is applied
//! on startup by [`crate::Application::new`].

pub mod errors;
pub mod handlers;
pub mod models;

use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

use crate::config::DatabaseConfig;

/// Open the connection pool described by `config`.
///
/// Foreign key enforcement is switched on for every connection.
pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&config.url)?.foreign_keys(true);
    let settings = &config.pool;

    // 0 disables the timeout
    let optional = |secs: u64| (secs > 0).then(|| Duration::from_secs(secs));

    SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .idle_timeout(optional(settings.idle_timeout_secs))
        .max_lifetime(optional(settings.max_lifetime_secs))
        .connect_with(options)
        .await
}
