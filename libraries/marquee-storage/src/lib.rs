//! Marquee Storage
//!
//! `SQLite` persistence for mirrored playlists and the records they point at.
//!
//! # Architecture
//!
//! - **Vertical Slicing**: Each table owns its own module with its queries
//! - **Atomic Reconciliation**: A playlist row and its whole element set are
//!   replaced inside one transaction (`playlists::apply_reconciliation`)
//! - **Collaborator Tables**: `accounts`, `channels` and `videos` are written
//!   by the resolution collaborators and only read by the sync engine
//!
//! # Example
//!
//! ```rust,no_run
//! use marquee_storage::{create_pool, run_migrations};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool("sqlite://marquee.db").await?;
//! run_migrations(&pool).await?;
//!
//! let playlist = marquee_storage::playlists::get_by_url(
//!     &pool,
//!     "https://remote.example/video-playlists/2a7c",
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod time;

// Vertical slices
pub mod accounts;
pub mod channels;
pub mod playlist_elements;
pub mod playlists;
pub mod videos;

pub use error::StorageError;

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;
use tracing::debug;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// This should be called once when the application starts to ensure
/// the database schema is up to date.
///
/// # Errors
///
/// Returns an error if migrations fail to run
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), StorageError> {
    MIGRATOR
        .run(pool)
        .await
        .map_err(|e| StorageError::Migration(e.to_string()))
}

/// Create a new `SQLite` pool
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g., `<sqlite://marquee.db>`)
///
/// # Errors
///
/// Returns an error if the connection fails
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, StorageError> {
    create_pool_with(database_url, 5).await
}

/// Create a new `SQLite` pool with an explicit connection limit
pub async fn create_pool_with(
    database_url: &str,
    max_connections: u32,
) -> Result<SqlitePool, StorageError> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    debug!(url = %database_url, max_connections, "Creating SQLite pool");

    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .create_if_missing(true)
        .foreign_keys(true)
        // WAL gives readers the committed element set while a reconciliation writes
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

    debug!("SQLite pool created");

    Ok(pool)
}
