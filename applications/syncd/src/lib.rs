//! Marquee Sync Daemon Library
//!
//! Wires the sync engine to the local database, the HTTP fetcher and the
//! thumbnail store, for the `marquee-syncd` binary.
//!
//! This library exposes the components for testing purposes.

pub mod config;
pub mod error;
pub mod images;
pub mod jobs;
pub mod resolvers;

// Re-export commonly used types for convenience
pub use config::DaemonConfig;
pub use error::{DaemonError, Result};
pub use images::HttpImageFetcher;
pub use jobs::RefreshWatcher;
pub use resolvers::{StoredActorResolver, StoredVideoResolver};

use marquee_core::SystemClock;
use marquee_federation::HttpObjectFetcher;
use marquee_sync::{Collaborators, PlaylistRefresher};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Build a refresher over `pool` with the production collaborators
pub fn build_refresher(config: &DaemonConfig, pool: SqlitePool) -> Result<PlaylistRefresher> {
    let fetcher = HttpObjectFetcher::new(config.federation.clone())?;
    let images = HttpImageFetcher::new(&config.federation)?;

    let collaborators = Collaborators {
        fetcher: Arc::new(fetcher),
        actors: Arc::new(StoredActorResolver::new(pool.clone())),
        videos: Arc::new(StoredVideoResolver::new(pool.clone())),
        images: Arc::new(images),
        clock: Arc::new(SystemClock),
    };

    Ok(PlaylistRefresher::new(pool, config.sync.clone(), collaborators)?)
}
