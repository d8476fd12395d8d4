use crate::error::{Result, SyncError};
use marquee_core::ImageSize;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Tuning of the refresh pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// A playlist becomes stale this long after its last check
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    /// Upper bound on collection pages fetched per crawl, root included
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Element resolutions allowed in flight per crawl
    #[serde(default = "default_element_concurrency")]
    pub element_concurrency: usize,

    /// Playlists refreshed side by side by `refresh_stale`
    #[serde(default = "default_playlist_concurrency")]
    pub playlist_concurrency: usize,

    #[serde(default = "default_thumbnail_dir")]
    pub thumbnail_dir: PathBuf,

    #[serde(default)]
    pub thumbnail_size: ImageSize,
}

fn default_refresh_interval_secs() -> u64 {
    2 * 60 * 60
}

fn default_max_pages() -> usize {
    2000
}

fn default_element_concurrency() -> usize {
    5
}

fn default_playlist_concurrency() -> usize {
    4
}

fn default_thumbnail_dir() -> PathBuf {
    PathBuf::from("thumbnails")
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval_secs(),
            max_pages: default_max_pages(),
            element_concurrency: default_element_concurrency(),
            playlist_concurrency: default_playlist_concurrency(),
            thumbnail_dir: default_thumbnail_dir(),
            thumbnail_size: ImageSize::default(),
        }
    }
}

impl SyncConfig {
    /// Staleness interval as a chrono duration
    pub fn refresh_interval(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.refresh_interval_secs).unwrap_or(i64::MAX))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.refresh_interval_secs == 0 {
            return Err(SyncError::Config(
                "refresh_interval_secs must be greater than zero".into(),
            ));
        }
        if self.max_pages == 0 {
            return Err(SyncError::Config("max_pages must be at least 1".into()));
        }
        if self.element_concurrency == 0 || self.playlist_concurrency == 0 {
            return Err(SyncError::Config(
                "concurrency limits must be at least 1".into(),
            ));
        }
        if self.thumbnail_size.width == 0 || self.thumbnail_size.height == 0 {
            return Err(SyncError::Config("thumbnail size must not be empty".into()));
        }
        Ok(())
    }
}
