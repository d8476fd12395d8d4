//! Capability traits consumed by the sync engine
//!
//! Implementations are provided by the host application and injected into the
//! pipeline, which keeps the engine testable with fakes.

use crate::error::Result;
use crate::types::{ResolvedActor, ResolvedVideo, VideoFetchHint};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Resolve (or create) a remote actor with its account/channel linkage
#[async_trait]
pub trait ActorResolver: Send + Sync {
    /// Resolve the actor identified by `url`
    ///
    /// # Errors
    /// Returns an error if the actor cannot be fetched or stored
    async fn resolve_actor(&self, url: &str) -> Result<ResolvedActor>;
}

/// Resolve (or create) a local video for a remote video reference
#[async_trait]
pub trait VideoResolver: Send + Sync {
    /// Resolve the video identified by `url`
    ///
    /// This may trigger nested federation fetches for the video and its
    /// owner; the sync engine treats it as opaque.
    async fn resolve_video(&self, url: &str, hint: VideoFetchHint) -> Result<ResolvedVideo>;
}

/// Target dimensions of a fetched image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ImageSize {
    fn default() -> Self {
        Self {
            width: 280,
            height: 157,
        }
    }
}

/// Fetch an external image into local storage
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Download `url`, resize it to `size` and write it to `dest_dir/dest_name`
    async fn fetch_image(
        &self,
        url: &str,
        dest_dir: &Path,
        dest_name: &str,
        size: ImageSize,
    ) -> Result<()>;
}

/// Source of the current time
pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
