//! Actor and video resolution against records already in the database.
//!
//! Remote actors and videos are mirrored by other parts of the system; the
//! daemon only links playlists to what is already known locally.

use async_trait::async_trait;
use marquee_core::{
    ActorResolver, MarqueeError, ResolvedActor, ResolvedVideo, Result, VideoFetchHint,
    VideoResolver,
};
use marquee_storage::{accounts, channels, videos};
use sqlx::SqlitePool;
use tracing::debug;

/// Resolves actors to stored channels, then stored accounts
#[derive(Debug, Clone)]
pub struct StoredActorResolver {
    pool: SqlitePool,
}

impl StoredActorResolver {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActorResolver for StoredActorResolver {
    async fn resolve_actor(&self, url: &str) -> Result<ResolvedActor> {
        if let Some(channel) = channels::get_by_url(&self.pool, url).await? {
            debug!(url = %url, channel_id = channel.id, "Actor is a known channel");
            return Ok(ResolvedActor::from(&channel));
        }

        if let Some(account) = accounts::get_by_url(&self.pool, url).await? {
            debug!(url = %url, account_id = account.id, "Actor is a known account");
            return Ok(ResolvedActor::from(&account));
        }

        Err(MarqueeError::resolution(url, "actor is not known locally"))
    }
}

/// Resolves videos to stored videos by federation URL
#[derive(Debug, Clone)]
pub struct StoredVideoResolver {
    pool: SqlitePool,
}

impl StoredVideoResolver {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VideoResolver for StoredVideoResolver {
    async fn resolve_video(&self, url: &str, _hint: VideoFetchHint) -> Result<ResolvedVideo> {
        videos::get_by_url(&self.pool, url)
            .await?
            .map(|video| ResolvedVideo::from(&video))
            .ok_or_else(|| MarqueeError::resolution(url, "video is not known locally"))
    }
}
