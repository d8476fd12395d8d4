//! Refresh orchestration: staleness, locking, fetch, crawl, resolve, reconcile.

use crate::config::SyncConfig;
use crate::crawler::Crawler;
use crate::error::{Result, SyncError};
use crate::locks::PlaylistLocks;
use crate::reconciler::Reconciler;
use crate::resolver::ElementResolver;
use crate::staleness::{freshness, Freshness};
use futures::stream::{self, StreamExt};
use marquee_core::{
    AccountId, ActorResolver, Clock, ImageFetcher, Playlist, PlaylistId, VideoResolver,
};
use marquee_federation::{
    decode_manifest, is_valid_object_url, ObjectFetcher, PlaylistManifest, ValidationError,
};
use marquee_storage::playlists;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Result of `refresh_if_needed`
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// No content change: still fresh, or the remote copy was unusable
    Unchanged(Playlist),
    /// Remote copy applied
    Refreshed(Playlist),
    /// Remote answered 404; the local copy is gone
    Deleted { id: PlaylistId, url: String },
}

/// Counts of a `refresh_stale` batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub refreshed: usize,
    pub unchanged: usize,
    pub deleted: usize,
    pub failed: usize,
}

impl RefreshReport {
    pub fn total(&self) -> usize {
        self.refreshed + self.unchanged + self.deleted + self.failed
    }

    fn record(&mut self, outcome: &Result<RefreshOutcome>) {
        match outcome {
            Ok(RefreshOutcome::Refreshed(_)) => self.refreshed += 1,
            Ok(RefreshOutcome::Unchanged(_)) => self.unchanged += 1,
            Ok(RefreshOutcome::Deleted { .. }) => self.deleted += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// Capabilities the refresher is built from
#[derive(Clone)]
pub struct Collaborators {
    pub fetcher: Arc<dyn ObjectFetcher>,
    pub actors: Arc<dyn ActorResolver>,
    pub videos: Arc<dyn VideoResolver>,
    pub images: Arc<dyn ImageFetcher>,
    pub clock: Arc<dyn Clock>,
}

/// Keeps mirrored playlists in step with their origin
pub struct PlaylistRefresher {
    pool: SqlitePool,
    config: SyncConfig,
    fetcher: Arc<dyn ObjectFetcher>,
    clock: Arc<dyn Clock>,
    crawler: Crawler,
    resolver: ElementResolver,
    reconciler: Reconciler,
    locks: PlaylistLocks,
}

impl PlaylistRefresher {
    pub fn new(pool: SqlitePool, config: SyncConfig, collaborators: Collaborators) -> Result<Self> {
        config.validate()?;

        let Collaborators {
            fetcher,
            actors,
            videos,
            images,
            clock,
        } = collaborators;

        let crawler = Crawler::new(Arc::clone(&fetcher), config.max_pages);
        let resolver = ElementResolver::new(Arc::clone(&fetcher), videos);
        let reconciler = Reconciler::new(
            pool.clone(),
            actors,
            images,
            config.thumbnail_dir.clone(),
            config.thumbnail_size,
        );

        Ok(Self {
            pool,
            config,
            fetcher,
            clock,
            crawler,
            resolver,
            reconciler,
            locks: PlaylistLocks::new(),
        })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn locks(&self) -> &PlaylistLocks {
        &self.locks
    }

    /// Refresh playlist `id` from its origin if it is stale
    ///
    /// Remote failures never surface here: the local copy is kept and the
    /// check time advanced. Only local database failures are returned.
    pub async fn refresh_if_needed(&self, id: PlaylistId) -> Result<RefreshOutcome> {
        let playlist = playlists::get_by_id(&self.pool, id)
            .await?
            .ok_or(SyncError::PlaylistNotFound(id))?;

        if self.freshness(&playlist) == Freshness::Fresh {
            debug!(playlist_id = id, "Playlist is fresh, skipping refresh");
            return Ok(RefreshOutcome::Unchanged(playlist));
        }

        let _guard = self.locks.lock(id).await;

        // Another refresh may have finished while we waited
        let Some(playlist) = playlists::get_by_id(&self.pool, id).await? else {
            return Ok(RefreshOutcome::Deleted {
                id,
                url: playlist.url,
            });
        };
        if self.freshness(&playlist) == Freshness::Fresh {
            debug!(playlist_id = id, "Playlist refreshed concurrently, skipping");
            return Ok(RefreshOutcome::Unchanged(playlist));
        }

        self.refresh_locked(playlist).await
    }

    /// Import a playlist by URL, owned by `owner_account_id` unless a channel
    /// can be attributed
    ///
    /// A known URL goes through `refresh_if_needed`. Unlike a refresh, any
    /// failure is returned since there is no previous copy to fall back on.
    pub async fn fetch_remote_playlist(
        &self,
        url: &str,
        owner_account_id: AccountId,
    ) -> Result<Playlist> {
        let Some(url) = Url::parse(url).ok().filter(|_| is_valid_object_url(url)) else {
            return Err(SyncError::Validation {
                url: url.to_string(),
                source: ValidationError::InvalidUrl {
                    field: "id",
                    value: url.to_string(),
                },
            });
        };

        if let Some(existing) = playlists::get_by_url(&self.pool, url.as_str()).await? {
            debug!(playlist_id = existing.id, url = %url, "Playlist already known");
            return match self.refresh_if_needed(existing.id).await? {
                RefreshOutcome::Unchanged(playlist) | RefreshOutcome::Refreshed(playlist) => {
                    Ok(playlist)
                }
                RefreshOutcome::Deleted { url, .. } => Err(SyncError::NotFound { url }),
            };
        }

        let playlist = self.sync_remote(&url, owner_account_id, None).await?;
        info!(playlist_id = playlist.id, url = %playlist.url, "Imported remote playlist");
        Ok(playlist)
    }

    /// Refresh up to `limit` stale playlists, oldest check first
    pub async fn refresh_stale(&self, limit: u32) -> Result<RefreshReport> {
        let cutoff = self.clock.now() - self.config.refresh_interval();
        let stale = playlists::list_stale(&self.pool, cutoff, limit).await?;

        if stale.is_empty() {
            debug!("No stale playlists");
            return Ok(RefreshReport::default());
        }

        debug!(count = stale.len(), "Refreshing stale playlists");

        let outcomes: Vec<_> = stream::iter(stale)
            .map(|playlist| async move {
                let outcome = self.refresh_if_needed(playlist.id).await;
                if let Err(e) = &outcome {
                    warn!(playlist_id = playlist.id, error = %e, "Refresh failed");
                }
                outcome
            })
            .buffer_unordered(self.config.playlist_concurrency.max(1))
            .collect()
            .await;

        let mut report = RefreshReport::default();
        for outcome in &outcomes {
            report.record(outcome);
        }

        info!(
            refreshed = report.refreshed,
            unchanged = report.unchanged,
            deleted = report.deleted,
            failed = report.failed,
            "Stale playlist batch done"
        );
        Ok(report)
    }

    fn freshness(&self, playlist: &Playlist) -> Freshness {
        freshness(playlist, self.clock.now(), self.config.refresh_interval())
    }

    async fn refresh_locked(&self, playlist: Playlist) -> Result<RefreshOutcome> {
        let url = match Url::parse(&playlist.url) {
            Ok(url) => url,
            Err(e) => {
                warn!(playlist_id = playlist.id, error = %e, "Stored playlist URL is invalid");
                return self.keep_previous(playlist).await;
            }
        };

        match self
            .sync_remote(&url, playlist.owner_account_id, Some(&playlist.url))
            .await
        {
            Ok(updated) => {
                info!(playlist_id = updated.id, url = %updated.url, "Playlist refreshed");
                Ok(RefreshOutcome::Refreshed(updated))
            }
            Err(SyncError::NotFound { .. }) => {
                playlists::delete(&self.pool, playlist.id).await?;
                info!(playlist_id = playlist.id, url = %playlist.url, "Remote playlist gone, deleted");
                Ok(RefreshOutcome::Deleted {
                    id: playlist.id,
                    url: playlist.url,
                })
            }
            Err(e) => {
                warn!(
                    playlist_id = playlist.id,
                    url = %playlist.url,
                    error = %e,
                    "Refresh failed, keeping previous content"
                );
                self.keep_previous(playlist).await
            }
        }
    }

    async fn keep_previous(&self, mut playlist: Playlist) -> Result<RefreshOutcome> {
        let now = self.clock.now();
        playlists::mark_refreshed(&self.pool, playlist.id, now).await?;
        playlist.last_refreshed_at = now;
        Ok(RefreshOutcome::Unchanged(playlist))
    }

    async fn fetch_manifest(&self, url: &Url) -> Result<PlaylistManifest> {
        let response = self.fetcher.fetch(url).await?;
        let body = response.into_json()?;
        decode_manifest(&body, url).map_err(|source| SyncError::Validation {
            url: url.to_string(),
            source,
        })
    }

    /// Fetch, crawl, resolve and reconcile the playlist at `url`
    ///
    /// With `expected_id`, a manifest declaring another identifier is
    /// rejected instead of being stored as a second playlist.
    async fn sync_remote(
        &self,
        url: &Url,
        owner_account_id: AccountId,
        expected_id: Option<&str>,
    ) -> Result<Playlist> {
        let manifest = self.fetch_manifest(url).await?;
        if let Some(expected) = expected_id {
            if manifest.id.as_str() != expected {
                return Err(SyncError::IdentityMismatch {
                    expected: expected.to_string(),
                    found: manifest.id.to_string(),
                });
            }
        }

        let crawl = self
            .crawler
            .crawl_from(manifest.id.clone(), manifest.collection.clone());
        let summary = crawl.summary_handle();

        let resolved = self
            .resolver
            .resolve_all(crawl, self.config.element_concurrency)
            .await;

        let summary = summary.snapshot();
        debug!(
            url = %manifest.id,
            pages = summary.pages,
            items = summary.items,
            skipped_items = summary.skipped_items,
            dropped = resolved.dropped,
            stop = ?summary.stop,
            "Collection crawled"
        );

        self.reconciler
            .reconcile(
                owner_account_id,
                &manifest,
                &resolved.candidates,
                self.clock.now(),
            )
            .await
    }
}
