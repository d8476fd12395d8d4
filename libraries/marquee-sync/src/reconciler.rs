//! Applies a fetched playlist to the local store.

use crate::error::Result;
use crate::resolver::ElementCandidate;
use chrono::{DateTime, Utc};
use marquee_core::{
    AccountId, ActorResolver, ChannelRef, CreatePlaylistElement, ImageFetcher, ImageSize,
    Playlist, UpsertPlaylist,
};
use marquee_federation::{AttributedActor, PlaylistManifest};
use marquee_storage::playlists;
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of matching `attributedTo` against local channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelAttribution {
    Channel(ChannelRef),
    /// No attributed actor
    Missing,
    /// More than one attributed actor
    Ambiguous(usize),
    /// The actor could not be resolved
    Unresolvable(String),
    /// The actor resolved to an account, not a channel
    NotAChannel,
}

impl ChannelAttribution {
    pub fn channel(&self) -> Option<ChannelRef> {
        match self {
            ChannelAttribution::Channel(channel) => Some(*channel),
            _ => None,
        }
    }

    /// Short label used in log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelAttribution::Channel(_) => "channel",
            ChannelAttribution::Missing => "missing",
            ChannelAttribution::Ambiguous(_) => "ambiguous",
            ChannelAttribution::Unresolvable(_) => "unresolvable",
            ChannelAttribution::NotAChannel => "not_a_channel",
        }
    }
}

/// Stored element set for `candidates`
///
/// An explicit position wins; otherwise the candidate's 1-based index in the
/// list is used.
pub fn build_elements(candidates: &[ElementCandidate]) -> Vec<CreatePlaylistElement> {
    candidates
        .iter()
        .enumerate()
        .map(|(index, candidate)| CreatePlaylistElement {
            url: candidate.url.clone(),
            position: candidate
                .position
                .unwrap_or_else(|| i32::try_from(index + 1).unwrap_or(i32::MAX)),
            start_timestamp: candidate.start_timestamp,
            stop_timestamp: candidate.stop_timestamp,
            video_id: candidate.video_id,
        })
        .collect()
}

/// Row attributes for `manifest`
///
/// A resolved channel makes the channel's account the owner.
pub fn playlist_attributes(
    manifest: &PlaylistManifest,
    owner_account_id: AccountId,
    channel: Option<ChannelRef>,
    now: DateTime<Utc>,
) -> UpsertPlaylist {
    UpsertPlaylist {
        url: manifest.id.to_string(),
        uuid: manifest.uuid.clone(),
        name: manifest.name.clone(),
        description: manifest.description.clone(),
        visibility: manifest.visibility,
        owner_account_id: channel.map_or(owner_account_id, |c| c.account_id),
        channel_id: channel.map(|c| c.id),
        created_at: manifest.published,
        updated_at: manifest.updated,
        refreshed_at: now,
    }
}

pub struct Reconciler {
    pool: SqlitePool,
    actors: Arc<dyn ActorResolver>,
    images: Arc<dyn ImageFetcher>,
    thumbnail_dir: PathBuf,
    thumbnail_size: ImageSize,
}

impl Reconciler {
    pub fn new(
        pool: SqlitePool,
        actors: Arc<dyn ActorResolver>,
        images: Arc<dyn ImageFetcher>,
        thumbnail_dir: PathBuf,
        thumbnail_size: ImageSize,
    ) -> Self {
        Self {
            pool,
            actors,
            images,
            thumbnail_dir,
            thumbnail_size,
        }
    }

    /// Match the manifest's attributed actor against local channels
    pub async fn attribute_channel(&self, manifest: &PlaylistManifest) -> ChannelAttribution {
        let actor = match manifest.attributed_to.as_slice() {
            [] => return ChannelAttribution::Missing,
            [AttributedActor::Url(actor)] => actor,
            [AttributedActor::Malformed(actor)] => {
                return ChannelAttribution::Unresolvable(format!("malformed actor id {actor:?}"))
            }
            many => return ChannelAttribution::Ambiguous(many.len()),
        };

        match self.actors.resolve_actor(actor.as_str()).await {
            Ok(resolved) => resolved
                .channel
                .map_or(ChannelAttribution::NotAChannel, ChannelAttribution::Channel),
            Err(e) => ChannelAttribution::Unresolvable(e.to_string()),
        }
    }

    /// Replace the local copy of `manifest` with the given elements
    ///
    /// `owner_account_id` is used when no channel can be attributed.
    pub async fn reconcile(
        &self,
        owner_account_id: AccountId,
        manifest: &PlaylistManifest,
        candidates: &[ElementCandidate],
        now: DateTime<Utc>,
    ) -> Result<Playlist> {
        let attribution = self.attribute_channel(manifest).await;
        match &attribution {
            ChannelAttribution::Channel(_) => {}
            ChannelAttribution::Ambiguous(count) => warn!(
                playlist = %manifest.id,
                channel_attribution = attribution.as_str(),
                actors = count,
                "Playlist attributed to several actors, keeping it account-owned"
            ),
            ChannelAttribution::Unresolvable(reason) => warn!(
                playlist = %manifest.id,
                channel_attribution = attribution.as_str(),
                reason = %reason,
                "Cannot resolve playlist channel, keeping it account-owned"
            ),
            ChannelAttribution::Missing | ChannelAttribution::NotAChannel => warn!(
                playlist = %manifest.id,
                channel_attribution = attribution.as_str(),
                "Playlist has no channel, keeping it account-owned"
            ),
        }

        let attributes =
            playlist_attributes(manifest, owner_account_id, attribution.channel(), now);
        let elements = build_elements(candidates);

        let mut stored = playlists::apply_reconciliation(&self.pool, &attributes, &elements).await?;
        info!(
            playlist_id = stored.id,
            url = %stored.url,
            elements = elements.len(),
            "Playlist reconciled"
        );

        stored.thumbnail_filename = self
            .update_thumbnail(&stored, manifest, !elements.is_empty())
            .await;
        Ok(stored)
    }

    /// Fetch or clear the miniature; returns the file name now recorded
    ///
    /// Empty playlists get no new miniature.
    async fn update_thumbnail(
        &self,
        playlist: &Playlist,
        manifest: &PlaylistManifest,
        has_elements: bool,
    ) -> Option<String> {
        let Some(icon) = &manifest.icon else {
            if playlist.thumbnail_filename.is_some() && !self.clear_thumbnail(playlist).await {
                return playlist.thumbnail_filename.clone();
            }
            return None;
        };

        if !has_elements {
            return playlist.thumbnail_filename.clone();
        }

        let filename = format!("{}.jpg", playlist.uuid);
        if let Err(e) = self
            .images
            .fetch_image(
                icon.url.as_str(),
                &self.thumbnail_dir,
                &filename,
                self.thumbnail_size,
            )
            .await
        {
            warn!(
                playlist_id = playlist.id,
                icon = %icon.url,
                error = %e,
                "Cannot fetch playlist thumbnail"
            );
            return playlist.thumbnail_filename.clone();
        }

        if let Err(e) = playlists::set_thumbnail(&self.pool, playlist.id, Some(&filename)).await {
            warn!(playlist_id = playlist.id, error = %e, "Cannot record playlist thumbnail");
            return playlist.thumbnail_filename.clone();
        }

        debug!(playlist_id = playlist.id, thumbnail = %filename, "Thumbnail updated");
        Some(filename)
    }

    async fn clear_thumbnail(&self, playlist: &Playlist) -> bool {
        if let Err(e) = playlists::set_thumbnail(&self.pool, playlist.id, None).await {
            warn!(playlist_id = playlist.id, error = %e, "Cannot clear playlist thumbnail");
            return false;
        }

        if let Some(filename) = &playlist.thumbnail_filename {
            let path = self.thumbnail_dir.join(filename);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!(path = %path.display(), "Removed stale thumbnail"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Cannot remove thumbnail"),
            }
        }

        true
    }
}
