//! Playlist domain types

use super::ids::{AccountId, ChannelId, ElementId, PlaylistId, VideoId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Audience marker meaning "everyone"
pub const PUBLIC_AUDIENCE: &str = "https://www.w3.org/ns/activitystreams#Public";

/// Compact forms of the public audience marker found in the wild
const PUBLIC_AUDIENCE_ALIASES: [&str; 2] = ["as:Public", "Public"];

/// Who may see a playlist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Listed and visible to everyone
    Public,
    /// Visible to anyone with the link, not listed
    Unlisted,
    /// Owner only (never assigned to federated playlists)
    Private,
}

impl Visibility {
    /// Derive the visibility of a federated playlist from its audience list
    ///
    /// The public marker anywhere in the list makes the playlist public,
    /// anything else is unlisted. `Private` is never produced here.
    pub fn from_audience<I, S>(audience: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let public = audience.into_iter().any(|entry| {
            let entry = entry.as_ref();
            entry == PUBLIC_AUDIENCE || PUBLIC_AUDIENCE_ALIASES.contains(&entry)
        });

        if public {
            Self::Public
        } else {
            Self::Unlisted
        }
    }

    /// Convert visibility to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Unlisted => "unlisted",
            Visibility::Private => "private",
        }
    }

    /// Parse visibility from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "public" => Some(Visibility::Public),
            "unlisted" => Some(Visibility::Unlisted),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }
}

/// Playlist mirrored from a remote actor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: PlaylistId,
    pub uuid: String,

    /// Globally unique federation identifier
    pub url: String,

    pub name: String,
    pub description: Option<String>,
    pub visibility: Visibility,
    pub owner_account_id: AccountId,

    /// Set when the playlist is attributed to a local channel
    pub channel_id: Option<ChannelId>,

    /// File name of the stored miniature, relative to the thumbnail directory
    pub thumbnail_filename: Option<String>,

    /// Last time the remote copy was checked, whatever the outcome
    pub last_refreshed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Attributes written when inserting or updating a playlist by URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertPlaylist {
    pub url: String,
    pub uuid: String,
    pub name: String,
    pub description: Option<String>,
    pub visibility: Visibility,
    pub owner_account_id: AccountId,
    pub channel_id: Option<ChannelId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub refreshed_at: DateTime<Utc>,
}

/// Element of a playlist, pointing at a local video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistElement {
    pub id: ElementId,
    pub playlist_id: PlaylistId,
    pub url: String,

    /// 1-based position as declared by the remote (gaps are allowed)
    pub position: i32,

    /// Playback bounds within the video, in seconds
    pub start_timestamp: Option<i32>,
    pub stop_timestamp: Option<i32>,

    pub video_id: VideoId,
}

/// Data for inserting an element during reconciliation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePlaylistElement {
    pub url: String,
    pub position: i32,
    pub start_timestamp: Option<i32>,
    pub stop_timestamp: Option<i32>,
    pub video_id: VideoId,
}
