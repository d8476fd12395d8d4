//! Checked federation values produced by validation.

use chrono::{DateTime, Utc};
use marquee_core::types::Visibility;
use url::Url;

/// Playlist object fetched from its own identifier
///
/// The playlist doubles as the root of its item collection, carried in
/// `collection`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistManifest {
    pub id: Url,
    pub uuid: String,
    pub name: String,
    pub description: Option<String>,

    /// Raw audience list (`to`)
    pub audience: Vec<String>,
    pub visibility: Visibility,

    pub published: DateTime<Utc>,
    pub updated: DateTime<Utc>,

    /// Actors the playlist is attributed to; exactly one channel is expected
    pub attributed_to: Vec<AttributedActor>,
    pub icon: Option<Icon>,
    pub total_items: Option<u64>,

    pub collection: CollectionPage,
}

/// Entry of `attributedTo`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributedActor {
    Url(Url),
    /// Not an absolute http(s) URL; kept as sent
    Malformed(String),
}

/// Image attached to an object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Icon {
    pub url: Url,
    pub media_type: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// One page (or the summary) of a paginated collection
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CollectionPage {
    pub id: Option<Url>,
    pub first: Option<PageRef>,

    /// Already resolved against the URL the page was fetched from
    pub next: Option<Url>,
    pub items: Vec<RemoteItemReference>,

    /// Entries dropped because they were not valid links or objects
    pub skipped_items: usize,
}

/// Where the first page of a collection lives
#[derive(Debug, Clone, PartialEq)]
pub enum PageRef {
    Link(Url),
    Embedded(Box<CollectionPage>),
}

/// Item of a playlist collection, as listed by the collection
///
/// Declared values come from an embedded element object, when the collection
/// embeds objects instead of linking to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteItemReference {
    pub url: Url,
    pub position: Option<i32>,
    pub start_timestamp: Option<i32>,
    pub stop_timestamp: Option<i32>,
}

impl RemoteItemReference {
    /// Reference with nothing declared besides its URL
    pub fn link(url: Url) -> Self {
        Self {
            url,
            position: None,
            start_timestamp: None,
            stop_timestamp: None,
        }
    }
}

/// Playlist element fetched from its own identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementObject {
    pub id: Url,

    /// Federation identifier of the video the element points at
    pub video_url: Url,

    pub position: Option<i32>,
    pub start_timestamp: Option<i32>,
    pub stop_timestamp: Option<i32>,
}
