//! Video records referenced by playlist elements

use super::ids::{ChannelId, VideoId};
use serde::{Deserialize, Serialize};

/// Video known locally
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub id: VideoId,
    pub uuid: String,
    pub url: String,
    pub name: String,
    pub channel_id: Option<ChannelId>,
}

/// Data for creating a video
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVideo {
    pub uuid: String,
    pub url: String,
    pub name: String,
    pub channel_id: Option<ChannelId>,
}

/// Result of resolving a remote video identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedVideo {
    pub id: VideoId,
    pub url: String,
}

impl From<&Video> for ResolvedVideo {
    fn from(video: &Video) -> Self {
        Self {
            id: video.id,
            url: video.url.clone(),
        }
    }
}

/// How much of a remote video the resolver should import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoFetchHint {
    /// Only the video object itself (playlist elements need nothing else)
    OnlyVideo,
    /// Video plus comments, captions and other attached collections
    All,
}
