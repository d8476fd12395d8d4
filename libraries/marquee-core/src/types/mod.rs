mod actor;
mod ids;
mod playlist;
mod video;

pub use actor::{Account, Channel, ChannelRef, CreateAccount, CreateChannel, ResolvedActor};
pub use ids::{AccountId, ChannelId, ElementId, PlaylistId, VideoId};
pub use playlist::{
    CreatePlaylistElement, Playlist, PlaylistElement, UpsertPlaylist, Visibility, PUBLIC_AUDIENCE,
};
pub use video::{CreateVideo, ResolvedVideo, Video, VideoFetchHint};
