//! Marquee Core
//!
//! Shared domain types, capability traits, and error handling for the
//! federated playlist synchronization engine.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Playlist`, `PlaylistElement`, `Account`, `Channel`, `Video`
//! - **Capability Traits**: `ActorResolver`, `VideoResolver`, `ImageFetcher`, `Clock`
//! - **Error Handling**: Unified `MarqueeError` and `Result` types
//!
//! The capability traits are the seams towards collaborators that live outside
//! the sync engine (actor resolution, video import, image download). They are
//! always injected, never reached through globals.
//!
//! # Example
//!
//! ```rust
//! use marquee_core::types::Visibility;
//!
//! let audience = ["https://www.w3.org/ns/activitystreams#Public"];
//! assert_eq!(Visibility::from_audience(audience), Visibility::Public);
//! assert_eq!(Visibility::from_audience(Vec::<&str>::new()), Visibility::Unlisted);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{MarqueeError, Result};
pub use traits::{ActorResolver, Clock, ImageFetcher, ImageSize, SystemClock, VideoResolver};

pub use types::{
    // Identifiers
    AccountId, ChannelId, ElementId, PlaylistId, VideoId,
    // Actors
    Account, Channel, ChannelRef, CreateAccount, CreateChannel, ResolvedActor,
    // Playlists
    CreatePlaylistElement, Playlist, PlaylistElement, UpsertPlaylist, Visibility,
    // Videos
    CreateVideo, ResolvedVideo, Video, VideoFetchHint,
};
