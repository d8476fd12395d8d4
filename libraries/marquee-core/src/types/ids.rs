//! Row identifiers
//!
//! Every persisted entity uses the `SQLite` rowid as its surrogate key.

/// Local account identifier
pub type AccountId = i64;

/// Local channel identifier
pub type ChannelId = i64;

/// Local video identifier
pub type VideoId = i64;

/// Local playlist identifier
pub type PlaylistId = i64;

/// Playlist element identifier
pub type ElementId = i64;
