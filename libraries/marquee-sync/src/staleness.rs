use chrono::{DateTime, Duration, Utc};
use marquee_core::Playlist;

/// Whether a mirrored playlist is due for a refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
}

/// Stale once more than `interval` has passed since the last check
pub fn freshness(playlist: &Playlist, now: DateTime<Utc>, interval: Duration) -> Freshness {
    if now.signed_duration_since(playlist.last_refreshed_at) > interval {
        Freshness::Stale
    } else {
        Freshness::Fresh
    }
}
