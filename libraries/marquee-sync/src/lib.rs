//! Marquee Sync
//!
//! Inbound synchronization of playlists owned by remote actors.
//!
//! A refresh runs, leaves first:
//!
//! 1. **Staleness policy** (`staleness`) decides whether a refresh is due
//! 2. the manifest is fetched and validated (`marquee-federation`)
//! 3. **Crawler** (`crawler`) walks the paginated item collection
//! 4. **Element resolver** (`resolver`) turns each item into a local element,
//!    with a bounded number of resolutions in flight
//! 5. **Reconciler** (`reconciler`) replaces the playlist and its elements in
//!    one transaction
//!
//! `PlaylistRefresher` ties the stages together and serializes refreshes of
//! the same playlist through `PlaylistLocks`.

mod config;
mod crawler;
mod error;
mod locks;
mod reconciler;
mod refresher;
mod resolver;
mod staleness;

// Public exports
pub use config::SyncConfig;
pub use crawler::{Crawl, CrawlStop, CrawlSummary, Crawler, SummaryHandle};
pub use error::{ItemError, Result, SyncError};
pub use locks::{PlaylistLockGuard, PlaylistLocks};
pub use reconciler::{build_elements, playlist_attributes, ChannelAttribution, Reconciler};
pub use refresher::{Collaborators, PlaylistRefresher, RefreshOutcome, RefreshReport};
pub use resolver::{ElementCandidate, ElementResolver, ResolvedElements};
pub use staleness::{freshness, Freshness};
