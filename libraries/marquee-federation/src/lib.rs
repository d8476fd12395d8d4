//! Marquee Federation
//!
//! Pull side of the federation protocol: fetching objects from remote hosts
//! and turning their loosely typed JSON into checked values.
//!
//! # Features
//!
//! - **Fetching**: one GET per object, raw status always reported, no retry
//! - **Validation**: tagged decode of playlists, playlist elements and
//!   collection pages, with the same-origin rule applied to declared ids
//!
//! # Example
//!
//! ```ignore
//! use marquee_federation::{decode_manifest, FetcherConfig, HttpObjectFetcher, ObjectFetcher};
//!
//! let fetcher = HttpObjectFetcher::new(FetcherConfig::default())?;
//! let url = url::Url::parse("https://remote.example/video-playlists/2a7c")?;
//!
//! let response = fetcher.fetch(&url).await?;
//! let manifest = decode_manifest(&response.into_json()?, &url)?;
//! println!("{} ({:?})", manifest.name, manifest.visibility);
//! ```

mod activity;
mod client;
mod error;
mod types;
mod validate;

pub use client::{FetchResponse, FetcherConfig, HttpObjectFetcher, ObjectFetcher, ACCEPT_HEADER};
pub use error::{DecodeError, FetchError, Result, ValidationError};
pub use types::{
    AttributedActor, CollectionPage, ElementObject, Icon, PageRef, PlaylistManifest,
    RemoteItemReference,
};
pub use validate::{
    decode_element, decode_manifest, decode_page, is_element_valid, is_manifest_valid,
    is_valid_object_url, same_host, MAX_URL_LENGTH,
};
