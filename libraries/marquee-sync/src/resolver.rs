use crate::error::ItemError;
use futures::stream::{Stream, StreamExt};
use marquee_core::{VideoFetchHint, VideoId, VideoResolver};
use marquee_federation::{decode_element, ObjectFetcher, RemoteItemReference};
use std::sync::Arc;
use tracing::{debug, warn};

/// A collection item turned into something the playlist can store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementCandidate {
    /// Federation identifier of the element
    pub url: String,

    /// Fetched position, else the one the collection declared
    pub position: Option<i32>,
    pub start_timestamp: Option<i32>,
    pub stop_timestamp: Option<i32>,
    pub video_id: VideoId,
}

/// Surviving candidates of a crawl, in collection order
#[derive(Debug, Default)]
pub struct ResolvedElements {
    pub candidates: Vec<ElementCandidate>,
    pub dropped: usize,
}

/// Fetches element objects and resolves the videos they point at
#[derive(Clone)]
pub struct ElementResolver {
    fetcher: Arc<dyn ObjectFetcher>,
    videos: Arc<dyn VideoResolver>,
}

impl ElementResolver {
    pub fn new(fetcher: Arc<dyn ObjectFetcher>, videos: Arc<dyn VideoResolver>) -> Self {
        Self { fetcher, videos }
    }

    /// Resolve one item
    ///
    /// The element object is always fetched from its own identifier, so an
    /// embedded copy is never trusted over the origin. The item's declared
    /// values only fill in what the fetched element leaves out.
    pub async fn resolve(&self, item: &RemoteItemReference) -> Result<ElementCandidate, ItemError> {
        let response = self.fetcher.fetch(&item.url).await?;
        let body = response.into_json()?;
        let element = decode_element(&body, &item.url)?;

        let video = self
            .videos
            .resolve_video(element.video_url.as_str(), VideoFetchHint::OnlyVideo)
            .await
            .map_err(ItemError::Resolution)?;

        Ok(ElementCandidate {
            url: element.id.to_string(),
            position: element.position.or(item.position),
            start_timestamp: element.start_timestamp.or(item.start_timestamp),
            stop_timestamp: element.stop_timestamp.or(item.stop_timestamp),
            video_id: video.id,
        })
    }

    /// Resolve every item of `items`, with at most `concurrency` in flight
    ///
    /// Output keeps the input order. Failed items are logged and dropped.
    pub async fn resolve_all<S>(&self, items: S, concurrency: usize) -> ResolvedElements
    where
        S: Stream<Item = RemoteItemReference>,
    {
        let results: Vec<_> = items
            .map(|item| async move {
                let result = self.resolve(&item).await;
                (item, result)
            })
            .buffered(concurrency.max(1))
            .collect()
            .await;

        let mut resolved = ResolvedElements::default();
        for (item, result) in results {
            match result {
                Ok(candidate) => {
                    debug!(element = %candidate.url, video_id = candidate.video_id, "Resolved element");
                    resolved.candidates.push(candidate);
                }
                Err(e) => {
                    warn!(element = %item.url, error = %e, "Dropping playlist element");
                    resolved.dropped += 1;
                }
            }
        }

        resolved
    }
}
