//! Lazy walk over a paginated remote collection.
//!
//! Pages are fetched one at a time, only when the consumer asks for more
//! items, and the walk stops for good at the first page that cannot be
//! fetched or decoded. Items already handed out stay valid.

use futures::stream::{self, BoxStream, Stream, StreamExt};
use marquee_federation::{
    decode_page, same_host, CollectionPage, ObjectFetcher, PageRef, RemoteItemReference,
};
use std::collections::HashSet;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use tracing::{debug, warn};
use url::Url;

/// Why a crawl ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlStop {
    /// Still running, or dropped before the end
    Pending,
    /// Last page had no successor
    Exhausted,
    /// Page ceiling reached with pages left
    PageLimit,
    /// A page could not be fetched
    FetchFailed,
    /// A page body failed validation
    InvalidPage,
    /// A `first`/`next` link pointed at another host
    ForeignLink,
    /// A `first`/`next` link pointed at a page already walked
    Cycle,
}

/// Progress of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Pages consumed, including an already-fetched root
    pub pages: usize,
    pub items: usize,
    /// Entries the pages listed that were not usable references
    pub skipped_items: usize,
    pub stop: CrawlStop,
}

impl Default for CrawlSummary {
    fn default() -> Self {
        Self {
            pages: 0,
            items: 0,
            skipped_items: 0,
            stop: CrawlStop::Pending,
        }
    }
}

/// Read access to the summary of a crawl that may still be running
#[derive(Debug, Clone, Default)]
pub struct SummaryHandle(Arc<Mutex<CrawlSummary>>);

impl SummaryHandle {
    pub fn snapshot(&self) -> CrawlSummary {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, f: impl FnOnce(&mut CrawlSummary)) {
        f(&mut self.0.lock().unwrap_or_else(PoisonError::into_inner));
    }
}

/// Walks collections through an `ObjectFetcher`
#[derive(Clone)]
pub struct Crawler {
    fetcher: Arc<dyn ObjectFetcher>,
    max_pages: usize,
}

impl Crawler {
    pub fn new(fetcher: Arc<dyn ObjectFetcher>, max_pages: usize) -> Self {
        Self { fetcher, max_pages }
    }

    /// Crawl the collection at `root`, fetching the root itself first
    pub fn crawl(&self, root: Url) -> Crawl {
        self.start(root.clone(), Next::Fetch(root), 0)
    }

    /// Crawl a collection whose root was already fetched from `root`
    ///
    /// The root counts as one page toward the ceiling.
    pub fn crawl_from(&self, root: Url, page: CollectionPage) -> Crawl {
        self.start(root, Next::Ready(page), 1)
    }

    fn start(&self, root: Url, next: Next, pages: usize) -> Crawl {
        let summary = SummaryHandle::default();
        summary.update(|s| s.pages = pages);

        let mut visited = HashSet::new();
        visited.insert(page_key(&root));

        let state = CrawlState {
            fetcher: Arc::clone(&self.fetcher),
            max_pages: self.max_pages,
            root,
            next,
            pages,
            visited,
            summary: summary.clone(),
        };

        let items = stream::unfold(state, step)
            .flat_map(stream::iter)
            .boxed();

        Crawl { items, summary }
    }
}

/// Stream of item references, in collection order
pub struct Crawl {
    items: BoxStream<'static, RemoteItemReference>,
    summary: SummaryHandle,
}

impl Crawl {
    /// Handle that outlives the stream, for reading the summary afterwards
    pub fn summary_handle(&self) -> SummaryHandle {
        self.summary.clone()
    }
}

impl Stream for Crawl {
    type Item = RemoteItemReference;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.items.poll_next_unpin(cx)
    }
}

enum Next {
    Fetch(Url),
    Ready(CollectionPage),
    Done,
}

struct CrawlState {
    fetcher: Arc<dyn ObjectFetcher>,
    max_pages: usize,
    root: Url,
    next: Next,
    pages: usize,
    /// Pages walked so far, fragments stripped
    visited: HashSet<Url>,
    summary: SummaryHandle,
}

impl CrawlState {
    fn finish(&mut self, stop: CrawlStop) {
        self.next = Next::Done;
        self.summary.update(|s| s.stop = stop);
    }

    /// Queue `link` as the next page, unless it leaves the root host or
    /// goes back to a page already walked
    fn follow(&mut self, link: Url) {
        if !same_host(&link, &self.root) {
            warn!(
                root = %self.root,
                link = %link,
                "Collection links to another host, stopping crawl"
            );
            self.finish(CrawlStop::ForeignLink);
        } else if !self.visited.insert(page_key(&link)) {
            warn!(
                root = %self.root,
                link = %link,
                "Collection links back to a visited page, stopping crawl"
            );
            self.finish(CrawlStop::Cycle);
        } else {
            self.next = Next::Fetch(link);
        }
    }

    async fn fetch_page(&mut self, url: Url) -> Option<CollectionPage> {
        let response = match self.fetcher.fetch(&url).await {
            Ok(response) => response,
            Err(e) => {
                warn!(page = %url, error = %e, "Failed to fetch collection page");
                self.finish(CrawlStop::FetchFailed);
                return None;
            }
        };

        let body = match response.into_json() {
            Ok(body) => body,
            Err(e) => {
                warn!(page = %url, error = %e, "Failed to fetch collection page");
                self.finish(CrawlStop::FetchFailed);
                return None;
            }
        };

        match decode_page(&body, &url) {
            Ok(page) => Some(page),
            Err(e) => {
                warn!(page = %url, error = %e, "Invalid collection page");
                self.finish(CrawlStop::InvalidPage);
                None
            }
        }
    }
}

async fn step(mut state: CrawlState) -> Option<(Vec<RemoteItemReference>, CrawlState)> {
    loop {
        match std::mem::replace(&mut state.next, Next::Done) {
            Next::Done => return None,

            Next::Fetch(url) => {
                if state.pages >= state.max_pages {
                    debug!(
                        root = %state.root,
                        max_pages = state.max_pages,
                        "Page ceiling reached"
                    );
                    state.finish(CrawlStop::PageLimit);
                    return None;
                }

                state.pages += 1;
                let pages = state.pages;
                state.summary.update(|s| s.pages = pages);

                debug!(page = %url, "Fetching collection page");
                if let Some(page) = state.fetch_page(url).await {
                    state.next = Next::Ready(page);
                }
            }

            Next::Ready(page) => {
                if let Some(id) = &page.id {
                    state.visited.insert(page_key(id));
                }

                let CollectionPage {
                    first,
                    next,
                    items,
                    skipped_items,
                    ..
                } = page;

                // A summary points at its first page; only pages carry `next`
                match (first, next) {
                    (Some(PageRef::Embedded(page)), _) => state.next = Next::Ready(*page),
                    (Some(PageRef::Link(link)), _) | (None, Some(link)) => state.follow(link),
                    (None, None) => state.finish(CrawlStop::Exhausted),
                }

                let count = items.len();
                state.summary.update(|s| {
                    s.items += count;
                    s.skipped_items += skipped_items;
                });

                if count > 0 {
                    return Some((items, state));
                }
            }
        }
    }
}

fn page_key(url: &Url) -> Url {
    let mut key = url.clone();
    key.set_fragment(None);
    key
}
