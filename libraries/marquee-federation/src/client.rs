//! Remote fetch client.

use crate::error::{DecodeError, FetchError, Result};
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Content types asked for when fetching federation objects
pub const ACCEPT_HEADER: &str =
    "application/activity+json, application/ld+json; profile=\"https://www.w3.org/ns/activitystreams\"";

/// Outcome of a single GET, whatever the status
#[derive(Debug)]
pub struct FetchResponse {
    /// URL the object was requested from
    pub url: Url,
    pub status: u16,
    pub body: std::result::Result<Value, DecodeError>,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// Successful JSON body, or the reason there is none
    ///
    /// 404 maps to `FetchError::NotFound` so callers can tell a removed
    /// object from a transient failure.
    pub fn into_json(self) -> Result<Value> {
        if self.is_not_found() {
            return Err(FetchError::NotFound {
                url: self.url.to_string(),
            });
        }

        if !self.is_success() {
            return Err(FetchError::Status {
                url: self.url.to_string(),
                status: self.status,
            });
        }

        self.body.map_err(|source| FetchError::Decode {
            url: self.url.to_string(),
            source,
        })
    }
}

/// Fetches federation objects by URL
///
/// One request per call and no retry: the caller decides what a failure
/// means for its own stage.
#[async_trait]
pub trait ObjectFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchResponse>;
}

/// Settings of the HTTP fetcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetcherConfig {
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("Marquee/{} (+federation sync)", env!("CARGO_PKG_VERSION"))
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

/// `ObjectFetcher` over reqwest
#[derive(Debug, Clone)]
pub struct HttpObjectFetcher {
    http: Client,
}

impl HttpObjectFetcher {
    /// Create a fetcher with the given configuration.
    pub fn new(config: FetcherConfig) -> Result<Self> {
        if config.request_timeout_secs == 0 {
            return Err(FetchError::InvalidConfig(
                "request timeout must be greater than zero".into(),
            ));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(config.user_agent)
            .build()
            .map_err(FetchError::Request)?;

        Ok(Self { http })
    }
}

#[async_trait]
impl ObjectFetcher for HttpObjectFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchResponse> {
        debug!(url = %url, "Fetching federation object");

        let response = self
            .http
            .get(url.clone())
            .header(header::ACCEPT, ACCEPT_HEADER)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout {
                        url: url.to_string(),
                    }
                } else if e.is_connect() {
                    FetchError::Unreachable {
                        url: url.to_string(),
                        message: e.to_string(),
                    }
                } else {
                    FetchError::Request(e)
                }
            })?;

        let status = response.status().as_u16();

        let body = match response.text().await {
            Ok(text) => {
                serde_json::from_str::<Value>(&text).map_err(|e| DecodeError(e.to_string()))
            }
            Err(e) if e.is_timeout() => {
                return Err(FetchError::Timeout {
                    url: url.to_string(),
                })
            }
            Err(e) => Err(DecodeError(format!("Failed to read body: {}", e))),
        };

        debug!(url = %url, status, decoded = body.is_ok(), "Fetched federation object");

        Ok(FetchResponse {
            url: url.clone(),
            status,
            body,
        })
    }
}
