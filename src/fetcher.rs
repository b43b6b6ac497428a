//! HTTP retrieval of feeds and article pages.
//!
//! This module uses a trait-based design so the pipeline can be driven by
//! the real HTTP client or by an in-memory double in tests:
//! - [`FeedFetcher`]: Core trait, one URL in, decoded body out
//! - [`HttpFetcher`]: `reqwest` implementation
//!
//! # Fetch Policy
//!
//! - Exactly one attempt per URL, no retry or backoff
//! - Fixed 25 second timeout covering connect, redirects and body
//! - Fixed, self-identifying `User-Agent`
//! - Non-2xx responses are errors
//! - Bodies are decoded as UTF-8 with invalid sequences replaced

use crate::error::SourceError;
use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};
use url::Url;

/// Client identification sent with every request.
pub const USER_AGENT: &str = "PontoViewBot/1.0 (+https://pontoview.com.br)";

/// Upper bound for a single request.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(25);

/// A fetched document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    /// URL after redirects.
    pub url: String,
    pub body: String,
}

/// Retrieves one URL.
pub trait FeedFetcher {
    async fn fetch(&self, url: &str) -> Result<Fetched, SourceError>;
}

/// [`FeedFetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

impl FeedFetcher for HttpFetcher {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn fetch(&self, url: &str) -> Result<Fetched, SourceError> {
        let parsed = Url::parse(url).map_err(|source| SourceError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        let t0 = Instant::now();
        let resp = self.client.get(parsed).header(ACCEPT, "*/*").send().await?;
        if let Err(e) = check_status(url, resp.status()) {
            warn!(status = resp.status().as_u16(), "Non-success response");
            return Err(e);
        }

        let final_url = resp.url().to_string();
        let bytes = resp.bytes().await?;
        let body = decode_body(&bytes);
        debug!(
            bytes = bytes.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            %final_url,
            "Fetched"
        );

        Ok(Fetched {
            url: final_url,
            body,
        })
    }
}

/// Map a non-2xx status to [`SourceError::Status`].
fn check_status(url: &str, status: StatusCode) -> Result<(), SourceError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(SourceError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

/// UTF-8 decode with invalid sequences replaced by U+FFFD.
fn decode_body(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
