//! Post sources.
//!
//! The controller only sees [`PostsSource`]. [`FixtureSource`] serves canned
//! listings after a configurable delay; [`HttpSource`] reads the public JSON
//! listing at `{base_url}/r/{reddit}.json`.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::{SourceConfig, SourceKind};
use crate::errors::DemoError;
use crate::state::Post;

/// Fetches the current posts of a subreddit.
#[async_trait]
pub trait PostsSource: Send + Sync + 'static {
    /// Posts of `reddit`, newest listing first.
    async fn fetch(&self, reddit: &str) -> Result<Vec<Post>, DemoError>;
}

/// Build the source named by `config`.
pub fn from_config(config: &SourceConfig) -> Result<Arc<dyn PostsSource>, DemoError> {
    match config.kind {
        SourceKind::Fixture => Ok(Arc::new(FixtureSource::new(Duration::from_millis(
            config.latency_ms,
        )))),
        SourceKind::Http => Ok(Arc::new(HttpSource::new(&config.base_url)?)),
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// Canned listings with simulated latency.
///
/// Unknown subreddits return an empty listing.
#[derive(Debug, Default)]
pub struct FixtureSource {
    latency: Duration,
    listings: BTreeMap<String, Vec<Post>>,
    fetches: AtomicUsize,
}

impl FixtureSource {
    /// Fixture source with the built-in listings.
    pub fn new(latency: Duration) -> Self {
        Self::empty(latency)
            .with_listing(
                "reactjs",
                [
                    "React 19 is out",
                    "Server components in practice",
                    "Why we moved off class components",
                ],
            )
            .with_listing(
                "frontend",
                ["CSS container queries are here", "A tour of view transitions"],
            )
    }

    /// Fixture source with no listings.
    pub fn empty(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    /// Add or replace the listing of `reddit`.
    #[must_use]
    pub fn with_listing<I, T>(mut self, reddit: &str, titles: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let posts = titles.into_iter().map(Post::titled).collect();
        self.listings.insert(reddit.to_string(), posts);
        self
    }

    /// Number of fetches served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PostsSource for FixtureSource {
    async fn fetch(&self, reddit: &str) -> Result<Vec<Post>, DemoError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let posts = self.listings.get(reddit).cloned().unwrap_or_default();
        debug!(reddit, count = posts.len(), "Served fixture listing");
        Ok(posts)
    }
}

// ============================================================================
// HTTP
// ============================================================================

#[derive(Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    children: Vec<ListingChild>,
}

#[derive(Deserialize)]
struct ListingChild {
    data: Post,
}

/// Reads subreddit listings over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSource {
    /// Source reading listings below `base_url`.
    pub fn new(base_url: &str) -> Result<Self, DemoError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("reddit-browser/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| DemoError::Fetch {
                reddit: String::new(),
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn listing_url(&self, reddit: &str) -> String {
        format!("{}/r/{reddit}.json", self.base_url)
    }
}

#[async_trait]
impl PostsSource for HttpSource {
    async fn fetch(&self, reddit: &str) -> Result<Vec<Post>, DemoError> {
        let failed = |e: reqwest::Error| DemoError::Fetch {
            reddit: reddit.to_string(),
            message: e.to_string(),
        };

        let url = self.listing_url(reddit);
        debug!(%url, "Fetching listing");
        let listing: Listing = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(failed)?
            .json()
            .await
            .map_err(failed)?;

        Ok(listing
            .data
            .children
            .into_iter()
            .map(|child| child.data)
            .collect())
    }
}
