//! Source feed client: queries a subreddit's trending listing and downloads
//! post media. The listing payload is deserialized into typed structs so a
//! malformed response fails fast with a parse error instead of leaking an
//! untyped value into the pipeline.

use std::fs;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::contract::FeedSource;
use crate::error::{FeedError, SetupError};
use crate::rank::Post;

const FEED_BASE: &str = "https://www.reddit.com";
const USER_AGENT: &str = concat!("redgram/", env!("CARGO_PKG_VERSION"));

/// The listing endpoint asks for 50 but the pipeline consumes at most this many.
pub const FEED_LIMIT: usize = 25;

/// One raw feed entry, as served by the listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEntry {
    pub title: String,
    pub url: String,
    pub ups: i64,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    data: RawEntry,
}

/// Parses a listing payload into raw entries, capped at [`FEED_LIMIT`].
pub fn parse_listing(body: &str) -> Result<Vec<RawEntry>, FeedError> {
    let listing: Listing =
        serde_json::from_str(body).map_err(|e| FeedError::Parse(e.to_string()))?;
    let mut entries: Vec<RawEntry> = listing
        .data
        .children
        .into_iter()
        .map(|child| child.data)
        .collect();
    entries.truncate(FEED_LIMIT);
    Ok(entries)
}

pub struct RedditClient {
    http: Client,
}

impl RedditClient {
    pub fn new() -> Result<Self, SetupError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { http })
    }

    fn listing_url(&self, subreddit: &str) -> String {
        format!("{FEED_BASE}/r/{subreddit}/hot.json?count=50")
    }
}

#[async_trait]
impl FeedSource for RedditClient {
    async fn fetch_top(&self, subreddit: &str) -> Result<Vec<RawEntry>, FeedError> {
        let url = self.listing_url(subreddit);
        debug!(url = %url, "requesting feed listing");
        let body = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let entries = parse_listing(&body)?;
        info!(subreddit, entries = entries.len(), "fetched feed listing");
        Ok(entries)
    }

    async fn download(&self, post: &Post, dest: &Path) -> Result<(), FeedError> {
        let bytes = self
            .http
            .get(&post.url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        fs::write(dest, &bytes).map_err(|source| FeedError::Write {
            path: dest.to_path_buf(),
            source,
        })?;
        debug!(url = %post.url, dest = %dest.display(), bytes = bytes.len(), "downloaded post media");
        Ok(())
    }
}
