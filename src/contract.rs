//! Boundary contracts for the pipeline's external collaborators.
//!
//! The orchestrator only ever talks to the source feed and the publish
//! platform through these two traits, so tests can swap in deterministic
//! `mockall` mocks and the real clients stay free to change their protocol
//! details without touching the pipeline.
//!
//! - [`FeedSource`]: query the trending feed and download one post's media.
//! - [`Publisher`]: authenticate, upload one captioned image, log out.
//!   Expected failures (refused login, rejected upload) are `Ok(false)`;
//!   transport errors are `Err` and the orchestrator catches them per item.

use std::path::Path;

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::error::{FeedError, PublishError};
use crate::feed::RawEntry;
use crate::rank::Post;

/// Source feed boundary: fetch raw candidate entries, download one post.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Up to 25 raw entries from the named feed, in feed order. A failure
    /// here is cycle-fatal: with no entries there is nothing to relay.
    async fn fetch_top(&self, subreddit: &str) -> Result<Vec<RawEntry>, FeedError>;

    /// Downloads the post's media to `dest`. Failures are item-level.
    async fn download(&self, post: &Post, dest: &Path) -> Result<(), FeedError>;
}

/// Publish platform boundary. `login` must precede `upload_image`;
/// implementations refuse uploads (`Ok(false)`) when unauthenticated, and
/// `logout` is a no-op success when already logged out.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn login(&mut self) -> Result<bool, PublishError>;

    async fn upload_image(&mut self, path: &Path, caption: &str) -> Result<bool, PublishError>;

    async fn logout(&mut self) -> Result<bool, PublishError>;
}
