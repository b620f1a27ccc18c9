//! Pipeline orchestrator: runs one account's infinite relay cycle.
//!
//! A cycle walks the stages in strict order:
//! fetch → filter/rank → download → png-to-jpg convert → normalize →
//! publish → cleanup, then starts over. Stages run sequentially and items
//! within a stage are handled one at a time; the per-item pacing sleep in
//! the publish stage *is* the platform rate-limit control, so nothing here
//! may parallelize it.
//!
//! # Fault isolation
//! - A single item's failure (one download, one convert, one normalize, one
//!   publish attempt, one deletion) is logged with the item and cause, then
//!   skipped. It never aborts the cycle.
//! - A feed-fetch failure is cycle-fatal and propagates out of [`Bot::run`];
//!   with no entries there is nothing to relay, and the supervising layer
//!   decides between crash and restart.
//!
//! # Working set
//! The convert, normalize, and publish stages re-enumerate the working
//! directory rather than carrying a file list across stages. Files left
//! behind by a failed cleanup therefore flow into the next cycle's passes:
//! intended resilience, the leftover gets a second chance to publish.
//!
//! # Pacing
//! The sleep after each publish attempt is unconditional, including after
//! the last file of the pass. The trailing sleep is a known inefficiency
//! that is kept to preserve observable pacing behavior.

use std::path::Path;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::contract::{FeedSource, Publisher};
use crate::error::{BotError, CycleError, SetupError};
use crate::files::WorkDir;
use crate::load_config::AccountSettings;
use crate::normalize;
use crate::rank::{filter_and_rank, Post};

/// Fixed pause between publish attempts.
pub const DEFAULT_PACING: Duration = Duration::from_secs(600);

/// Per-account counters. Reset at construction, never persisted.
#[derive(Debug, Default)]
pub struct BotRunState {
    pub images_downloaded: u64,
    pub images_uploaded: u64,
}

/// What one cycle accomplished, for the cycle-complete log line and tests.
#[derive(Debug)]
pub struct CycleReport {
    pub accepted: usize,
    pub downloaded: usize,
    pub converted: usize,
    pub normalized: usize,
    pub published: usize,
    pub cleaned: usize,
}

pub struct Bot<F, P> {
    settings: AccountSettings,
    feed: F,
    publisher: P,
    workdir: WorkDir,
    state: BotRunState,
    pacing: Duration,
}

impl<F: FeedSource, P: Publisher> Bot<F, P> {
    pub fn new(settings: AccountSettings, feed: F, publisher: P) -> Result<Self, SetupError> {
        let workdir = WorkDir::setup(settings.work_dir())?;
        Ok(Self {
            settings,
            feed,
            publisher,
            workdir,
            state: BotRunState::default(),
            pacing: DEFAULT_PACING,
        })
    }

    /// Overrides the publish pacing delay. Tests shrink it to zero.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn state(&self) -> &BotRunState {
        &self.state
    }

    pub fn workdir(&self) -> &WorkDir {
        &self.workdir
    }

    /// Runs cycles forever. Only a cycle-fatal failure makes this return.
    pub async fn run(mut self) -> Result<(), BotError> {
        let account = self.settings.bot_name();
        info!(account = %account, "relay worker started");
        loop {
            let report = self.run_cycle().await.map_err(|e| {
                error!(account = %account, error = %e, "cycle aborted");
                BotError::from(e)
            })?;
            info!(
                account = %account,
                accepted = report.accepted,
                downloaded = report.downloaded,
                published = report.published,
                total_downloaded = self.state.images_downloaded,
                total_uploaded = self.state.images_uploaded,
                "cycle complete"
            );
        }
    }

    /// One full pass through the pipeline. Public so integration tests can
    /// drive a single cycle against mock collaborators.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, CycleError> {
        let account = self.settings.bot_name();
        info!(account = %account, subreddit = %self.settings.subreddit, "starting cycle");

        // Fetch is the one stage with no per-item fallback.
        let entries = self.feed.fetch_top(&self.settings.subreddit).await?;
        let posts = filter_and_rank(&entries, self.settings.upvote_threshold);
        info!(account = %account, entries = entries.len(), accepted = posts.len(), "filtered and ranked feed");

        let downloaded = self.download_posts(&account, &posts).await;
        let converted = self.convert_pngs(&account)?;
        let normalized = self.normalize_all(&account)?;
        let published = self.publish_all(&account).await?;

        let cleaned = self.workdir.clear()?;
        info!(account = %account, cleaned, "working directory cleared");

        Ok(CycleReport {
            accepted: posts.len(),
            downloaded,
            converted,
            normalized,
            published,
            cleaned,
        })
    }

    async fn download_posts(&mut self, account: &str, posts: &[Post]) -> usize {
        let mut downloaded = 0;
        for post in posts {
            let dest = self.workdir.root().join(post.file_name());
            match self.feed.download(post, &dest).await {
                Ok(()) => {
                    downloaded += 1;
                    self.state.images_downloaded += 1;
                }
                Err(e) => {
                    warn!(account = %account, title = %post.title, url = %post.url, error = %e, "download failed, skipping post")
                }
            }
        }
        downloaded
    }

    /// Re-encodes every `.png` currently on disk as `.jpg`, leftovers included.
    fn convert_pngs(&self, account: &str) -> Result<usize, CycleError> {
        let mut converted = 0;
        for png in self.workdir.png_files()? {
            match self.workdir.convert_png_to_jpg(&png) {
                Ok(_) => converted += 1,
                Err(e) => {
                    warn!(account = %account, path = %png.display(), error = %e, "format conversion failed, skipping file")
                }
            }
        }
        Ok(converted)
    }

    fn normalize_all(&self, account: &str) -> Result<usize, CycleError> {
        let mut normalized = 0;
        for file in self.workdir.files()? {
            match normalize::normalize(&file) {
                Ok(()) => normalized += 1,
                Err(e) => {
                    warn!(account = %account, path = %file.display(), error = %e, "normalization failed, skipping file")
                }
            }
        }
        Ok(normalized)
    }

    /// Uploads every file on disk, one at a time: login, upload, logout,
    /// then the unconditional pacing sleep. A failed login skips only the
    /// upload; logout and pacing still run for that file.
    async fn publish_all(&mut self, account: &str) -> Result<usize, CycleError> {
        let mut published = 0;
        for file in self.workdir.files()? {
            let caption = caption_for(&file, &self.settings.tags);

            match self.publisher.login().await {
                Ok(true) => match self.publisher.upload_image(&file, &caption).await {
                    Ok(true) => {
                        published += 1;
                        self.state.images_uploaded += 1;
                        info!(account = %account, path = %file.display(), "published image");
                    }
                    Ok(false) => {
                        warn!(account = %account, path = %file.display(), "upload rejected by platform")
                    }
                    Err(e) => {
                        warn!(account = %account, path = %file.display(), error = %e, "upload failed")
                    }
                },
                Ok(false) => {
                    warn!(account = %account, path = %file.display(), "login refused, skipping upload")
                }
                Err(e) => {
                    warn!(account = %account, path = %file.display(), error = %e, "login failed, skipping upload")
                }
            }

            match self.publisher.logout().await {
                Ok(true) => {}
                Ok(false) => warn!(account = %account, "logout refused"),
                Err(e) => warn!(account = %account, error = %e, "logout failed"),
            }

            tokio::time::sleep(self.pacing).await;
        }
        Ok(published)
    }
}

/// Caption: the file's base name, a newline, then the account's tag string.
fn caption_for(path: &Path, tags: &str) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{stem}\n{tags}")
}
