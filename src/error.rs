//! Error taxonomy for the relay pipeline.
//!
//! Three tiers, matching how failures propagate:
//! - item-level (`FeedError` on a download, `NormalizeError`, `PublishError`):
//!   logged at the stage boundary and skipped, never aborting a cycle
//! - cycle-level (`CycleError`): the feed fetch failed or the working
//!   directory cannot be enumerated; there is nothing left to do this cycle
//! - setup-level (`SetupError`): bad settings file or client construction
//!   failure; aborts the account's worker before any cycle runs

use std::path::PathBuf;

use thiserror::Error;

/// Failures of the source feed boundary (fetch and media download).
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("feed payload malformed: {0}")]
    Parse(String),
    #[error("could not write downloaded media to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures of the publish boundary. Expected outcomes (refused login,
/// rejected upload) are `Ok(false)` on the trait, not errors; these variants
/// cover transport and local I/O only.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("publish transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("could not read image {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures while normalizing or converting one image file.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("image processing failed for {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Failures before the loop starts: settings loading and client construction.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("could not read settings file {path}: {source}")]
    ReadSettings {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("settings file {path} is not valid YAML: {source}")]
    ParseSettings {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("no password for account {account}: settings value empty and {env_var} unset")]
    MissingPassword { account: String, env_var: String },
    #[error("could not create working directory {path}: {source}")]
    WorkDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not construct HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// A failure that aborts the current cycle. Not locally recovered; the
/// caller of [`crate::bot::Bot::run`] decides between crash and restart.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("feed fetch failed: {0}")]
    Fetch(#[from] FeedError),
    #[error("working directory unavailable: {0}")]
    WorkDir(#[from] std::io::Error),
}

/// Top-level worker error: either the account never got off the ground or a
/// cycle died fatally.
#[derive(Debug, Error)]
pub enum BotError {
    #[error(transparent)]
    Setup(#[from] SetupError),
    #[error(transparent)]
    Cycle(#[from] CycleError),
}
