//! Settings loading: parses the per-account YAML settings file into typed
//! [`AccountSettings`] and injects the password secret from the environment
//! when the file leaves it blank. This is the only place untrusted YAML is
//! parsed; everything downstream works with the typed structs.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{error, info};

use crate::error::SetupError;

/// Env var consulted when an account's `password` field is empty, so the
/// secret can stay out of the settings file.
pub const PASSWORD_ENV_VAR: &str = "IG_PASSWORD";

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub accounts: Vec<AccountSettings>,
}

/// Per-bot configuration. Immutable once loaded; owned by exactly one
/// orchestrator instance.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountSettings {
    /// Feed name to pull trending posts from.
    pub subreddit: String,
    /// Minimum score for a post to be relayed (direct-image URLs are exempt).
    pub upvote_threshold: i64,
    /// Target platform credentials.
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Tag string appended below each caption.
    pub tags: String,
    /// Scratch directory for in-flight images. Defaults to `./<subreddit>`.
    #[serde(default)]
    pub work_dir: Option<PathBuf>,
}

impl AccountSettings {
    /// Human-readable account name used in log lines.
    pub fn bot_name(&self) -> String {
        format!("{} | {}", self.subreddit, self.username)
    }

    pub fn work_dir(&self) -> PathBuf {
        self.work_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(&self.subreddit))
    }
}

/// Loads and validates the settings file. Any failure here is a
/// [`SetupError`]: the process must not start a worker on bad settings.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings, SetupError> {
    let path = path.as_ref();
    info!(path = %path.display(), "loading settings");

    let content = fs::read_to_string(path).map_err(|source| {
        error!(path = %path.display(), error = %source, "could not read settings file");
        SetupError::ReadSettings {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let mut settings: Settings = serde_yaml::from_str(&content).map_err(|source| {
        error!(path = %path.display(), error = %source, "settings file is not valid YAML");
        SetupError::ParseSettings {
            path: path.to_path_buf(),
            source,
        }
    })?;

    for account in &mut settings.accounts {
        if account.password.is_empty() {
            account.password = std::env::var(PASSWORD_ENV_VAR).map_err(|_| {
                SetupError::MissingPassword {
                    account: account.bot_name(),
                    env_var: PASSWORD_ENV_VAR.to_string(),
                }
            })?;
        }
    }

    info!(accounts = settings.accounts.len(), "settings loaded");
    Ok(settings)
}
