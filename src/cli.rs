//! CLI glue: argument parsing and worker startup.
//!
//! All pipeline logic lives in the library modules; this module only parses
//! arguments, loads settings, and spawns one independent worker task per
//! configured account. Workers share nothing — each owns its clients, its
//! working directory, and its counters — so there is no cross-account
//! coordination needed.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::bot::Bot;
use crate::feed::RedditClient;
use crate::load_config::load_settings;
use crate::publish::InstagramClient;

/// CLI for redgram: relay trending subreddit images to the target platform.
#[derive(Parser)]
#[clap(
    name = "redgram",
    version,
    about = "Relay trending subreddit image posts to an Instagram-style account"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the relay loop for every account in the settings file
    Run {
        /// Path to the YAML settings file
        #[clap(long)]
        settings: PathBuf,
    },
}

/// Async CLI entrypoint, extracted for programmatic invocation.
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run { settings } => {
            let settings = load_settings(settings)?;

            let mut workers = Vec::new();
            for account in settings.accounts {
                let name = account.bot_name();
                let feed = RedditClient::new()?;
                let publisher =
                    InstagramClient::new(account.username.clone(), account.password.clone())?;
                let bot = Bot::new(account, feed, publisher)?;

                tracing::info!(account = %name, "spawning relay worker");
                workers.push(tokio::spawn(async move {
                    // A worker only returns on a cycle-fatal error; restart
                    // policy belongs to the process supervisor.
                    if let Err(e) = bot.run().await {
                        tracing::error!(account = %name, error = %e, "relay worker stopped");
                    }
                }));
            }

            futures::future::join_all(workers).await;
            Ok(())
        }
    }
}
