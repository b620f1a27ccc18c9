#![doc = "redgram: relay trending subreddit image posts to an Instagram-style account."]

//! The pipeline orchestrator in [`bot`] is the heart of the crate: it drives
//! fetch → filter/rank → download → convert → normalize → publish → cleanup
//! for one account, forever, with per-item fault isolation and forced pacing
//! between publishes. The other modules are its thin collaborators, reached
//! through the narrow contracts in [`contract`].

pub mod bot;
pub mod cli;
pub mod contract;
pub mod error;
pub mod feed;
pub mod files;
pub mod load_config;
pub mod normalize;
pub mod publish;
pub mod rank;
