//! Client for the YouTube Data API v3, narrowed to what a channel report needs.

pub mod client;
pub mod error;
pub(crate) mod retry;
pub mod types;

pub use client::YoutubeClient;
pub use error::YoutubeError;
pub use types::{ChannelRecord, ChannelSnippet, VideoRecord, VideoSnippet, VideoStatistics};
