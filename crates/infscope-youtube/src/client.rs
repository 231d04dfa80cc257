//! HTTP client for the YouTube Data API v3.
//!
//! Every request carries the API key as the `key` query parameter. Transient
//! failures are retried through [`crate::retry`]; 4xx responses surface as
//! [`YoutubeError::Api`] with the message from the error envelope.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::error::YoutubeError;
use crate::retry::retry_with_backoff;
use crate::types::{
    ChannelItem, ChannelRecord, ErrorEnvelope, ListResponse, SearchItem, VideoRecord,
};

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3/";
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BACKOFF_BASE_MS: u64 = 1_000;

/// Number of recent uploads fetched per channel.
pub const RECENT_VIDEO_LIMIT: u32 = 15;

/// Client for the YouTube Data API v3.
///
/// Use [`YoutubeClient::new`] for production or [`YoutubeClient::with_base_url`]
/// to point at a mock server in tests.
pub struct YoutubeClient {
    client: Client,
    api_key: String,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl YoutubeClient {
    /// Creates a client pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`YoutubeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, YoutubeError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`YoutubeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`YoutubeError::Api`] if `base_url` is not a
    /// valid URL.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, YoutubeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("infscope/0.1 (influencer-report)")
            .build()?;

        // Exactly one trailing slash so `Url::join` appends the endpoint
        // instead of replacing the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| YoutubeError::Api {
            status: 0,
            message: format!("invalid base URL '{base_url}': {e}"),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        })
    }

    /// Overrides the transient-error retry policy.
    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Resolves `handle` to a channel and fetches its statistics and recent uploads.
    ///
    /// Returns `Ok(None)` when no channel matches the handle. A channel with
    /// no uploads yields an empty `recent_videos`.
    ///
    /// # Errors
    ///
    /// - [`YoutubeError::Api`] if the API rejects a request.
    /// - [`YoutubeError::Http`] on network failure or a 5xx that outlived the retries.
    /// - [`YoutubeError::Deserialize`] if a response does not match the expected shape.
    pub async fn fetch_channel(&self, handle: &str) -> Result<Option<ChannelRecord>, YoutubeError> {
        let Some(channel_id) = self.search_channel_id(handle).await? else {
            tracing::info!(handle, "no YouTube channel matches handle");
            return Ok(None);
        };
        tracing::debug!(handle, channel_id, "resolved channel");

        let Some(channel) = self.channel(&channel_id).await? else {
            tracing::info!(handle, channel_id, "channel lookup returned no data");
            return Ok(None);
        };

        let video_ids = self.recent_video_ids(&channel_id).await?;
        let recent_videos = self.videos(&video_ids).await?;
        tracing::info!(
            handle,
            channel_id,
            title = %channel.snippet.title,
            videos = recent_videos.len(),
            "fetched YouTube channel"
        );

        let subscriber_count = if channel.statistics.hidden_subscriber_count {
            None
        } else {
            channel.statistics.subscriber_count
        };

        Ok(Some(ChannelRecord {
            channel_id: channel.id,
            subscriber_count,
            snippet: channel.snippet,
            recent_videos,
        }))
    }

    /// Calls `search.list` with `type=channel` and returns the top hit's channel ID.
    ///
    /// # Errors
    ///
    /// See [`YoutubeClient::fetch_channel`].
    pub async fn search_channel_id(&self, handle: &str) -> Result<Option<String>, YoutubeError> {
        let url = self.build_url(
            "search",
            &[("part", "id"), ("q", handle), ("type", "channel"), ("maxResults", "1")],
        );
        let list: ListResponse<SearchItem> = self
            .get_list(&url, &format!("search(type=channel, q={handle})"))
            .await?;
        Ok(list.items.into_iter().find_map(|item| item.id.channel_id))
    }

    /// Calls `channels.list` with `part=statistics,snippet`.
    async fn channel(&self, channel_id: &str) -> Result<Option<ChannelItem>, YoutubeError> {
        let url = self.build_url("channels", &[("part", "statistics,snippet"), ("id", channel_id)]);
        let list: ListResponse<ChannelItem> = self
            .get_list(&url, &format!("channels(id={channel_id})"))
            .await?;
        Ok(list.items.into_iter().next())
    }

    /// Calls `search.list` for the channel's newest uploads and returns their video IDs.
    ///
    /// # Errors
    ///
    /// See [`YoutubeClient::fetch_channel`].
    pub async fn recent_video_ids(&self, channel_id: &str) -> Result<Vec<String>, YoutubeError> {
        let limit = RECENT_VIDEO_LIMIT.to_string();
        let url = self.build_url(
            "search",
            &[
                ("part", "id"),
                ("channelId", channel_id),
                ("order", "date"),
                ("type", "video"),
                ("maxResults", &limit),
            ],
        );
        let list: ListResponse<SearchItem> = self
            .get_list(&url, &format!("search(type=video, channelId={channel_id})"))
            .await?;
        Ok(list
            .items
            .into_iter()
            .filter_map(|item| item.id.video_id)
            .collect())
    }

    /// Calls `videos.list` with `part=statistics,snippet` for `video_ids`.
    ///
    /// An empty `video_ids` returns an empty list without a request.
    ///
    /// # Errors
    ///
    /// See [`YoutubeClient::fetch_channel`].
    pub async fn videos(&self, video_ids: &[String]) -> Result<Vec<VideoRecord>, YoutubeError> {
        if video_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = video_ids.join(",");
        let url = self.build_url("videos", &[("part", "statistics,snippet"), ("id", &ids)]);
        let list: ListResponse<VideoRecord> =
            self.get_list(&url, &format!("videos(id={ids})")).await?;
        Ok(list.items)
    }

    /// Builds the request URL for `endpoint` with the API key and `params`
    /// percent-encoded into the query string.
    fn build_url(&self, endpoint: &str, params: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(endpoint);
        }
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
            pairs.append_pair("key", &self.api_key);
        }
        url
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        url: &Url,
        context: &str,
    ) -> Result<T, YoutubeError> {
        let body =
            retry_with_backoff(self.max_retries, self.backoff_base_ms, || self.request_json(url))
                .await?;
        serde_json::from_value(body).map_err(|e| YoutubeError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }

    /// Sends a GET request and parses the response body as JSON.
    ///
    /// 5xx statuses become [`YoutubeError::Http`] so they are retried; other
    /// non-2xx statuses become [`YoutubeError::Api`].
    async fn request_json(&self, url: &Url) -> Result<serde_json::Value, YoutubeError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if status.is_server_error() {
            return Err(response.error_for_status().map_or_else(
                YoutubeError::Http,
                |_| YoutubeError::Api {
                    status: status.as_u16(),
                    message: "server error".to_owned(),
                },
            ));
        }
        let body = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or(body);
            return Err(YoutubeError::Api {
                status: status.as_u16(),
                message,
            });
        }
        serde_json::from_str(&body).map_err(|e| YoutubeError::Deserialize {
            context: redact_key(url),
            source: e,
        })
    }
}

/// URL for error context with the `key` parameter removed.
fn redact_key(url: &Url) -> String {
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "key")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}
