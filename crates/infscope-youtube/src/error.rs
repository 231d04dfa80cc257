use thiserror::Error;

/// Errors returned by the YouTube Data API client.
#[derive(Debug, Error)]
pub enum YoutubeError {
    /// Network or TLS failure, or a 5xx status, from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API rejected the request (bad key, quota, malformed parameters).
    #[error("YouTube API error {status}: {message}")]
    Api { status: u16, message: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
