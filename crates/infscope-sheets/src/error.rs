use thiserror::Error;

/// Errors returned by the Sheets values client.
#[derive(Debug, Error)]
pub enum SheetsError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("Sheets API error {status}: {message}")]
    Api { status: u16, message: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A service-account key file could not be read.
    #[error("invalid service-account credentials at {path}: {reason}")]
    Credentials { path: String, reason: String },

    /// The service-account assertion could not be signed.
    #[error("JWT signing error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// The OAuth token endpoint refused the assertion.
    #[error("token exchange failed ({status}): {message}")]
    TokenExchange { status: u16, message: String },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}
