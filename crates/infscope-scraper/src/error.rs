use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("browser session setup failed: {0}")]
    SessionSetup(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("HTTP status {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("timed out after {secs}s waiting for {what}")]
    Timeout { what: String, secs: u64 },

    #[error("login challenge still present for {handle}")]
    ChallengeUnresolved { handle: String },

    #[error("no main content found for {handle}")]
    ExtractionNotFound { handle: String },

    #[error("could not read element {selector}: {reason}")]
    ElementRead { selector: String, reason: String },

    #[error("proxy pool has no proxies to rotate to")]
    ProxyPoolEmpty,

    #[error("browser error: {0}")]
    Browser(String),
}

impl From<chromiumoxide::error::CdpError> for FetchError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        FetchError::Browser(err.to_string())
    }
}
