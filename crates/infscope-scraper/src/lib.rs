//! Browser-driven profile scraping with proxy rotation.
//!
//! [`FetchEngine`] drives a remote browser through landing, login challenge,
//! profile navigation and extraction, retrying each handle on a fresh proxy
//! and a fresh [`SessionIdentity`] when an attempt fails.

pub mod browser;
pub mod engine;
pub mod error;
pub mod extract;
pub mod fingerprint;
pub mod proxy;
pub mod types;

pub use browser::{BrowserContext, BrowserPage, BrowserSession, ChromiumSession, ElementHandle};
pub use engine::{AttemptStatus, EngineSettings, FetchAttempt, FetchEngine, LoginCredentials, Rotation};
pub use error::FetchError;
pub use fingerprint::SessionIdentity;
pub use proxy::{Proxy, ProxyPool, ProxyRotation, ProxySource, VendorTemplate};
pub use types::{PostRecord, ProfileRecord};
