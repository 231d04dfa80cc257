//! Browser automation seam.
//!
//! The fetch engine talks only to these traits. [`ChromiumSession`] is the
//! production implementation over the Chrome DevTools Protocol; tests drive
//! the engine with in-memory stubs.

mod chromium;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::fingerprint::SessionIdentity;
use crate::proxy::Proxy;

pub use chromium::ChromiumSession;

/// Outcome of a completed navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationResponse {
    /// `None` when the browser did not report a status for the document.
    pub status: Option<u16>,
}

impl NavigationResponse {
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.status.is_some_and(|s| s >= 400)
    }
}

/// A connected remote browser.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Opens an isolated context carrying `identity` and egressing through `proxy`.
    async fn new_context(
        &self,
        identity: &SessionIdentity,
        proxy: Option<&Proxy>,
    ) -> Result<Box<dyn BrowserContext>, FetchError>;

    async fn close(&self) -> Result<(), FetchError>;
}

#[async_trait]
pub trait BrowserContext: Send + Sync {
    async fn new_page(&self) -> Result<Box<dyn BrowserPage>, FetchError>;

    async fn close(&self) -> Result<(), FetchError>;
}

#[async_trait]
pub trait BrowserPage: Send + Sync {
    /// Installs `script` to run on every new document before page scripts.
    async fn add_init_script(&self, script: &str) -> Result<(), FetchError>;

    async fn goto(&self, url: &str, timeout: Duration) -> Result<NavigationResponse, FetchError>;

    /// Waits until the document has finished loading and the network is quiet.
    async fn wait_for_load(&self, timeout: Duration) -> Result<(), FetchError>;

    async fn locate(&self, selector: &str) -> Result<Option<Box<dyn ElementHandle>>, FetchError>;

    async fn locate_all(&self, selector: &str) -> Result<Vec<Box<dyn ElementHandle>>, FetchError>;

    /// Waits up to `timeout` for `selector` to match. `Ok(false)` on timeout.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<bool, FetchError>;

    /// Rendered text of the document body.
    async fn body_text(&self) -> Result<String, FetchError>;

    async fn press_escape(&self) -> Result<(), FetchError>;

    async fn screenshot(&self, path: &Path) -> Result<(), FetchError>;

    async fn close(&self) -> Result<(), FetchError>;
}

#[async_trait]
pub trait ElementHandle: Send + Sync {
    async fn text_content(&self) -> Result<Option<String>, FetchError>;

    async fn get_attribute(&self, name: &str) -> Result<Option<String>, FetchError>;

    async fn click(&self) -> Result<(), FetchError>;

    /// Focuses the element and types `value` into it.
    async fn fill(&self, value: &str) -> Result<(), FetchError>;
}
