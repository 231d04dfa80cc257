//! Retry-and-rotate state machine for profile fetches.
//!
//! ```text
//! Idle -> Attempting -> Succeeded
//!             |
//!             v
//!          Retrying -> Attempting      (proxy rotated, context rebuilt, backoff slept)
//!             |
//!             v
//!          Exhausted                   (budget spent or pool empty)
//! ```

mod attempt;

use std::path::PathBuf;
use std::time::Duration;

use rand::Rng;

use crate::browser::{BrowserContext, BrowserSession};
use crate::error::FetchError;
use crate::fingerprint::{self, SessionIdentity};
use crate::proxy::{Proxy, ProxyRotation};
use crate::types::ProfileRecord;

pub const DEFAULT_LANDING_URL: &str = "https://www.instagram.com/";

#[derive(Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub max_attempts: u32,
    pub landing_url: String,
    /// Profile URL is `{profile_base}{handle}/`.
    pub profile_base: String,
    pub nav_timeout: Duration,
    pub selector_timeout: Duration,
    pub backoff_min: Duration,
    pub backoff_max: Duration,
    /// Answered when the landing page shows a login challenge.
    pub login: Option<LoginCredentials>,
    /// When set, each attempt saves `debug_{handle}_{attempt}.png` here.
    pub screenshot_dir: Option<PathBuf>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            landing_url: DEFAULT_LANDING_URL.to_string(),
            profile_base: DEFAULT_LANDING_URL.to_string(),
            nav_timeout: Duration::from_secs(30),
            selector_timeout: Duration::from_secs(5),
            backoff_min: Duration::from_secs(5),
            backoff_max: Duration::from_secs(10),
            login: None,
            screenshot_dir: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStatus {
    InProgress,
    Succeeded,
    Failed,
    Exhausted,
}

impl std::fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptStatus::InProgress => write!(f, "in_progress"),
            AttemptStatus::Succeeded => write!(f, "succeeded"),
            AttemptStatus::Failed => write!(f, "failed"),
            AttemptStatus::Exhausted => write!(f, "exhausted"),
        }
    }
}

/// Progress of one `fetch` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchAttempt {
    /// 1-based.
    pub attempt_number: u32,
    pub max_attempts: u32,
    pub status: AttemptStatus,
}

impl FetchAttempt {
    fn new(max_attempts: u32) -> Self {
        Self {
            attempt_number: 1,
            max_attempts,
            status: AttemptStatus::InProgress,
        }
    }

    fn budget_spent(&self) -> bool {
        self.attempt_number >= self.max_attempts
    }
}

/// Outcome of [`FetchEngine::rotate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rotation {
    Rotated(Proxy),
    PoolEmpty,
}

struct ActiveContext {
    context: Box<dyn BrowserContext>,
    identity: SessionIdentity,
}

/// Fetches profiles one handle at a time through a borrowed browser session.
///
/// The engine owns the proxy rotation and the current browser context. A new
/// context with a fresh identity is built on every rotation.
pub struct FetchEngine<'s, R: ProxyRotation> {
    session: &'s dyn BrowserSession,
    rotation: R,
    settings: EngineSettings,
    active: Option<ActiveContext>,
    proxy_in_use: Option<Proxy>,
}

impl<'s, R: ProxyRotation> FetchEngine<'s, R> {
    #[must_use]
    pub fn new(session: &'s dyn BrowserSession, rotation: R, settings: EngineSettings) -> Self {
        Self {
            session,
            rotation,
            settings,
            active: None,
            proxy_in_use: None,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    #[must_use]
    pub fn rotation(&self) -> &R {
        &self.rotation
    }

    #[must_use]
    pub fn proxy_in_use(&self) -> Option<&Proxy> {
        self.proxy_in_use.as_ref()
    }

    /// Builds the first browser context on the pool's current proxy.
    ///
    /// # Errors
    ///
    /// [`FetchError::SessionSetup`] when the context cannot be created.
    pub async fn bootstrap(&mut self) -> Result<(), FetchError> {
        let proxy = self.rotation.active_proxy();
        self.build_context(proxy)
            .await
            .map_err(|e| FetchError::SessionSetup(e.to_string()))
    }

    /// Fetches `handle`, retrying on a rotated proxy until the attempt budget
    /// is spent or the pool has nothing left to offer.
    ///
    /// Returns `None` when every attempt failed; the caller skips the handle.
    pub async fn fetch(&mut self, handle: &str) -> Option<ProfileRecord> {
        let mut attempt = FetchAttempt::new(self.settings.max_attempts);
        loop {
            tracing::info!(
                handle,
                attempt = attempt.attempt_number,
                max_attempts = attempt.max_attempts,
                "fetching profile"
            );

            let error = match self.run_attempt(handle, attempt.attempt_number).await {
                Ok(record) => {
                    attempt.status = AttemptStatus::Succeeded;
                    tracing::info!(
                        handle,
                        attempt = attempt.attempt_number,
                        followers = record.followers.as_deref().unwrap_or("unknown"),
                        posts = record.posts.len(),
                        status = %attempt.status,
                        "profile fetched"
                    );
                    return Some(record);
                }
                Err(e) => e,
            };

            attempt.status = AttemptStatus::Failed;
            tracing::warn!(
                handle,
                attempt = attempt.attempt_number,
                max_attempts = attempt.max_attempts,
                proxy = ?self.proxy_in_use.as_ref().map(Proxy::redacted),
                error = %error,
                "fetch attempt failed"
            );

            if attempt.budget_spent() {
                attempt.status = AttemptStatus::Exhausted;
                tracing::warn!(handle, status = %attempt.status, "retry budget spent; skipping handle");
                return None;
            }

            match self.rotate().await {
                Rotation::Rotated(proxy) => {
                    tracing::info!(handle, proxy = %proxy, "rotated proxy for retry");
                }
                Rotation::PoolEmpty => {
                    attempt.status = AttemptStatus::Exhausted;
                    tracing::warn!(handle, status = %attempt.status, "no proxy to rotate to; skipping handle");
                    return None;
                }
            }

            self.backoff().await;
            attempt.attempt_number += 1;
            attempt.status = AttemptStatus::InProgress;
        }
    }

    /// Marks the failing proxy and moves to a new one on a fresh context.
    ///
    /// A context that fails to build here is rebuilt at the start of the next
    /// attempt, where the failure counts against that attempt.
    pub async fn rotate(&mut self) -> Rotation {
        let Some(candidate) = self.rotation.active_proxy() else {
            return Rotation::PoolEmpty;
        };

        let failed = self.proxy_in_use.take().unwrap_or_else(|| candidate.clone());
        self.rotation.mark_failed(&failed);

        let next = if candidate.address == failed.address {
            match self.rotation.active_proxy() {
                Some(proxy) => proxy,
                None => return Rotation::PoolEmpty,
            }
        } else {
            candidate
        };

        if let Err(e) = self.build_context(Some(next.clone())).await {
            tracing::warn!(proxy = %next, error = %e, "context rebuild failed");
            self.proxy_in_use = Some(next.clone());
        }
        Rotation::Rotated(next)
    }

    /// Opens the landing page on the current context and reports whether it loaded.
    ///
    /// A document whose status the browser does not report counts as loaded.
    ///
    /// # Errors
    ///
    /// Browser or navigation failures.
    pub async fn check_connectivity(&mut self) -> Result<bool, FetchError> {
        let page = self.open_page().await?;
        let result = page
            .goto(&self.settings.landing_url, self.settings.nav_timeout)
            .await;
        if let Err(e) = page.close().await {
            tracing::debug!(error = %e, "page close failed");
        }
        let response = result?;
        let ok = matches!(response.status, Some(200) | None);
        tracing::info!(status = ?response.status, ok, "connectivity check");
        Ok(ok)
    }

    /// Closes the current context, if any.
    pub async fn shutdown(&mut self) {
        if let Some(active) = self.active.take() {
            if let Err(e) = active.context.close().await {
                tracing::debug!(error = %e, "context close failed");
            }
        }
    }

    async fn build_context(&mut self, proxy: Option<Proxy>) -> Result<(), FetchError> {
        self.shutdown().await;
        let identity = fingerprint::generate();
        let context = self.session.new_context(&identity, proxy.as_ref()).await?;
        self.active = Some(ActiveContext { context, identity });
        self.proxy_in_use = proxy;
        Ok(())
    }

    async fn backoff(&self) {
        let min = duration_millis(self.settings.backoff_min);
        let max = duration_millis(self.settings.backoff_max).max(min);
        let delay = rand::rng().random_range(min..=max);
        if delay > 0 {
            tracing::debug!(delay_ms = delay, "backing off before retry");
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }
}

fn duration_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
