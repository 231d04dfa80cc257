//! Proxy pool: health tracking and rotation cadence.
//!
//! The pool owns every [`Proxy`]; callers receive clones and refer back to a
//! proxy by its address. At most one proxy is current at a time. The current
//! proxy changes only when it is marked failed or when the rotation interval
//! has elapsed.

mod free_list;
mod load;
mod probe;

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use rand::seq::IndexedRandom;
use reqwest::Url;

pub use free_list::{scrape_free_lists, FREE_PROXY_SOURCES};
pub use probe::{probe, DEFAULT_PROBE_URL, PROBE_TIMEOUT};

/// How long a healthy proxy stays current before the pool picks again.
pub const DEFAULT_ROTATION_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Clone, PartialEq, Eq)]
pub struct ProxyCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for ProxyCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyCredentials")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// An egress proxy. Two proxies are the same proxy when their addresses match.
#[derive(Clone, PartialEq, Eq)]
pub struct Proxy {
    /// Proxy URI. Vendor proxies carry their credentials as userinfo here.
    pub address: String,
    pub credentials: Option<ProxyCredentials>,
}

impl Proxy {
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            credentials: None,
        }
    }

    #[must_use]
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(ProxyCredentials {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// `scheme://host[:port]` with any userinfo removed.
    #[must_use]
    pub fn server(&self) -> String {
        let Ok(url) = Url::parse(&self.address) else {
            return self.address.clone();
        };
        match url.host_str() {
            Some(host) => format!("{}://{}", url.scheme(), host_port(host, url.port())),
            None => self.address.clone(),
        }
    }

    /// Username and password, from explicit credentials or the address userinfo.
    #[must_use]
    pub fn auth(&self) -> Option<(String, String)> {
        if let Some(c) = &self.credentials {
            return Some((c.username.clone(), c.password.clone()));
        }
        let url = Url::parse(&self.address).ok()?;
        let password = url.password()?;
        if url.username().is_empty() {
            return None;
        }
        Some((url.username().to_string(), password.to_string()))
    }

    /// Address with the password masked, for logs.
    #[must_use]
    pub fn redacted(&self) -> String {
        let Ok(url) = Url::parse(&self.address) else {
            return self.address.clone();
        };
        let Some(host) = url.host_str() else {
            return self.address.clone();
        };
        let authority = host_port(host, url.port());
        if url.password().is_some() {
            format!("{}://{}:***@{authority}", url.scheme(), url.username())
        } else {
            format!("{}://{authority}", url.scheme())
        }
    }
}

fn host_port(host: &str, port: Option<u16>) -> String {
    match port {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

impl std::fmt::Debug for Proxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Proxy")
            .field("address", &self.redacted())
            .field("credentials", &self.credentials)
            .finish()
    }
}

impl std::fmt::Display for Proxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.redacted())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyHealth {
    Active,
    Failed,
}

/// Country-sharded vendor proxy template:
/// `http://{username}-country-{cc}:{password}@{host}`, one proxy per country.
#[derive(Clone, PartialEq, Eq)]
pub struct VendorTemplate {
    pub username: String,
    pub password: String,
    pub host: String,
    pub countries: Vec<String>,
}

impl std::fmt::Debug for VendorTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VendorTemplate")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .field("host", &self.host)
            .field("countries", &self.countries)
            .finish()
    }
}

impl VendorTemplate {
    #[must_use]
    pub fn proxies(&self) -> Vec<Proxy> {
        self.countries
            .iter()
            .map(|cc| {
                let username = format!("{}-country-{cc}", self.username);
                Proxy::new(format!("http://{username}:{}@{}", self.password, self.host))
                    .with_credentials(username, self.password.clone())
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub enum ProxySource {
    /// One proxy per line; see [`ProxyPool::load`].
    File(PathBuf),
    Static(Vec<Proxy>),
    Vendor(VendorTemplate),
    /// Direct egress.
    None,
}

/// The seam the fetch engine rotates through.
pub trait ProxyRotation: Send {
    /// The proxy to use for the next attempt, or `None` when there is nothing to offer.
    fn active_proxy(&mut self) -> Option<Proxy>;

    fn mark_failed(&mut self, proxy: &Proxy);
}

#[derive(Debug)]
pub struct ProxyPool {
    proxies: Vec<Proxy>,
    failed: HashSet<String>,
    current: Option<Proxy>,
    last_rotation: Option<Instant>,
    rotation_interval: Duration,
}

impl ProxyPool {
    /// Builds a pool, dropping later duplicates of the same address.
    #[must_use]
    pub fn new(proxies: Vec<Proxy>) -> Self {
        let mut seen = HashSet::new();
        let proxies = proxies
            .into_iter()
            .filter(|p| seen.insert(p.address.clone()))
            .collect();
        Self {
            proxies,
            failed: HashSet::new(),
            current: None,
            last_rotation: None,
            rotation_interval: DEFAULT_ROTATION_INTERVAL,
        }
    }

    /// Loads a pool from `source`.
    ///
    /// File lines starting with `#` and blank lines are skipped. Each other
    /// line is a JSON object `{"server", "username", "password"}`, a proxy
    /// URI, or `ip:port[:username:password]`. An unreadable file yields an
    /// empty pool.
    #[must_use]
    pub fn load(source: ProxySource) -> Self {
        let proxies = match source {
            ProxySource::File(path) => load::read_proxy_file(&path),
            ProxySource::Static(proxies) => proxies,
            ProxySource::Vendor(template) => template.proxies(),
            ProxySource::None => Vec::new(),
        };
        let pool = Self::new(proxies);
        tracing::info!(proxies = pool.len(), "proxy pool loaded");
        pool
    }

    #[must_use]
    pub fn with_rotation_interval(mut self, interval: Duration) -> Self {
        self.rotation_interval = interval;
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    #[must_use]
    pub fn proxies(&self) -> &[Proxy] {
        &self.proxies
    }

    #[must_use]
    pub fn health(&self, proxy: &Proxy) -> ProxyHealth {
        if self.failed.contains(&proxy.address) {
            ProxyHealth::Failed
        } else {
            ProxyHealth::Active
        }
    }

    /// Returns the current proxy, picking a new one when none is current or
    /// the rotation interval has elapsed.
    ///
    /// New picks are uniform over proxies not marked failed. When every proxy
    /// has failed the failed set is cleared and the pick is made over the
    /// whole pool. Returns `None` only for an empty pool.
    pub fn get_active_proxy(&mut self) -> Option<Proxy> {
        let rotation_due = match (&self.current, self.last_rotation) {
            (Some(_), Some(at)) => at.elapsed() >= self.rotation_interval,
            _ => true,
        };
        if !rotation_due {
            return self.current.clone();
        }

        let healthy: Vec<&Proxy> = self
            .proxies
            .iter()
            .filter(|p| !self.failed.contains(&p.address))
            .collect();
        let mut chosen = healthy.choose(&mut rand::rng()).map(|p| (*p).clone());

        if chosen.is_none() && !self.proxies.is_empty() {
            tracing::warn!(
                failed = self.failed.len(),
                "every proxy has failed; resetting proxy health"
            );
            self.failed.clear();
            chosen = self.proxies.choose(&mut rand::rng()).cloned();
        }

        match chosen {
            Some(proxy) => {
                tracing::debug!(proxy = %proxy, "rotated to proxy");
                self.current = Some(proxy.clone());
                self.last_rotation = Some(Instant::now());
                Some(proxy)
            }
            None => {
                tracing::warn!("proxy pool is empty");
                None
            }
        }
    }

    /// Marks `proxy` failed and clears it as current. Unknown proxies are ignored.
    pub fn mark_failed(&mut self, proxy: &Proxy) {
        if !self.proxies.iter().any(|p| p.address == proxy.address) {
            return;
        }
        self.failed.insert(proxy.address.clone());
        if self
            .current
            .as_ref()
            .is_some_and(|c| c.address == proxy.address)
        {
            self.current = None;
        }
        tracing::info!(proxy = %proxy, failed = self.failed.len(), "marked proxy failed");
    }

    /// Scrapes the public free-proxy listings in [`FREE_PROXY_SOURCES`].
    pub async fn from_free_lists(client: &reqwest::Client) -> Self {
        let proxies = scrape_free_lists(client, FREE_PROXY_SOURCES, 1_000..=3_000).await;
        let pool = Self::new(proxies);
        tracing::info!(proxies = pool.len(), "free proxy pool loaded");
        pool
    }
}

impl ProxyRotation for ProxyPool {
    fn active_proxy(&mut self) -> Option<Proxy> {
        self.get_active_proxy()
    }

    fn mark_failed(&mut self, proxy: &Proxy) {
        ProxyPool::mark_failed(self, proxy);
    }
}

#[cfg(test)]
#[path = "pool_test.rs"]
mod tests;
