//! Wiring from [`AppConfig`] to the scraper: proxy pool, engine settings and
//! the remote browser connection.

use std::time::Duration;

use anyhow::Context;
use infscope_core::{AppConfig, ProxySourceKind};
use infscope_scraper::{
    ChromiumSession, EngineSettings, LoginCredentials, ProxyPool, ProxySource, VendorTemplate,
};
use infscope_sheets::{ServiceAccountKey, SheetsClient};

/// Builds the proxy pool for the configured source.
///
/// # Errors
///
/// Returns an error if the vendor source is selected without credentials or
/// the HTTP client for free-list scraping cannot be built.
pub(crate) async fn load_proxy_pool(config: &AppConfig) -> anyhow::Result<ProxyPool> {
    let pool = match config.proxy_source {
        ProxySourceKind::Vendor => {
            let vendor = config
                .vendor
                .as_ref()
                .context("proxy source is vendor but BRIGHTDATA credentials are not set")?;
            ProxyPool::load(ProxySource::Vendor(VendorTemplate {
                username: vendor.username.clone(),
                password: vendor.password.clone(),
                host: vendor.host.clone(),
                countries: config.proxy_countries.clone(),
            }))
        }
        ProxySourceKind::File => ProxyPool::load(ProxySource::File(config.proxy_file.clone())),
        ProxySourceKind::Free => {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(config.http_timeout_secs))
                .build()
                .context("failed to build HTTP client for free proxy lists")?;
            ProxyPool::from_free_lists(&client).await
        }
        ProxySourceKind::None => ProxyPool::load(ProxySource::None),
    };
    tracing::info!(
        source = %config.proxy_source,
        proxies = pool.len(),
        "proxy pool ready"
    );
    Ok(pool.with_rotation_interval(Duration::from_secs(config.proxy_rotation_secs)))
}

#[must_use]
pub(crate) fn engine_settings(config: &AppConfig) -> EngineSettings {
    EngineSettings {
        max_attempts: config.fetch_max_attempts,
        nav_timeout: Duration::from_secs(config.nav_timeout_secs),
        selector_timeout: Duration::from_secs(config.selector_timeout_secs),
        backoff_min: Duration::from_secs(config.backoff_min_secs),
        backoff_max: Duration::from_secs(config.backoff_max_secs),
        login: config
            .instagram_credentials()
            .map(|(username, password)| LoginCredentials { username, password }),
        screenshot_dir: config.debug_screenshot_dir.clone(),
        ..EngineSettings::default()
    }
}

/// Builds the Sheets client, preferring a service-account key file over a
/// pre-minted access token.
///
/// # Errors
///
/// Returns an error if neither credential is configured, the key file is
/// unusable, or the HTTP client cannot be built.
pub(crate) fn sheets_client(config: &AppConfig) -> anyhow::Result<SheetsClient> {
    if let Some(path) = &config.sheets_credentials_path {
        let key = ServiceAccountKey::from_file(path)
            .context("failed to load GOOGLE_SHEETS_CREDENTIALS")?;
        tracing::info!(client_email = %key.client_email, "using Sheets service account");
        return SheetsClient::with_service_account(key, config.http_timeout_secs)
            .context("failed to build Sheets client");
    }
    let token = config.sheets_access_token.as_deref().context(
        "GOOGLE_SHEETS_CREDENTIALS or GOOGLE_SHEETS_ACCESS_TOKEN must be set for `run`",
    )?;
    SheetsClient::new(token, config.http_timeout_secs).context("failed to build Sheets client")
}

/// Connects to the remote scraping browser.
///
/// # Errors
///
/// Returns an error if no endpoint can be derived from the configuration or
/// the CDP connection fails.
pub(crate) async fn connect_browser(config: &AppConfig) -> anyhow::Result<ChromiumSession> {
    let endpoint = config.browser_endpoint().context(
        "no browser endpoint: set INFSCOPE_BROWSER_WS_ENDPOINT or the BRIGHTDATA_* credentials",
    )?;
    let session = ChromiumSession::connect(&endpoint)
        .await
        .context("failed to connect to the scraping browser")?;
    tracing::info!("connected to scraping browser");
    Ok(session)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use infscope_core::build_app_config;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        build_app_config(|key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        })
        .expect("valid config")
    }

    #[tokio::test]
    async fn vendor_pool_needs_credentials() {
        let config = config_from(&[]);
        assert_eq!(config.proxy_source, ProxySourceKind::Vendor);

        let err = load_proxy_pool(&config).await.expect_err("no vendor credentials");
        assert!(err.to_string().contains("BRIGHTDATA"), "{err}");
    }

    #[tokio::test]
    async fn vendor_pool_shards_by_country() {
        let config = config_from(&[
            ("BRIGHTDATA_USERNAME", "brd-customer-1"),
            ("BRIGHTDATA_PASSWORD", "s3cret"),
            ("INFSCOPE_PROXY_COUNTRIES", "us,ca"),
        ]);
        let pool = load_proxy_pool(&config).await.expect("pool");
        assert_eq!(pool.len(), 2);
    }

    #[tokio::test]
    async fn none_source_gives_empty_pool() {
        let config = config_from(&[("INFSCOPE_PROXY_SOURCE", "none")]);
        let pool = load_proxy_pool(&config).await.expect("pool");
        assert!(pool.is_empty());
    }

    #[test]
    fn sheets_client_needs_some_credential() {
        let err = sheets_client(&config_from(&[])).expect_err("no credentials");
        assert!(err.to_string().contains("GOOGLE_SHEETS_CREDENTIALS"), "{err}");
    }

    #[test]
    fn sheets_client_from_access_token() {
        let config = config_from(&[("GOOGLE_SHEETS_ACCESS_TOKEN", "ya29.token")]);
        assert!(sheets_client(&config).is_ok());
    }

    #[test]
    fn unreadable_key_file_is_reported() {
        let config = config_from(&[
            ("GOOGLE_SHEETS_CREDENTIALS", "/nonexistent/sa.json"),
            ("GOOGLE_SHEETS_ACCESS_TOKEN", "ya29.token"),
        ]);
        let err = sheets_client(&config).expect_err("missing key file");
        assert!(format!("{err:#}").contains("/nonexistent/sa.json"), "{err:#}");
    }

    #[test]
    fn engine_settings_follow_config() {
        let config = config_from(&[
            ("INFSCOPE_FETCH_MAX_ATTEMPTS", "5"),
            ("INSTAGRAM_USERNAME", "scout"),
            ("INSTAGRAM_PASSWORD", "hunter2"),
        ]);
        let settings = engine_settings(&config);
        assert_eq!(settings.max_attempts, 5);
        assert_eq!(settings.backoff_max, Duration::from_secs(10));
        assert_eq!(settings.login.map(|l| l.username).as_deref(), Some("scout"));
    }
}
