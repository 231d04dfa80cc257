//! Single-handle commands: `instagram <handle>` and `youtube <handle>`.

use anyhow::Context;
use infscope_core::AppConfig;
use infscope_scraper::{BrowserSession, FetchEngine};
use infscope_youtube::YoutubeClient;

use crate::session;

/// Fetches one Instagram profile through the browser and prints it as JSON.
///
/// # Errors
///
/// Returns an error if the browser cannot be reached, the first context
/// cannot be created, or every attempt fails.
pub(crate) async fn run_instagram(config: &AppConfig, handle: &str) -> anyhow::Result<()> {
    let handle = handle.trim().trim_start_matches('@');
    let browser = session::connect_browser(config).await?;
    let pool = session::load_proxy_pool(config).await?;
    let mut engine = FetchEngine::new(&browser, pool, session::engine_settings(config));

    let result = async {
        engine.bootstrap().await?;
        let record = engine
            .fetch(handle)
            .await
            .ok_or_else(|| anyhow::anyhow!("no profile data collected for {handle}"))?;
        println!("{}", serde_json::to_string_pretty(&record)?);
        anyhow::Ok(())
    }
    .await;

    engine.shutdown().await;
    if let Err(e) = browser.close().await {
        tracing::warn!(error = %e, "browser close failed");
    }
    result
}

/// Fetches one YouTube channel and prints it as JSON.
///
/// # Errors
///
/// Returns an error if no API key is configured, the request fails, or no
/// channel matches `handle`.
pub(crate) async fn run_youtube(config: &AppConfig, handle: &str) -> anyhow::Result<()> {
    let api_key = config
        .youtube_api_key
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("YOUTUBE_API_KEY is not set; cannot fetch channels"))?;
    let client = YoutubeClient::new(api_key, config.http_timeout_secs)
        .context("failed to build YouTube client")?;

    let channel = client
        .fetch_channel(handle.trim())
        .await?
        .ok_or_else(|| anyhow::anyhow!("no YouTube channel found for {handle}"))?;
    println!("{}", serde_json::to_string_pretty(&channel)?);
    Ok(())
}
