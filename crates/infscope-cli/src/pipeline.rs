//! The `run` command: input sheet to report sheet.

use anyhow::Context;
use async_trait::async_trait;
use infscope_core::{header_cells, AppConfig, InfluencerRow, Platform, ReportRow};
use infscope_metrics::MetricsSettings;
use infscope_scraper::{BrowserSession, FetchEngine, ProfileRecord, ProxyRotation};
use infscope_sheets::SheetStore;
use infscope_youtube::{ChannelRecord, YoutubeClient};

use crate::report;
use crate::session;

/// Where profile and channel data come from, one handle at a time.
#[async_trait(?Send)]
pub(crate) trait ProfileSources {
    async fn instagram(&mut self, handle: &str) -> Option<ProfileRecord>;

    async fn youtube(&mut self, handle: &str) -> Option<ChannelRecord>;
}

/// Browser-backed Instagram fetches and API-backed YouTube fetches.
pub(crate) struct LiveSources<'e, 's, R: ProxyRotation> {
    pub engine: &'e mut FetchEngine<'s, R>,
    /// `None` when no API key is configured; YouTube rows are then skipped.
    pub youtube: Option<YoutubeClient>,
}

#[async_trait(?Send)]
impl<R: ProxyRotation> ProfileSources for LiveSources<'_, '_, R> {
    async fn instagram(&mut self, handle: &str) -> Option<ProfileRecord> {
        self.engine.fetch(handle).await
    }

    async fn youtube(&mut self, handle: &str) -> Option<ChannelRecord> {
        let Some(client) = &self.youtube else {
            tracing::warn!(handle, "YOUTUBE_API_KEY not set; skipping YouTube handle");
            return None;
        };
        match client.fetch_channel(handle).await {
            Ok(channel) => channel,
            Err(e) => {
                tracing::warn!(handle, error = %e, "YouTube fetch failed; skipping handle");
                None
            }
        }
    }
}

/// Sheet locations for one run.
#[derive(Debug, Clone)]
pub(crate) struct SheetJob {
    pub spreadsheet_id: String,
    pub input_range: String,
    pub output_range: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct RunSummary {
    pub influencers: usize,
    pub reported: usize,
    pub cells_updated: u64,
}

/// Reads the input range, collects each influencer and writes the report.
///
/// The header row is always written. Rows that cannot be read or collected
/// are logged and left out; a sheet read or write failure degrades to an
/// empty input or zero cells updated.
pub(crate) async fn process_influencers(
    store: &dyn SheetStore,
    sources: &mut dyn ProfileSources,
    job: &SheetJob,
    metrics: &MetricsSettings,
) -> RunSummary {
    let raw_rows = match store.read_rows(&job.spreadsheet_id, &job.input_range).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!(range = %job.input_range, error = %e, "failed to read input sheet");
            Vec::new()
        }
    };

    let influencers: Vec<InfluencerRow> = raw_rows
        .iter()
        .enumerate()
        .filter_map(|(i, cells)| {
            let row = InfluencerRow::from_cells(cells);
            if row.is_none() {
                tracing::debug!(row = i + 1, ?cells, "skipping unusable input row");
            }
            row
        })
        .collect();
    let total = influencers.len();
    tracing::info!(influencers = total, "influencers to process");

    let mut report_rows: Vec<ReportRow> = Vec::with_capacity(total);
    for (i, influencer) in influencers.iter().enumerate() {
        let handle = influencer.handle.as_str();
        tracing::info!(
            index = i + 1,
            total,
            platform = %influencer.platform,
            handle,
            "processing influencer"
        );
        let row = match influencer.platform {
            Platform::Instagram => sources
                .instagram(handle)
                .await
                .map(|record| report::instagram_row(handle, &record, metrics)),
            Platform::Youtube => sources
                .youtube(handle)
                .await
                .map(|channel| report::youtube_row(handle, &channel, metrics)),
        };
        match row {
            Some(row) => report_rows.push(row),
            None => tracing::warn!(platform = %influencer.platform, handle, "no data collected"),
        }
    }

    let reported = report_rows.len();
    let mut cells = Vec::with_capacity(reported + 1);
    cells.push(header_cells());
    cells.extend(report_rows.into_iter().map(ReportRow::into_cells));

    let cells_updated = match store
        .write_rows(&job.spreadsheet_id, &job.output_range, &cells)
        .await
    {
        Ok(n) => n,
        Err(e) => {
            tracing::error!(range = %job.output_range, error = %e, "failed to write report sheet");
            0
        }
    };

    RunSummary {
        influencers: total,
        reported,
        cells_updated,
    }
}

/// Entry point for `infscope run`.
///
/// # Errors
///
/// Returns an error when required configuration is missing, the browser
/// cannot be reached, or the first browser context cannot be created.
pub(crate) async fn run(config: &AppConfig) -> anyhow::Result<()> {
    let job = SheetJob {
        spreadsheet_id: config
            .spreadsheet_id
            .clone()
            .context("SPREADSHEET_ID must be set for `run`")?,
        input_range: config.input_range.clone(),
        output_range: config.output_range.clone(),
    };
    let store = session::sheets_client(config)?;
    let youtube = match config.youtube_api_key.as_deref() {
        Some(key) => Some(
            YoutubeClient::new(key, config.http_timeout_secs)
                .context("failed to build YouTube client")?,
        ),
        None => None,
    };
    let metrics = MetricsSettings::default().with_reach_multiplier(config.reach_multiplier);

    let browser = session::connect_browser(config).await?;
    let pool = session::load_proxy_pool(config).await?;
    let mut engine = FetchEngine::new(&browser, pool, session::engine_settings(config));

    let result = async {
        engine.bootstrap().await?;
        match engine.check_connectivity().await {
            Ok(true) => {}
            Ok(false) => tracing::warn!("landing page did not load cleanly; continuing"),
            Err(e) => tracing::warn!(error = %e, "connectivity check failed; continuing"),
        }

        let mut sources = LiveSources {
            engine: &mut engine,
            youtube,
        };
        let summary = process_influencers(&store, &mut sources, &job, &metrics).await;
        println!(
            "processed {} influencers, reported {}, {} cells updated",
            summary.influencers, summary.reported, summary.cells_updated
        );
        anyhow::Ok(())
    }
    .await;

    engine.shutdown().await;
    if let Err(e) = browser.close().await {
        tracing::warn!(error = %e, "browser close failed");
    }
    result
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
