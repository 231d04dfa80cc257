//! Public free-proxy listings.
//!
//! Both listings serve the same HTML table layout: IP, port, code, country,
//! anonymity, google, https, last checked.

use std::ops::RangeInclusive;
use std::sync::LazyLock;
use std::time::Duration;

use rand::Rng;
use regex::Regex;

use super::Proxy;

pub const FREE_PROXY_SOURCES: &[&str] = &["https://free-proxy-list.net/", "https://www.sslproxies.org/"];

static TABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<table[^>]*>(.*?)</table>").expect("valid regex"));
static ROW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<tr[^>]*>(.*?)</tr>").expect("valid regex"));
static CELL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<td[^>]*>(.*?)</td>").expect("valid regex"));
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

const HTTPS_COLUMN: usize = 6;

/// Scrapes each listing in turn, pausing a random `pause_ms` between sources.
///
/// A source that fails to load is logged and skipped.
pub async fn scrape_free_lists(
    client: &reqwest::Client,
    sources: &[&str],
    pause_ms: RangeInclusive<u64>,
) -> Vec<Proxy> {
    let mut proxies = Vec::new();
    for (i, url) in sources.iter().enumerate() {
        if i > 0 {
            let delay = rand::rng().random_range(pause_ms.clone());
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        match fetch_listing(client, url).await {
            Ok(html) => {
                let found = parse_proxy_table(&html);
                tracing::debug!(url, found = found.len(), "scraped free proxy listing");
                proxies.extend(found);
            }
            Err(e) => tracing::warn!(url, error = %e, "free proxy listing failed"),
        }
    }
    proxies
}

async fn fetch_listing(client: &reqwest::Client, url: &str) -> Result<String, reqwest::Error> {
    client.get(url).send().await?.error_for_status()?.text().await
}

/// HTTPS-capable rows of the first table in `html`.
fn parse_proxy_table(html: &str) -> Vec<Proxy> {
    let Some(table) = TABLE_RE.captures(html).and_then(|c| c.get(1)) else {
        return Vec::new();
    };

    ROW_RE
        .captures_iter(table.as_str())
        .filter_map(|row| {
            let cells: Vec<String> = CELL_RE
                .captures_iter(row.get(1)?.as_str())
                .filter_map(|c| c.get(1))
                .map(|c| TAG_RE.replace_all(c.as_str(), "").trim().to_string())
                .collect();
            if cells.len() <= HTTPS_COLUMN || cells[HTTPS_COLUMN] != "yes" {
                return None;
            }
            Some(Proxy::new(format!("http://{}:{}", cells[0], cells[1])))
        })
        .collect()
}
