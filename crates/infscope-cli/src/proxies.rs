//! The `proxies` command: list, and optionally probe, the configured pool.

use infscope_core::AppConfig;
use infscope_scraper::proxy;

use crate::session;

/// # Errors
///
/// Returns an error if the pool cannot be built from the configuration.
pub(crate) async fn run_proxies(config: &AppConfig, probe: bool) -> anyhow::Result<()> {
    let pool = session::load_proxy_pool(config).await?;
    println!("{} proxies from {} source", pool.len(), config.proxy_source);

    let mut healthy = 0_usize;
    for p in pool.proxies() {
        if probe {
            let ok = proxy::probe(p, &config.proxy_probe_url).await;
            if ok {
                healthy += 1;
            }
            println!("{}\t{}", if ok { "ok" } else { "failed" }, p.redacted());
        } else {
            println!("{}", p.redacted());
        }
    }

    if probe {
        println!(
            "{healthy}/{} proxies reached {}",
            pool.len(),
            config.proxy_probe_url
        );
    }
    Ok(())
}
