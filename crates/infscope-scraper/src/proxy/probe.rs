use std::time::Duration;

use super::Proxy;

pub const DEFAULT_PROBE_URL: &str = "https://www.instagram.com";
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Pre-flight check: `true` iff a GET to `probe_url` through `proxy` answers 200.
///
/// Certificate verification is disabled; intercepting proxies commonly
/// re-sign TLS traffic.
pub async fn probe(proxy: &Proxy, probe_url: &str) -> bool {
    match probe_status(proxy, probe_url).await {
        Ok(status) => {
            let ok = status == 200;
            tracing::info!(proxy = %proxy, status, ok, "proxy probe finished");
            ok
        }
        Err(e) => {
            tracing::warn!(proxy = %proxy, error = %e, "proxy probe failed");
            false
        }
    }
}

async fn probe_status(proxy: &Proxy, probe_url: &str) -> Result<u16, reqwest::Error> {
    let mut upstream = reqwest::Proxy::all(proxy.server())?;
    if let Some((username, password)) = proxy.auth() {
        upstream = upstream.basic_auth(&username, &password);
    }
    let client = reqwest::Client::builder()
        .proxy(upstream)
        .timeout(PROBE_TIMEOUT)
        .danger_accept_invalid_certs(true)
        .build()?;
    let response = client.get(probe_url).send().await?;
    Ok(response.status().as_u16())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn proxy_answering_200_passes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let proxy = Proxy::new(server.uri());
        assert!(probe(&proxy, "http://probe.invalid/").await);
    }

    #[tokio::test]
    async fn non_200_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let proxy = Proxy::new(server.uri());
        assert!(!probe(&proxy, "http://probe.invalid/").await);
    }

    #[tokio::test]
    async fn unreachable_proxy_fails() {
        let proxy = Proxy::new("http://127.0.0.1:1");
        assert!(!probe(&proxy, "http://probe.invalid/").await);
    }
}
