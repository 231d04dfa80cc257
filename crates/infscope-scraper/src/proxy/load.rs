use std::path::Path;

use serde::Deserialize;

use super::Proxy;

#[derive(Debug, Deserialize)]
struct ProxyFileEntry {
    server: String,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

pub(super) fn read_proxy_file(path: &Path) -> Vec<Proxy> {
    match std::fs::read_to_string(path) {
        Ok(contents) => contents.lines().filter_map(parse_proxy_line).collect(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not read proxy file");
            Vec::new()
        }
    }
}

/// Parses one proxy-file line. Comments, blanks and malformed lines yield `None`.
pub(super) fn parse_proxy_line(line: &str) -> Option<Proxy> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    if line.starts_with('{') {
        if let Ok(entry) = serde_json::from_str::<ProxyFileEntry>(line) {
            let proxy = Proxy::new(entry.server);
            return Some(match (entry.username, entry.password) {
                (Some(u), Some(p)) => proxy.with_credentials(u, p),
                _ => proxy,
            });
        }
    }

    if line.contains("://") {
        return Some(Proxy::new(line));
    }

    let parts: Vec<&str> = line.split(':').map(str::trim).collect();
    if parts.len() < 2 || parts[0].is_empty() || parts[1].is_empty() {
        tracing::debug!(line, "skipping malformed proxy line");
        return None;
    }
    let proxy = Proxy::new(format!("http://{}:{}", parts[0], parts[1]));
    Some(match (parts.get(2), parts.get(3)) {
        (Some(u), Some(p)) if !u.is_empty() => proxy.with_credentials(*u, *p),
        _ => proxy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_and_blanks_are_skipped() {
        assert!(parse_proxy_line("# office proxies").is_none());
        assert!(parse_proxy_line("   ").is_none());
    }

    #[test]
    fn colon_format_with_credentials() {
        let proxy = parse_proxy_line("10.0.0.7:3128:scout:pw").unwrap();
        assert_eq!(proxy.address, "http://10.0.0.7:3128");
        assert_eq!(proxy.auth(), Some(("scout".to_string(), "pw".to_string())));
    }

    #[test]
    fn colon_format_without_credentials() {
        let proxy = parse_proxy_line("10.0.0.8:8080").unwrap();
        assert_eq!(proxy.address, "http://10.0.0.8:8080");
        assert!(proxy.credentials.is_none());
    }

    #[test]
    fn json_line() {
        let proxy = parse_proxy_line(
            r#"{"server": "http://proxy.example:9000", "username": "u", "password": "p"}"#,
        )
        .unwrap();
        assert_eq!(proxy.address, "http://proxy.example:9000");
        assert_eq!(proxy.auth(), Some(("u".to_string(), "p".to_string())));
    }

    #[test]
    fn uri_line_is_kept_verbatim() {
        let proxy = parse_proxy_line("socks5://127.0.0.1:1080").unwrap();
        assert_eq!(proxy.address, "socks5://127.0.0.1:1080");
    }

    #[test]
    fn single_token_is_rejected() {
        assert!(parse_proxy_line("localhost").is_none());
    }

    #[test]
    fn missing_file_yields_empty_list() {
        let proxies = read_proxy_file(Path::new("/nonexistent/infscope/proxies.txt"));
        assert!(proxies.is_empty());
    }
}
