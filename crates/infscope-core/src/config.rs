use crate::app_config::{AppConfig, ProxySourceKind, VendorCredentials};
use crate::ConfigError;

const DEFAULT_VENDOR_HOST: &str = "zproxy.lum-superproxy.io:22225";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var` needed.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    // Blank values count as unset so an empty line in `.env` does not
    // masquerade as a credential.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let or_default =
        |var: &str, default: &str| -> String { optional(var).unwrap_or_else(|| default.to_string()) };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<f64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let log_level = or_default("INFSCOPE_LOG_LEVEL", "info");
    let spreadsheet_id = optional("SPREADSHEET_ID");
    let input_range = or_default("INFSCOPE_INPUT_RANGE", "Input!A2:B");
    let output_range = or_default("INFSCOPE_OUTPUT_RANGE", "Output!A1:K");
    let sheets_access_token = optional("GOOGLE_SHEETS_ACCESS_TOKEN");
    let sheets_credentials_path = optional("GOOGLE_SHEETS_CREDENTIALS").map(PathBuf::from);
    let youtube_api_key = optional("YOUTUBE_API_KEY");
    let http_timeout_secs = parse_u64("INFSCOPE_HTTP_TIMEOUT_SECS", "30")?;
    let browser_ws_endpoint = optional("INFSCOPE_BROWSER_WS_ENDPOINT");

    let vendor = match (optional("BRIGHTDATA_USERNAME"), optional("BRIGHTDATA_PASSWORD")) {
        (Some(username), Some(password)) => Some(VendorCredentials {
            username,
            password,
            host: or_default("BRIGHTDATA_HOST", DEFAULT_VENDOR_HOST),
        }),
        _ => None,
    };

    // Vendor credentials are checked when the proxy pool is built.
    let proxy_source = parse_proxy_source(&or_default("INFSCOPE_PROXY_SOURCE", "vendor"))?;

    let proxy_file = PathBuf::from(or_default("INFSCOPE_PROXY_FILE", "./proxies.txt"));
    let proxy_countries = parse_countries(&or_default("INFSCOPE_PROXY_COUNTRIES", "us,uk,ca,au"));
    let proxy_rotation_secs = parse_u64("INFSCOPE_PROXY_ROTATION_SECS", "300")?;
    let proxy_probe_url = or_default("INFSCOPE_PROXY_PROBE_URL", "https://www.instagram.com");

    let instagram_username = optional("INSTAGRAM_USERNAME");
    let instagram_password = optional("INSTAGRAM_PASSWORD");

    let fetch_max_attempts = parse_u32("INFSCOPE_FETCH_MAX_ATTEMPTS", "3")?;
    if fetch_max_attempts == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "INFSCOPE_FETCH_MAX_ATTEMPTS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    let nav_timeout_secs = parse_u64("INFSCOPE_NAV_TIMEOUT_SECS", "30")?;
    let selector_timeout_secs = parse_u64("INFSCOPE_SELECTOR_TIMEOUT_SECS", "5")?;
    let backoff_min_secs = parse_u64("INFSCOPE_BACKOFF_MIN_SECS", "5")?;
    let backoff_max_secs = parse_u64("INFSCOPE_BACKOFF_MAX_SECS", "10")?;
    if backoff_min_secs > backoff_max_secs {
        return Err(ConfigError::InvalidEnvVar {
            var: "INFSCOPE_BACKOFF_MIN_SECS".to_string(),
            reason: format!(
                "minimum backoff ({backoff_min_secs}s) exceeds maximum ({backoff_max_secs}s)"
            ),
        });
    }
    let debug_screenshot_dir = optional("INFSCOPE_DEBUG_SCREENSHOT_DIR").map(PathBuf::from);
    let reach_multiplier = parse_f64("INFSCOPE_REACH_MULTIPLIER", "2")?;

    Ok(AppConfig {
        log_level,
        spreadsheet_id,
        input_range,
        output_range,
        sheets_access_token,
        sheets_credentials_path,
        youtube_api_key,
        http_timeout_secs,
        browser_ws_endpoint,
        vendor,
        proxy_source,
        proxy_file,
        proxy_countries,
        proxy_rotation_secs,
        proxy_probe_url,
        instagram_username,
        instagram_password,
        fetch_max_attempts,
        nav_timeout_secs,
        selector_timeout_secs,
        backoff_min_secs,
        backoff_max_secs,
        debug_screenshot_dir,
        reach_multiplier,
    })
}

/// Parse a string into a `ProxySourceKind` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for unrecognized values.
fn parse_proxy_source(s: &str) -> Result<ProxySourceKind, ConfigError> {
    match s.to_ascii_lowercase().as_str() {
        "vendor" => Ok(ProxySourceKind::Vendor),
        "file" => Ok(ProxySourceKind::File),
        "free" => Ok(ProxySourceKind::Free),
        "none" => Ok(ProxySourceKind::None),
        other => Err(ConfigError::InvalidEnvVar {
            var: "INFSCOPE_PROXY_SOURCE".to_string(),
            reason: format!("unknown proxy source '{other}'; expected vendor, file, free, or none"),
        }),
    }
}

fn parse_countries(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|c| c.trim().to_ascii_lowercase())
        .filter(|c| !c.is_empty())
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
