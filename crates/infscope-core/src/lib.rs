pub mod app_config;
pub mod config;
pub mod report;

pub use app_config::{AppConfig, ProxySourceKind, VendorCredentials};
pub use config::{build_app_config, load_app_config, load_app_config_from_env};
pub use report::{
    header_cells, InfluencerRow, Platform, ReportRow, NOT_AVAILABLE, PLACEHOLDER, REPORT_HEADERS,
    UNKNOWN,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
