//! Metrics aggregation for scraped influencer profiles.
//!
//! Pure transforms from raw extracted records (post and video view strings,
//! captions, bios) to the summary values written to the report: average and
//! branded views, estimated reach, content language and location.

pub mod branded;
pub mod format;
pub mod language;
pub mod location;
pub mod settings;
pub mod views;

pub use branded::{branded_average_views, branded_subset, is_branded};
pub use format::format_count;
pub use language::{detect_language, LanguageHint};
pub use location::extract_location;
pub use settings::{MetricsSettings, DEFAULT_BRANDED_KEYWORDS, DEFAULT_REACH_MULTIPLIER};
pub use views::{average_views, estimated_reach, parse_count};
