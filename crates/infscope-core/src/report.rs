//! Spreadsheet row shapes shared by the orchestration layer and the sheet client.

use serde::{Deserialize, Serialize};

/// Rendered value for a metric that could not be computed.
pub const NOT_AVAILABLE: &str = "N/A";
/// Rendered value for a text field that could not be determined.
pub const UNKNOWN: &str = "Unknown";
/// Demographic estimates are not computed; these columns always carry this value.
pub const PLACEHOLDER: &str = "TBD";

/// Header row of the output sheet, in column order.
pub const REPORT_HEADERS: [&str; 11] = [
    "Platform",
    "Handle",
    "Followers/Subscribers",
    "Location",
    "Content Language",
    "Avg Views (15)",
    "Avg Reach (15)",
    "Avg Views (Branded)",
    "Est. Gender Split",
    "Est. State Split",
    "Est. Age Split",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    Youtube,
}

impl Platform {
    /// Case-insensitive match against the platform column of an input row.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "instagram" => Some(Platform::Instagram),
            "youtube" => Some(Platform::Youtube),
            _ => None,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Instagram => write!(f, "Instagram"),
            Platform::Youtube => write!(f, "YouTube"),
        }
    }
}

/// One `(platform, handle)` pair read from the input sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfluencerRow {
    pub platform: Platform,
    pub handle: String,
}

impl InfluencerRow {
    /// Builds a row from raw sheet cells.
    ///
    /// Returns `None` when the row is short, the handle is blank, or the
    /// platform is not one we collect for.
    #[must_use]
    pub fn from_cells(cells: &[String]) -> Option<Self> {
        let platform = Platform::parse(cells.first()?)?;
        let handle = cells.get(1)?.trim();
        if handle.is_empty() {
            return None;
        }
        Some(Self {
            platform,
            handle: handle.trim_start_matches('@').to_string(),
        })
    }
}

/// One output row, already rendered to display strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub platform: Platform,
    pub handle: String,
    pub audience: String,
    pub location: String,
    pub language: String,
    pub avg_views: String,
    pub avg_reach: String,
    pub avg_branded_views: String,
}

impl ReportRow {
    /// Cells in [`REPORT_HEADERS`] order, with the demographic placeholders appended.
    #[must_use]
    pub fn into_cells(self) -> Vec<String> {
        vec![
            self.platform.to_string(),
            self.handle,
            self.audience,
            self.location,
            self.language,
            self.avg_views,
            self.avg_reach,
            self.avg_branded_views,
            PLACEHOLDER.to_string(),
            PLACEHOLDER.to_string(),
            PLACEHOLDER.to_string(),
        ]
    }
}

/// The header row as owned cells.
#[must_use]
pub fn header_cells() -> Vec<String> {
    REPORT_HEADERS.iter().map(|h| (*h).to_string()).collect()
}
