//! Spreadsheet input and output for the influencer report.
//!
//! [`SheetStore`] is the seam the pipeline reads handles from and writes
//! report rows to; [`SheetsClient`] implements it over the Google Sheets v4
//! values API, authenticated with an access token or a service-account key.

pub mod auth;
pub mod client;
pub mod error;
pub mod types;

use async_trait::async_trait;

pub use auth::ServiceAccountKey;
pub use client::SheetsClient;
pub use error::SheetsError;

/// Row-oriented access to a spreadsheet range.
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Reads `range` (A1 notation, e.g. `Input!A2:B`) as rows of cell text.
    ///
    /// An empty range yields an empty list.
    async fn read_rows(&self, sheet_id: &str, range: &str) -> Result<Vec<Vec<String>>, SheetsError>;

    /// Overwrites `range` with `rows`, returning the number of cells updated.
    async fn write_rows(
        &self,
        sheet_id: &str,
        range: &str,
        rows: &[Vec<String>],
    ) -> Result<u64, SheetsError>;
}
