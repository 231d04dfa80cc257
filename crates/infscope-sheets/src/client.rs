//! HTTP client for the Google Sheets v4 `values` endpoints.

use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::auth::{Credentials, ServiceAccount, ServiceAccountKey};
use crate::error::SheetsError;
use crate::types::{ErrorEnvelope, UpdateBody, UpdateResponse, ValueRange};
use crate::SheetStore;

const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/v4/";

/// Values API client authenticated with an OAuth bearer token.
pub struct SheetsClient {
    client: Client,
    credentials: Credentials,
    base_url: Url,
}

impl std::fmt::Debug for SheetsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsClient")
            .field("credentials", &self.credentials)
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl SheetsClient {
    /// Creates a client pointed at the production Sheets API.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(access_token: &str, timeout_secs: u64) -> Result<Self, SheetsError> {
        Self::with_base_url(access_token, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client that mints its own tokens from a service-account key.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError::Jwt`] if the key's private key is not an RSA
    /// PEM, or [`SheetsError::Http`] if the `reqwest::Client` cannot be built.
    pub fn with_service_account(
        key: ServiceAccountKey,
        timeout_secs: u64,
    ) -> Result<Self, SheetsError> {
        Self::with_service_account_and_base_url(key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Service-account client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// As [`SheetsClient::with_service_account`], plus
    /// [`SheetsError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_service_account_and_base_url(
        key: ServiceAccountKey,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, SheetsError> {
        let account = ServiceAccount::new(key)?;
        Self::build(
            Credentials::ServiceAccount(Box::new(account)),
            timeout_secs,
            base_url,
        )
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError::Http`] if the `reqwest::Client` cannot be
    /// constructed, or [`SheetsError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        access_token: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, SheetsError> {
        Self::build(
            Credentials::AccessToken(access_token.to_owned()),
            timeout_secs,
            base_url,
        )
    }

    fn build(
        credentials: Credentials,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, SheetsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("infscope/0.1 (influencer-report)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| SheetsError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            credentials,
            base_url,
        })
    }

    /// `{base}spreadsheets/{sheet_id}/values/{range}` with both IDs percent-encoded.
    fn values_url(&self, sheet_id: &str, range: &str) -> Result<Url, SheetsError> {
        let sheet = utf8_percent_encode(sheet_id, NON_ALPHANUMERIC);
        let range = utf8_percent_encode(range, NON_ALPHANUMERIC);
        let relative = format!("spreadsheets/{sheet}/values/{range}");
        self.base_url
            .join(&relative)
            .map_err(|e| SheetsError::InvalidBaseUrl {
                url: format!("{}{relative}", self.base_url),
                reason: e.to_string(),
            })
    }

    /// Parses a 2xx body as `T`, or maps a non-2xx status to [`SheetsError::Api`].
    async fn read_response<T: DeserializeOwned>(
        response: reqwest::Response,
        context: &str,
    ) -> Result<T, SheetsError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or(body);
            return Err(SheetsError::Api {
                status: status.as_u16(),
                message,
            });
        }
        serde_json::from_str(&body).map_err(|e| SheetsError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}

#[async_trait]
impl SheetStore for SheetsClient {
    async fn read_rows(&self, sheet_id: &str, range: &str) -> Result<Vec<Vec<String>>, SheetsError> {
        let url = self.values_url(sheet_id, range)?;
        let token = self.credentials.bearer(&self.client).await?;
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await?;
        let value_range: ValueRange =
            Self::read_response(response, &format!("values.get({range})")).await?;
        let rows = value_range.into_rows();
        tracing::info!(range, rows = rows.len(), "read sheet rows");
        Ok(rows)
    }

    async fn write_rows(
        &self,
        sheet_id: &str,
        range: &str,
        rows: &[Vec<String>],
    ) -> Result<u64, SheetsError> {
        let mut url = self.values_url(sheet_id, range)?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED");
        let body = UpdateBody {
            range,
            major_dimension: "ROWS",
            values: rows,
        };
        let token = self.credentials.bearer(&self.client).await?;
        let response = self
            .client
            .put(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        let update: UpdateResponse =
            Self::read_response(response, &format!("values.update({range})")).await?;
        tracing::info!(
            range,
            updated_range = update.updated_range.as_deref().unwrap_or(range),
            updated_rows = update.updated_rows,
            updated_cells = update.updated_cells,
            "wrote sheet rows"
        );
        Ok(update.updated_cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_url_encodes_range() {
        let client = SheetsClient::with_base_url("token", 30, "https://sheets.googleapis.com/v4")
            .expect("client");
        let url = client.values_url("abc-123", "Input!A2:B").expect("url");
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc%2D123/values/Input%21A2%3AB"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = SheetsClient::with_base_url("token", 30, "not a url").unwrap_err();
        assert!(matches!(err, SheetsError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn debug_redacts_token() {
        let client = SheetsClient::with_base_url("ya29.secret", 30, "http://127.0.0.1:1").expect("client");
        assert!(!format!("{client:?}").contains("ya29.secret"));
    }
}
