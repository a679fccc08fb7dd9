//! Venue catalog from Google Sheets: the Sheets API with a service account, or the
//! public CSV export when no credentials are configured.

use crate::domain::model::Venue;
use crate::domain::ports::VenueSource;
use crate::utils::error::{BotError, Result};
use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;
use std::time::Duration;
use url::Url;

pub const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com";
pub const DEFAULT_DOCS_BASE: &str = "https://docs.google.com";
pub const DEFAULT_RANGE: &str = "A:Z";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const SCOPES: &str = "https://www.googleapis.com/auth/spreadsheets.readonly \
https://www.googleapis.com/auth/drive.readonly";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: i64 = 3600;

fn spreadsheet_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"/spreadsheets/d/([a-zA-Z0-9_-]+)").expect("valid spreadsheet id regex")
    })
}

pub fn spreadsheet_id(sheet_url: &str) -> Result<String> {
    spreadsheet_id_pattern()
        .captures(sheet_url)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| BotError::InvalidConfigValueError {
            field: "sheet.url".to_string(),
            value: sheet_url.to_string(),
            reason: "expected a link like https://docs.google.com/spreadsheets/d/<id>/...".to_string(),
        })
}

/// Turns a header row plus data rows into venues.
///
/// Short rows are padded with empty cells, fully empty rows are skipped and
/// columns with a blank header are dropped. Two columns with the same header
/// are rejected, since a venue keeps one value per header.
pub fn rows_to_venues(rows: Vec<Vec<String>>) -> Result<Vec<Venue>> {
    let mut rows = rows.into_iter();
    let headers: Vec<String> = rows
        .next()
        .ok_or_else(|| BotError::CatalogError {
            message: "the sheet has no header row".to_string(),
        })?
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut seen = HashSet::new();
    if let Some(duplicate) = headers
        .iter()
        .filter(|h| !h.is_empty())
        .find(|h| !seen.insert(h.as_str()))
    {
        return Err(BotError::CatalogError {
            message: format!("the header row has a duplicate column '{}'", duplicate),
        });
    }

    let venues = rows
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
        .map(|row| {
            let mut cells = row.into_iter();
            Venue::from_pairs(headers.iter().filter_map(|header| {
                let cell = cells.next().unwrap_or_default();
                (!header.is_empty()).then(|| (header.clone(), cell))
            }))
        })
        .collect();

    Ok(venues)
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl ServiceAccountKey {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    fn signed_assertion(&self) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            iss: &self.client_email,
            scope: SCOPES,
            aud: &self.token_uri,
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
        };
        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())?;
        Ok(jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)?)
    }

    /// Exchanges a signed JWT for a short-lived OAuth access token.
    pub async fn access_token(&self, client: &Client, timeout: Duration) -> Result<String> {
        let assertion = self.signed_assertion()?;
        let response = client
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BotError::UpstreamError {
                service: "Google OAuth".to_string(),
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Reads the first worksheet through the Sheets v4 values endpoint.
pub struct SheetsApiSource {
    client: Client,
    api_base: String,
    spreadsheet_id: String,
    range: String,
    key: ServiceAccountKey,
    timeout: Duration,
}

impl SheetsApiSource {
    pub fn new(
        api_base: impl Into<String>,
        sheet_url: &str,
        range: impl Into<String>,
        key: ServiceAccountKey,
    ) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            spreadsheet_id: spreadsheet_id(sheet_url)?,
            range: range.into(),
            key,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// Applies to the token exchange and the values request separately.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn values_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.api_base).map_err(|e| BotError::InvalidConfigValueError {
            field: "sheet.sheets_api_base".to_string(),
            value: self.api_base.clone(),
            reason: e.to_string(),
        })?;
        url.path_segments_mut()
            .map_err(|_| BotError::InvalidConfigValueError {
                field: "sheet.sheets_api_base".to_string(),
                value: self.api_base.clone(),
                reason: "cannot be used as a base URL".to_string(),
            })?
            .pop_if_empty()
            .extend([
                "v4",
                "spreadsheets",
                self.spreadsheet_id.as_str(),
                "values",
                self.range.as_str(),
            ]);
        Ok(url)
    }
}

#[async_trait]
impl VenueSource for SheetsApiSource {
    async fn fetch(&self) -> Result<Vec<Venue>> {
        let token = self.key.access_token(&self.client, self.timeout).await?;
        let response = self
            .client
            .get(self.values_url()?)
            .bearer_auth(token)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BotError::UpstreamError {
                service: "Google Sheets".to_string(),
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let range: ValueRange = response.json().await?;
        let rows = range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect();
        rows_to_venues(rows)
    }

    fn describe(&self) -> String {
        format!("Google Sheets API (spreadsheet {})", self.spreadsheet_id)
    }
}

/// Reads a link-shared sheet through its CSV export; needs no credentials.
pub struct CsvExportSource {
    client: Client,
    docs_base: String,
    spreadsheet_id: String,
    timeout: Duration,
}

impl CsvExportSource {
    pub fn new(docs_base: impl Into<String>, sheet_url: &str) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            docs_base: docs_base.into().trim_end_matches('/').to_string(),
            spreadsheet_id: spreadsheet_id(sheet_url)?,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn export_url(&self) -> String {
        format!(
            "{}/spreadsheets/d/{}/export?format=csv",
            self.docs_base, self.spreadsheet_id
        )
    }
}

pub fn parse_csv(data: &[u8]) -> Result<Vec<Venue>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    rows_to_venues(rows)
}

#[async_trait]
impl VenueSource for CsvExportSource {
    async fn fetch(&self) -> Result<Vec<Venue>> {
        let response = self
            .client
            .get(self.export_url())
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BotError::UpstreamError {
                service: "Google Sheets CSV export".to_string(),
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let bytes = response.bytes().await?;
        parse_csv(&bytes)
    }

    fn describe(&self) -> String {
        format!("public CSV export (spreadsheet {})", self.spreadsheet_id)
    }
}
