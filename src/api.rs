//! NYT Archive API client.
//!
//! The Archive API returns every article the Times published in a given
//! month as one JSON payload:
//!
//! ```text
//! GET {base}archive/v1/{year}/{month}.json?api-key={key}
//! ```
//!
//! # Architecture
//!
//! - [`ArchiveSource`]: Trait for anything that can hand back one month of records
//! - [`NytArchiveClient`]: The HTTP implementation, built on a shared `reqwest::Client`
//! - [`parse_archive`]: Pure envelope parsing, kept separate so it can be tested offline
//!
//! Requests are made once. A failed month is reported to the caller, which
//! decides whether to carry on.

use crate::models::{ArchiveMonth, ArchiveResponse};
use crate::utils::{redact_api_key, truncate_for_log};
use serde_json::Value;
use std::error::Error;
use std::time::Instant;
use thiserror::Error as ThisError;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Errors specific to the Archive API.
#[derive(Debug, ThisError)]
pub enum ArchiveError {
    #[error("archive API returned HTTP {status} for {year}-{month:02}")]
    Status { status: u16, year: i32, month: u32 },

    #[error("archive response is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("archive response has no `response.docs` list")]
    MissingDocs,

    #[error("archive record #{index} is not a JSON object")]
    NotAnObject { index: usize },

    #[error("month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),
}

/// Anything that can supply one month of archive records.
pub trait ArchiveSource {
    /// Fetch all records published in `year`/`month`.
    async fn fetch_month(&self, year: i32, month: u32) -> Result<ArchiveMonth, Box<dyn Error>>;
}

/// Build the archive-by-month URL.
///
/// A trailing `/` is added to `base` when missing so the archive path is
/// appended rather than replacing the last segment.
pub fn archive_url(base: &str, year: i32, month: u32, api_key: &str) -> Result<Url, Box<dyn Error>> {
    if !(1..=12).contains(&month) {
        return Err(ArchiveError::InvalidMonth(month).into());
    }

    let base = if base.ends_with('/') {
        Url::parse(base)?
    } else {
        Url::parse(&format!("{base}/"))?
    };
    let mut url = base.join(&format!("archive/v1/{year}/{month}.json"))?;
    url.query_pairs_mut().append_pair("api-key", api_key);
    Ok(url)
}

/// Parse an Archive API body into an [`ArchiveMonth`].
///
/// Records are kept as the raw JSON objects the API sent. When `meta.hits`
/// is absent the hit count falls back to the number of records.
pub fn parse_archive(year: i32, month: u32, body: &str) -> Result<ArchiveMonth, ArchiveError> {
    let envelope: ArchiveResponse = serde_json::from_str(body)?;
    let raw_docs = envelope.response.docs.ok_or(ArchiveError::MissingDocs)?;

    let docs = raw_docs
        .into_iter()
        .enumerate()
        .map(|(index, doc)| match doc {
            Value::Object(map) => Ok(map),
            _ => Err(ArchiveError::NotAnObject { index }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let hits = envelope
        .response
        .meta
        .and_then(|m| m.hits)
        .unwrap_or(docs.len() as u64);

    Ok(ArchiveMonth {
        year,
        month,
        docs,
        hits,
    })
}

/// HTTP client for the NYT Archive API.
#[derive(Debug, Clone)]
pub struct NytArchiveClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl NytArchiveClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

impl ArchiveSource for NytArchiveClient {
    #[instrument(level = "info", skip(self))]
    async fn fetch_month(&self, year: i32, month: u32) -> Result<ArchiveMonth, Box<dyn Error>> {
        let url = archive_url(&self.base_url, year, month, &self.api_key)?;
        let t0 = Instant::now();
        debug!(url = %redact_api_key(&url), "Requesting archive");

        let response = self.http.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(
                status = status.as_u16(),
                body_preview = %truncate_for_log(&body, 200),
                "Archive API returned an error status"
            );
            return Err(ArchiveError::Status {
                status: status.as_u16(),
                year,
                month,
            }
            .into());
        }

        let archive = match parse_archive(year, month, &body) {
            Ok(archive) => archive,
            Err(e) => {
                warn!(
                    error = %e,
                    body_preview = %truncate_for_log(&body, 300),
                    "Archive response did not match the expected shape"
                );
                return Err(e.into());
            }
        };

        info!(
            docs = archive.docs.len(),
            hits = archive.hits,
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched archive month"
        );
        Ok(archive)
    }
}
