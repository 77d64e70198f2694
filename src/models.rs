//! Data models for archive records and the values the menu collects.
//!
//! This module defines the core data structures used throughout the application:
//! - [`ArchiveResponse`]: The JSON envelope returned by the Archive API
//! - [`ArchiveMonth`]: One month of archive records ready to be stored
//! - [`ReporterName`] and [`DateRange`]: Parameters typed in at the menu
//!
//! Article records themselves are never modelled field by field. They are
//! kept as opaque JSON objects and stored exactly as the API returned them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The top-level envelope of an Archive API response.
///
/// ```json
/// { "response": { "docs": [ ... ], "meta": { "hits": 8153 } } }
/// ```
#[derive(Debug, Deserialize, Serialize)]
pub struct ArchiveResponse {
    pub response: ArchiveBody,
}

/// The `response` object of an Archive API payload.
#[derive(Debug, Deserialize, Serialize)]
pub struct ArchiveBody {
    /// The article records. `None` when the API left the key out.
    pub docs: Option<Vec<Value>>,
    /// Paging metadata; only `hits` is read.
    #[serde(default)]
    pub meta: Option<ArchiveMeta>,
}

/// Metadata attached to an archive response.
#[derive(Debug, Deserialize, Serialize)]
pub struct ArchiveMeta {
    /// Number of records the API reports for the month.
    pub hits: Option<u64>,
}

/// One month of archive records.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveMonth {
    pub year: i32,
    pub month: u32,
    /// Article records, each a JSON object passed through untouched.
    pub docs: Vec<Map<String, Value>>,
    /// Hit count reported by the API (falls back to `docs.len()`).
    pub hits: u64,
}

/// A reporter's name as typed at the prompt.
///
/// A missing middle name matches any middle name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReporterName {
    pub first: String,
    pub middle: Option<String>,
    pub last: String,
}

/// An open date interval used against `pub_date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub begin: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// `begin` formatted as `yyyy-mm-dd`.
    pub fn begin_str(&self) -> String {
        self.begin.format("%Y-%m-%d").to_string()
    }

    /// `end` formatted as `yyyy-mm-dd`.
    pub fn end_str(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}
