//! Dataset creation: walk the configured phases month by month and load
//! every archive record into the store.
//!
//! One request and one bulk insert per month. A month that fails (network,
//! bad payload, database error) is logged and skipped; the walk carries on.

use crate::api::ArchiveSource;
use crate::config::Phase;
use crate::store::ArchiveSink;
use mongodb::bson::{self, Document};
use serde_json::{Map, Value};
use std::error::Error;
use tracing::{info, instrument, warn};

/// Outcome of a dataset build.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PopulateReport {
    pub months_loaded: u32,
    pub months_failed: u32,
    pub documents_inserted: u64,
    pub hits_reported: u64,
}

/// Convert one API record into a BSON document, field for field.
pub fn json_to_document(record: &Map<String, Value>) -> Result<Document, bson::ser::Error> {
    bson::to_document(record)
}

/// Fetch and store every month of every phase.
#[instrument(level = "info", skip_all, fields(phases = phases.len()))]
pub async fn create_archives_dataset<S, K>(source: &S, sink: &K, phases: &[Phase]) -> PopulateReport
where
    S: ArchiveSource,
    K: ArchiveSink,
{
    let mut report = PopulateReport::default();

    for (index, phase) in phases.iter().enumerate() {
        for year in phase.years() {
            for month in 1..=12 {
                match insert_month(source, sink, year, month).await {
                    Ok((inserted, hits)) => {
                        report.months_loaded += 1;
                        report.documents_inserted += inserted;
                        report.hits_reported += hits;
                    }
                    Err(e) => {
                        report.months_failed += 1;
                        warn!(year, month, error = %e, "Failed inserting data");
                    }
                }
            }
        }
        info!(
            phase = index + 1,
            start_year = phase.start_year,
            end_year = phase.end_year,
            "Completed data insertion for phase"
        );
    }

    info!(
        months_loaded = report.months_loaded,
        months_failed = report.months_failed,
        documents = report.documents_inserted,
        hits = report.hits_reported,
        "Dataset build finished"
    );
    report
}

/// Fetch one month and insert it. Returns `(inserted, hits)`.
async fn insert_month<S, K>(source: &S, sink: &K, year: i32, month: u32) -> Result<(u64, u64), Box<dyn Error>>
where
    S: ArchiveSource,
    K: ArchiveSink,
{
    let archive = source.fetch_month(year, month).await?;
    let docs = archive
        .docs
        .iter()
        .map(json_to_document)
        .collect::<Result<Vec<_>, _>>()?;

    let inserted = sink.insert_archives(docs).await?;
    info!(
        year,
        month,
        hits = archive.hits,
        inserted,
        "Created and inserted archives"
    );
    Ok((inserted, archive.hits))
}
