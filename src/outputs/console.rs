//! Terminal rendering of query results.
//!
//! Documents are printed as pretty relaxed Extended JSON, so strings,
//! numbers and nested objects read the way they were stored.

use super::QueryReport;
use crate::queries::QueryOutput;
use mongodb::bson::{Bson, Document};
use serde_json::Value;
use std::io::{self, Write};

/// A BSON document as relaxed Extended JSON.
pub fn document_to_json(doc: &Document) -> Value {
    Bson::Document(doc.clone()).into_relaxed_extjson()
}

fn pretty(doc: &Document) -> String {
    serde_json::to_string_pretty(&document_to_json(doc)).unwrap_or_else(|_| doc.to_string())
}

/// Print every section of `report`, then its summary.
pub fn render_report<W: Write>(report: &QueryReport, out: &mut W) -> io::Result<()> {
    for section in &report.sections {
        writeln!(out, "{}", section.heading)?;
        match &section.output {
            QueryOutput::Count(n) => writeln!(out, "{n}")?,
            QueryOutput::Documents(docs) if docs.is_empty() => writeln!(out, "(no result)")?,
            QueryOutput::Documents(docs) => {
                for doc in docs {
                    writeln!(out, "{}", pretty(doc))?;
                }
            }
        }
    }
    if let Some(summary) = &report.summary {
        writeln!(out, "{summary}")?;
    }
    Ok(())
}
