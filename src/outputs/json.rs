//! JSON copies of query results.
//!
//! When `--json-output-dir` is set, every completed query is also written
//! to disk, grouped by the day it ran:
//!
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     └── query_13_101502123.json
//! ```

use super::QueryReport;
use super::console::document_to_json;
use crate::queries::QueryOutput;
use chrono::Local;
use serde_json::{Value, json};
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// The JSON shape of a report.
///
/// ```json
/// { "query": 13, "title": "...", "sections": [ { "heading": "...", "documents": [ ... ] } ], "summary": null }
/// ```
pub fn report_to_json(report: &QueryReport) -> Value {
    let sections: Vec<Value> = report
        .sections
        .iter()
        .map(|section| match &section.output {
            QueryOutput::Count(n) => json!({ "heading": section.heading, "count": n }),
            QueryOutput::Documents(docs) => json!({
                "heading": section.heading,
                "documents": docs.iter().map(document_to_json).collect::<Vec<_>>(),
            }),
        })
        .collect();

    json!({
        "query": report.choice.number(),
        "title": report.choice.title(),
        "sections": sections,
        "summary": report.summary,
    })
}

/// Write `report` under `{json_output_dir}/{date}/` and return the file path.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir, query = report.choice.number()))]
pub async fn write_report(
    report: &QueryReport,
    json_output_dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(&report_to_json(report))?;

    let now = Local::now();
    let day_dir = Path::new(json_output_dir).join(now.format("%Y-%m-%d").to_string());
    if let Err(e) = fs::create_dir_all(&day_dir).await {
        error!(dir = %day_dir.display(), error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let path = day_dir.join(format!(
        "query_{:02}_{}.json",
        report.choice.number(),
        now.format("%H%M%S%3f")
    ));
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote query result");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::MenuChoice;
    use mongodb::bson::doc;

    fn sample_report() -> QueryReport {
        let mut report = QueryReport::new(MenuChoice::ProductiveReporter);
        report.push(
            "Most productive reporter:",
            QueryOutput::Documents(vec![doc! {
                "_id": { "firstname": "Constance", "middlename": "L.", "lastname": "HAYS" },
                "article_count": 37,
            }]),
        );
        report
    }

    #[test]
    fn test_report_to_json() {
        let value = report_to_json(&sample_report());

        assert_eq!(value["query"], 7);
        assert_eq!(value["title"], "Find the most productive reporter");
        assert_eq!(value["summary"], Value::Null);
        let section = &value["sections"][0];
        assert_eq!(section["heading"], "Most productive reporter:");
        assert_eq!(section["documents"][0]["_id"]["lastname"], "HAYS");
        assert_eq!(section["documents"][0]["article_count"], 37);
    }

    #[test]
    fn test_count_section_to_json() {
        let mut report = QueryReport::new(MenuChoice::OriginalArticleCount);
        report.push("Number of original articles:", QueryOutput::Count(4213));

        let value = report_to_json(&report);
        assert_eq!(value["sections"][0]["count"], 4213);
        assert!(value["sections"][0].get("documents").is_none());
    }

    #[tokio::test]
    async fn test_write_report() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().to_str().unwrap();

        let path = write_report(&sample_report(), dir).await.unwrap();

        assert!(path.starts_with(tmp.path()));
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("query_07_"));
        assert!(name.ends_with(".json"));

        let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, report_to_json(&sample_report()));
    }
}
