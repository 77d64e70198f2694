//! Output generation for query results.
//!
//! # Submodules
//!
//! - [`console`]: Prints a [`QueryReport`] to the terminal
//! - [`json`]: Writes a [`QueryReport`] to a JSON file for later use
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     ├── query_07_101502123.json
//!     └── query_14_101733870.json
//! ```

pub mod console;
pub mod json;

use crate::menu::MenuChoice;
use crate::queries::QueryOutput;

/// Everything one menu query produced.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryReport {
    pub choice: MenuChoice,
    pub sections: Vec<ReportSection>,
    /// A one-line answer printed after the sections, when the query has one.
    pub summary: Option<String>,
}

/// One titled block of results.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSection {
    pub heading: String,
    pub output: QueryOutput,
}

impl QueryReport {
    pub fn new(choice: MenuChoice) -> Self {
        Self {
            choice,
            sections: Vec::new(),
            summary: None,
        }
    }

    pub fn push(&mut self, heading: impl Into<String>, output: QueryOutput) {
        self.sections.push(ReportSection {
            heading: heading.into(),
            output,
        });
    }
}
