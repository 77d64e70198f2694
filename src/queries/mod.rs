//! Canned queries against the archive collection.
//!
//! Every query is a pure function that returns a [`QuerySpec`]: a filter or
//! aggregation pipeline the database executes server side. Nothing here
//! touches the network; [`crate::store`] runs the specs.
//!
//! # Submodules
//!
//! - [`find`]: Filter queries over individual articles (#3, #4, #5, #6, #8, #9, #10, #15)
//! - [`aggregate`]: Grouping pipelines (#1, #2, #7, #11, #12, #13, #14)
//!
//! # Text matching
//!
//! Free text typed by the user becomes a case-insensitive "contains" pattern
//! (see [`contains_pattern`]). Words are escaped individually and may be
//! separated by anything in the stored text.

pub mod aggregate;
pub mod find;

use itertools::Itertools;
use mongodb::bson::{Bson, Document, doc};

/// A declarative query, ready to hand to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum QuerySpec {
    /// `find(filter).sort(sort).limit(limit)`
    Find {
        filter: Document,
        sort: Option<Document>,
        limit: Option<i64>,
    },
    /// `aggregate(pipeline)`
    Aggregate { pipeline: Vec<Document> },
    /// `count_documents(filter)`
    Count { filter: Document },
}

impl QuerySpec {
    pub fn find(filter: Document) -> Self {
        Self::Find {
            filter,
            sort: None,
            limit: None,
        }
    }

    pub fn aggregate(pipeline: Vec<Document>) -> Self {
        Self::Aggregate { pipeline }
    }
}

/// What the store returned for a [`QuerySpec`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    Documents(Vec<Document>),
    Count(u64),
}

impl QueryOutput {
    /// The first document, for queries that pick a single winner.
    pub fn first(&self) -> Option<&Document> {
        match self {
            Self::Documents(docs) => docs.first(),
            Self::Count(_) => None,
        }
    }
}

/// Turn free text into a "contains these words in order" pattern.
///
/// `"of the need"` becomes `.*of.*the.*need.*`. Regex metacharacters typed
/// by the user are escaped.
pub fn contains_pattern(text: &str) -> String {
    let words = text.split_whitespace().map(regex::escape).join(".*");
    format!(".*{words}.*")
}

/// `{ $regex: pattern, $options: "i" }`
pub fn case_insensitive(pattern: impl Into<String>) -> Document {
    doc! { "$regex": pattern.into(), "$options": "i" }
}

/// `{ $regex: ".+" }`: the field is present and not empty.
pub fn non_empty() -> Document {
    doc! { "$regex": ".+" }
}

/// Read an integer counter out of an aggregation row.
///
/// `$sum` yields `Int32` or `Int64` depending on magnitude.
pub fn count_field(doc: &Document, key: &str) -> Option<i64> {
    match doc.get(key)? {
        Bson::Int32(n) => Some(i64::from(*n)),
        Bson::Int64(n) => Some(*n),
        Bson::Double(n) => Some(*n as i64),
        _ => None,
    }
}
