//! MongoDB access: bulk loading and query execution.
//!
//! Two traits sit at the seam so the rest of the crate never names the driver:
//!
//! - [`ArchiveSink`]: where fetched records are bulk inserted
//! - [`QueryRunner`]: where [`QuerySpec`]s are executed
//!
//! [`ArchiveStore`] implements both over one collection.

use crate::config::Settings;
use crate::queries::{QueryOutput, QuerySpec};
use futures::TryStreamExt;
use mongodb::bson::Document;
use mongodb::error::{Error as MongoError, ErrorKind};
use mongodb::{Client, Collection};
use std::error::Error;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Destination for archive records.
pub trait ArchiveSink {
    /// Insert a batch of records, returning how many were stored.
    async fn insert_archives(&self, docs: Vec<Document>) -> Result<u64, Box<dyn Error>>;
}

/// Executes declarative queries.
pub trait QueryRunner {
    async fn run(&self, spec: &QuerySpec) -> Result<QueryOutput, Box<dyn Error>>;
}

/// `mongodb://{hostname}:{port}`
pub fn connection_uri(hostname: &str, port: u16) -> String {
    format!("mongodb://{hostname}:{port}")
}

/// How many records of a `batch`-sized unordered insert made it in.
///
/// An unordered `insert_many` keeps going past rejected documents but still
/// reports an `InsertMany` error; everything not listed in `write_errors`
/// was stored. Any other error kind means nothing is known to be stored.
pub fn inserted_despite(err: MongoError, batch: usize) -> Result<u64, Box<dyn Error>> {
    match err.kind.as_ref() {
        ErrorKind::InsertMany(failure) => {
            let rejected = failure.write_errors.as_deref().unwrap_or_default();
            for write_error in rejected {
                warn!(
                    index = write_error.index,
                    code = write_error.code,
                    message = %write_error.message,
                    "Record rejected by bulk insert"
                );
            }
            if let Some(concern) = &failure.write_concern_error {
                warn!(message = %concern.message, "Write concern not satisfied");
            }
            Ok(batch.saturating_sub(rejected.len()) as u64)
        }
        _ => Err(err.into()),
    }
}

/// The archive collection on a MongoDB server.
#[derive(Debug, Clone)]
pub struct ArchiveStore {
    client: Client,
    database: String,
    collection: Collection<Document>,
}

impl ArchiveStore {
    /// Build a client for the configured server and select the collection.
    ///
    /// The driver connects lazily; the first operation surfaces an
    /// unreachable server.
    #[instrument(level = "info", skip_all, fields(host = %settings.hostname, port = settings.port))]
    pub async fn connect(settings: &Settings) -> Result<Self, Box<dyn Error>> {
        let uri = connection_uri(&settings.hostname, settings.port);
        info!(%uri, "Connecting to mongodb");

        let client = Client::with_uri_str(&uri).await?;
        let collection = client
            .database(&settings.database)
            .collection::<Document>(&settings.collection);

        info!(
            database = %settings.database,
            collection = %settings.collection,
            "Connection established"
        );
        Ok(Self {
            client,
            database: settings.database.clone(),
            collection,
        })
    }

    /// Whether the configured database is listed on the server.
    #[instrument(level = "info", skip(self), fields(database = %self.database))]
    pub async fn database_exists(&self) -> Result<bool, Box<dyn Error>> {
        let names = self.client.list_database_names().await?;
        debug!(?names, "Listed databases");
        Ok(names.iter().any(|name| name == &self.database))
    }

    /// Drop the archive collection.
    #[instrument(level = "info", skip(self), fields(collection = %self.collection.name()))]
    pub async fn reset(&self) -> Result<(), Box<dyn Error>> {
        self.collection.drop().await?;
        info!("Dropped collection");
        Ok(())
    }
}

impl ArchiveSink for ArchiveStore {
    #[instrument(level = "info", skip_all, fields(batch = docs.len()))]
    async fn insert_archives(&self, docs: Vec<Document>) -> Result<u64, Box<dyn Error>> {
        if docs.is_empty() {
            debug!("Nothing to insert");
            return Ok(0);
        }
        let batch = docs.len();
        // Unordered: a duplicate _id must not abort the rest of the batch.
        match self.collection.insert_many(docs).ordered(false).await {
            Ok(result) => Ok(result.inserted_ids.len() as u64),
            Err(e) => inserted_despite(e, batch),
        }
    }
}

impl QueryRunner for ArchiveStore {
    #[instrument(level = "info", skip_all)]
    async fn run(&self, spec: &QuerySpec) -> Result<QueryOutput, Box<dyn Error>> {
        let t0 = Instant::now();
        debug!(?spec, "Running query");

        let output = match spec {
            QuerySpec::Find {
                filter,
                sort,
                limit,
            } => {
                let mut find = self.collection.find(filter.clone());
                if let Some(sort) = sort {
                    find = find.sort(sort.clone());
                }
                if let Some(limit) = limit {
                    find = find.limit(*limit);
                }
                let docs: Vec<Document> = find.await?.try_collect().await?;
                QueryOutput::Documents(docs)
            }
            QuerySpec::Aggregate { pipeline } => {
                let docs: Vec<Document> = self
                    .collection
                    .aggregate(pipeline.clone())
                    .await?
                    .try_collect()
                    .await?;
                QueryOutput::Documents(docs)
            }
            QuerySpec::Count { filter } => {
                QueryOutput::Count(self.collection.count_documents(filter.clone()).await?)
            }
        };

        let rows = match &output {
            QueryOutput::Documents(docs) => docs.len() as u64,
            QueryOutput::Count(n) => *n,
        };
        info!(rows, elapsed_ms = t0.elapsed().as_millis() as u64, "Query finished");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{self, doc};
    use mongodb::error::InsertManyError;

    fn lazy_settings() -> Settings {
        Settings {
            hostname: "127.0.0.1".to_string(),
            port: 1,
            database: "nyt_archives".to_string(),
            collection: "archives".to_string(),
            ..Settings::default()
        }
    }

    #[test]
    fn test_connection_uri() {
        assert_eq!(connection_uri("localhost", 27017), "mongodb://localhost:27017");
        assert_eq!(
            connection_uri("ec2-54-245-184-166.us-west-2.compute.amazonaws.com", 27021),
            "mongodb://ec2-54-245-184-166.us-west-2.compute.amazonaws.com:27021"
        );
    }

    #[tokio::test]
    async fn test_connect_is_lazy() {
        // Building the client must not need a reachable server.
        let store = ArchiveStore::connect(&lazy_settings()).await.unwrap();
        assert_eq!(store.database, "nyt_archives");
        assert_eq!(store.collection.name(), "archives");
    }

    #[tokio::test]
    async fn test_empty_batch_is_a_no_op() {
        // Returns before the unreachable server is ever contacted.
        let store = ArchiveStore::connect(&lazy_settings()).await.unwrap();
        assert_eq!(store.insert_archives(vec![]).await.unwrap(), 0);
    }

    #[test]
    fn test_duplicates_count_the_rest_as_inserted() {
        let failure: InsertManyError = bson::from_document(doc! {
            "writeErrors": [
                { "index": 3, "code": 11000, "errmsg": "E11000 duplicate key error" },
                { "index": 7, "code": 11000, "errmsg": "E11000 duplicate key error" },
            ]
        })
        .unwrap();
        let err = MongoError::from(ErrorKind::InsertMany(failure));

        assert_eq!(inserted_despite(err, 10).unwrap(), 8);
    }

    #[test]
    fn test_every_record_rejected() {
        let failure: InsertManyError = bson::from_document(doc! {
            "writeErrors": [ { "index": 0, "code": 11000, "errmsg": "E11000 duplicate key error" } ]
        })
        .unwrap();
        let err = MongoError::from(ErrorKind::InsertMany(failure));

        assert_eq!(inserted_despite(err, 1).unwrap(), 0);
    }

    #[test]
    fn test_other_errors_propagate() {
        let err = MongoError::from(std::io::Error::other("connection reset"));
        assert!(inserted_despite(err, 10).is_err());
    }
}
