//! # NYT Archiver
//!
//! Builds a local MongoDB copy of New York Times archive metadata and runs
//! canned analytical queries against it from an interactive menu.
//!
//! ## Features
//!
//! - Fetches every month of the configured year ranges from the NYT Archive API
//! - Bulk inserts each month's records unmodified into one collection
//! - Offers fifteen queries: keyword trends, reporters, sections, page and
//!   date searches, counts and monthly volume
//! - Optionally writes a JSON copy of every query result
//!
//! ## Usage
//!
//! ```sh
//! nyt_archiver --nyt-api-key YOUR_KEY -d archives_2000 -c month_4
//! ```
//!
//! ## Architecture
//!
//! 1. **Configuration**: defaults, then the optional YAML file, then CLI flags
//! 2. **Dataset**: built when the database is missing or `--force` is given
//! 3. **Queries**: the menu loop, or a single `-q N` run

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod menu;
mod models;
mod outputs;
mod populate;
mod queries;
mod store;
mod utils;

use api::NytArchiveClient;
use cli::Cli;
use config::Settings;
use menu::{MenuChoice, Prompter, Session};
use populate::create_archives_dataset;
use store::ArchiveStore;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    // Logs go to stderr; stdout belongs to the menu.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let start_time = std::time::Instant::now();
    info!("nyt_archiver starting up");

    let args = Cli::parse();
    debug!(?args.config, ?args.json_output_dir, ?args.query, force = args.force, "Parsed CLI arguments");

    let settings = match Settings::resolve(&args) {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    if let Some(dir) = args.json_output_dir.as_deref() {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(
                path = %dir,
                error = %e,
                "JSON output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    let store = ArchiveStore::connect(&settings).await?;

    // ---- Dataset ----
    let exists = match store.database_exists().await {
        Ok(exists) => exists,
        Err(e) => {
            error!(error = %e, "Could not list databases, is mongod running?");
            return Err(e);
        }
    };

    if args.force || !exists {
        if exists {
            info!(database = %settings.database, "Rebuilding dataset on request");
        } else {
            info!(database = %settings.database, "Database not found, creating dataset");
        }

        let api_key = settings.require_api_key()?;
        let client = NytArchiveClient::new(settings.api_base_url.clone(), api_key);

        if args.force {
            store.reset().await?;
        }

        let report = create_archives_dataset(&client, &store, &settings.phases).await;
        if report.months_loaded == 0 {
            warn!("Failed to create dataset, check mongodb logs");
        } else if report.months_failed > 0 {
            warn!(
                months_failed = report.months_failed,
                "Dataset is incomplete, some months could not be loaded"
            );
        }
    } else {
        info!(database = %settings.database, "Database found, skipping dataset creation");
    }

    // ---- Queries ----
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut prompter = Prompter::new(stdin.lock(), stdout.lock());
    let session = Session::new(&store, &settings.phases, args.json_output_dir.as_deref());

    let completed = match args.query {
        Some(n) => {
            let choice = MenuChoice::try_from(n)?;
            usize::from(session.run_once(&mut prompter, choice).await?)
        }
        None => session.run_interactive(&mut prompter).await?,
    };
    println!("Thanks for using NYT Archiver...");

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        queries = completed,
        "Execution complete"
    );

    Ok(())
}
