//! Command-line interface definitions for NYT Archiver.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Every option is optional: anything left out falls back to the config file
//! (when given) and then to the built-in defaults in [`crate::config`].

use clap::Parser;

/// Command-line arguments for the NYT Archiver application.
///
/// # Examples
///
/// ```sh
/// # Query the default local database, building it first if it is missing
/// nyt_archiver --nyt-api-key YOUR_KEY
///
/// # Use another server and collection, rebuilding the dataset from scratch
/// nyt_archiver --hostname db.internal -p 27021 -d nyt_archives -c archives --force
///
/// # Run query #7 once and keep a JSON copy of the result
/// nyt_archiver -q 7 -j ./results
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// MongoDB host name
    #[arg(long, env = "NYT_ARCHIVER_HOSTNAME")]
    pub hostname: Option<String>,

    /// MongoDB port
    #[arg(short, long, env = "NYT_ARCHIVER_PORT")]
    pub port: Option<u16>,

    /// Database holding the archives
    #[arg(short, long)]
    pub database: Option<String>,

    /// Collection holding the archives
    #[arg(short, long)]
    pub collection: Option<String>,

    /// Drop and rebuild the dataset even if the database already exists
    #[arg(short, long)]
    pub force: bool,

    /// New York Times API key
    #[arg(long, env = "NYT_API_KEY", hide_env_values = true)]
    pub nyt_api_key: Option<String>,

    /// Base URL of the NYT API (the archive path is appended to it)
    #[arg(long)]
    pub api_base_url: Option<String>,

    /// Optional path to a YAML config file
    #[arg(long)]
    pub config: Option<String>,

    /// Directory where a JSON copy of every query result is written
    #[arg(short, long)]
    pub json_output_dir: Option<String>,

    /// Run a single query [1-15] and exit instead of showing the menu
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=15))]
    pub query: Option<u8>,
}
