//! Layered runtime configuration.
//!
//! Settings are resolved in three layers, later layers winning:
//!
//! 1. Built-in defaults ([`Settings::default`])
//! 2. An optional YAML file passed with `--config`
//! 3. Command-line flags and their environment variables
//!
//! # Example file
//!
//! ```yaml
//! hostname: localhost
//! port: 27017
//! database: nyt_archives
//! collection: archives
//! phases:
//!   - { start_year: 2005, end_year: 2007 }
//!   - { start_year: 2015, end_year: 2017 }
//! ```

use crate::cli::Cli;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, instrument, warn};

pub const DEFAULT_HOSTNAME: &str = "localhost";
pub const DEFAULT_PORT: u16 = 27017;
pub const DEFAULT_DATABASE: &str = "archives_2000";
pub const DEFAULT_COLLECTION: &str = "month_4";
pub const DEFAULT_API_BASE_URL: &str = "https://api.nytimes.com/svc/";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("phase {start_year}-{end_year} ends before it starts")]
    InvalidPhase { start_year: i32, end_year: i32 },

    #[error("at least one phase of years must be configured")]
    NoPhases,

    #[error("an NYT API key is required to build the dataset (use --nyt-api-key or NYT_API_KEY)")]
    MissingApiKey,
}

/// An inclusive range of archive years fetched as one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Phase {
    pub start_year: i32,
    pub end_year: i32,
}

impl Phase {
    pub const fn new(start_year: i32, end_year: i32) -> Self {
        Self {
            start_year,
            end_year,
        }
    }

    /// Every year in the phase, oldest first.
    pub fn years(&self) -> impl Iterator<Item = i32> {
        self.start_year..=self.end_year
    }
}

/// Resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub hostname: String,
    pub port: u16,
    pub database: String,
    pub collection: String,
    pub api_base_url: String,
    pub api_key: Option<String>,
    pub phases: Vec<Phase>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hostname: DEFAULT_HOSTNAME.to_string(),
            port: DEFAULT_PORT,
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: None,
            phases: vec![Phase::new(2005, 2007), Phase::new(2015, 2017)],
        }
    }
}

impl Settings {
    /// Resolve settings from defaults, the optional config file, and CLI flags.
    #[instrument(level = "info", skip_all)]
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let base = match cli.config.as_deref() {
            Some(path) => load_file(path)?,
            None => Self::default(),
        };
        let settings = base.with_overrides(cli);
        settings.validate()?;

        if settings.uses_default_target() {
            warn!(
                database = %settings.database,
                collection = %settings.collection,
                "Working with a default database or collection name"
            );
        } else {
            info!(
                database = %settings.database,
                collection = %settings.collection,
                "Using database and collection"
            );
        }

        Ok(settings)
    }

    /// Apply CLI flags on top of these settings.
    pub fn with_overrides(mut self, cli: &Cli) -> Self {
        if let Some(hostname) = &cli.hostname {
            self.hostname = hostname.clone();
        }
        if let Some(port) = cli.port {
            self.port = port;
        }
        if let Some(database) = &cli.database {
            self.database = database.clone();
        }
        if let Some(collection) = &cli.collection {
            self.collection = collection.clone();
        }
        if let Some(base) = &cli.api_base_url {
            self.api_base_url = base.clone();
        }
        if let Some(key) = &cli.nyt_api_key {
            self.api_key = Some(key.clone());
        }
        self
    }

    /// Whether the database or the collection was left at its default name.
    pub fn uses_default_target(&self) -> bool {
        self.database == DEFAULT_DATABASE || self.collection == DEFAULT_COLLECTION
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.phases.is_empty() {
            return Err(ConfigError::NoPhases);
        }
        if let Some(bad) = self.phases.iter().find(|p| p.start_year > p.end_year) {
            return Err(ConfigError::InvalidPhase {
                start_year: bad.start_year,
                end_year: bad.end_year,
            });
        }
        Ok(())
    }

    /// The API key, or [`ConfigError::MissingApiKey`] when none was given.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }
}

/// Load settings from a YAML file. Missing keys keep their defaults.
pub fn load_file(path: impl AsRef<Path>) -> Result<Settings, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let settings: Settings = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "Loaded configuration file");
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.hostname, "localhost");
        assert_eq!(settings.port, 27017);
        assert_eq!(settings.database, "archives_2000");
        assert_eq!(settings.collection, "month_4");
        assert_eq!(
            settings.phases,
            vec![Phase::new(2005, 2007), Phase::new(2015, 2017)]
        );
    }

    #[test]
    fn test_phase_years_inclusive() {
        let years: Vec<i32> = Phase::new(2005, 2007).years().collect();
        assert_eq!(years, vec![2005, 2006, 2007]);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "nyt_archiver",
            "--hostname",
            "db.internal",
            "-p",
            "27021",
            "-d",
            "nyt_archives",
            "-c",
            "archives",
        ]);

        let settings = Settings::default().with_overrides(&cli);
        assert_eq!(settings.hostname, "db.internal");
        assert_eq!(settings.port, 27021);
        assert_eq!(settings.database, "nyt_archives");
        assert_eq!(settings.collection, "archives");
        assert_eq!(settings.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_default_target_when_either_name_is_default() {
        let only_database =
            Settings::default().with_overrides(&Cli::parse_from(["nyt_archiver", "-d", "nyt_archives"]));
        assert!(only_database.uses_default_target());

        let only_collection =
            Settings::default().with_overrides(&Cli::parse_from(["nyt_archiver", "-c", "archives"]));
        assert!(only_collection.uses_default_target());

        let both = Settings::default().with_overrides(&Cli::parse_from([
            "nyt_archiver",
            "-d",
            "nyt_archives",
            "-c",
            "archives",
        ]));
        assert!(!both.uses_default_target());
        assert!(Settings::default().uses_default_target());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "database: nyt_archives\nport: 27030").unwrap();

        let settings = load_file(file.path()).unwrap();
        assert_eq!(settings.database, "nyt_archives");
        assert_eq!(settings.port, 27030);
        assert_eq!(settings.collection, DEFAULT_COLLECTION);
        assert_eq!(settings.phases.len(), 2);
    }

    #[test]
    fn test_yaml_phases() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "phases:\n  - {{ start_year: 2000, end_year: 2000 }}").unwrap();

        let settings = load_file(file.path()).unwrap();
        assert_eq!(settings.phases, vec![Phase::new(2000, 2000)]);
    }

    #[test]
    fn test_unparsable_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port: not-a-number").unwrap();

        assert!(matches!(
            load_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_file("/definitely/not/here.yaml"),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_inverted_phase() {
        let settings = Settings {
            phases: vec![Phase::new(2017, 2015)],
            ..Settings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidPhase {
                start_year: 2017,
                end_year: 2015
            })
        ));
    }

    #[test]
    fn test_validate_rejects_no_phases() {
        let settings = Settings {
            phases: vec![],
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(ConfigError::NoPhases)));
    }

    #[test]
    fn test_require_api_key() {
        let mut settings = Settings::default();
        assert!(matches!(
            settings.require_api_key(),
            Err(ConfigError::MissingApiKey)
        ));

        settings.api_key = Some("   ".to_string());
        assert!(settings.require_api_key().is_err());

        settings.api_key = Some("abc123".to_string());
        assert_eq!(settings.require_api_key().unwrap(), "abc123");
    }
}
