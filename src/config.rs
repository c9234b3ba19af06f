//! Run configuration.
//!
//! Settings come from three places, highest precedence first: command-line
//! flags, their environment-variable fallbacks (handled by clap), and an
//! optional YAML file:
//!
//! ```yaml
//! publication: ahram
//! input: ./raw/ahram/*.html
//! database: ./corpus.db
//! quarantine_dir: ./quarantine
//! encoding_quarantine_dir: ./quarantine/encoding
//! json_output_dir: ./json
//! ```

use crate::cli::Cli;
use crate::errors::ConfigError;
use crate::extractors::Publication;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

const DEFAULT_QUARANTINE_DIR: &str = "quarantine";
const DEFAULT_ENCODING_QUARANTINE_DIR: &str = "quarantine/encoding";

/// Contents of the `--config` YAML file. Every key is optional.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub publication: Option<Publication>,
    pub input: Option<String>,
    pub database: Option<String>,
    pub quarantine_dir: Option<String>,
    pub encoding_quarantine_dir: Option<String>,
    pub json_output_dir: Option<String>,
    #[serde(default)]
    pub dry_run: bool,
}

impl FileConfig {
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub publication: Publication,
    pub input_pattern: String,
    /// `None` only in dry-run mode.
    pub database: Option<PathBuf>,
    pub quarantine_dir: PathBuf,
    pub encoding_quarantine_dir: PathBuf,
    pub json_output_dir: Option<PathBuf>,
    pub dry_run: bool,
}

impl RunConfig {
    /// Merge the command line over the optional config file.
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(Path::new(path))?,
            None => FileConfig::default(),
        };
        Self::merge(cli, file)
    }

    fn merge(cli: &Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let dry_run = cli.dry_run || file.dry_run;

        let publication = cli
            .publication
            .or(file.publication)
            .ok_or(ConfigError::MissingSetting("publication"))?;
        let input_pattern = cli
            .input
            .clone()
            .or(file.input)
            .ok_or(ConfigError::MissingSetting("input"))?;

        let database = cli.database.clone().or(file.database).map(PathBuf::from);
        if database.is_none() && !dry_run {
            return Err(ConfigError::MissingSetting("database"));
        }

        let quarantine_dir = cli
            .quarantine_dir
            .clone()
            .or(file.quarantine_dir)
            .unwrap_or_else(|| DEFAULT_QUARANTINE_DIR.to_string());
        let encoding_quarantine_dir = cli
            .encoding_quarantine_dir
            .clone()
            .or(file.encoding_quarantine_dir)
            .unwrap_or_else(|| DEFAULT_ENCODING_QUARANTINE_DIR.to_string());
        let json_output_dir = cli
            .json_output_dir
            .clone()
            .or(file.json_output_dir)
            .map(PathBuf::from);

        let config = RunConfig {
            publication,
            input_pattern,
            database,
            quarantine_dir: PathBuf::from(quarantine_dir),
            encoding_quarantine_dir: PathBuf::from(encoding_quarantine_dir),
            json_output_dir,
            dry_run,
        };
        debug!(?config, "Resolved run configuration");
        Ok(config)
    }
}
