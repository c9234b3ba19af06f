//! Command-line interface definitions.
//!
//! Every option can also come from an environment variable or from the YAML
//! file passed with `--config`; see [`crate::config::RunConfig::resolve`] for
//! the precedence rules.

use crate::extractors::Publication;
use clap::Parser;

/// Extract articles from archived news-site HTML into SQLite.
///
/// # Examples
///
/// ```sh
/// # Load a directory of Ahram Online pages
/// news_archive_parser -p ahram -i ./raw/ahram -d ./corpus.db
///
/// # Preview extraction without touching the database
/// news_archive_parser -p dne -i './raw/dne/*.html' --dry-run
///
/// # Everything from a config file, publication overridden
/// news_archive_parser -c ./run.yaml -p egind
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Publication template of the input files
    #[arg(short, long, value_enum, env = "NEWS_PUBLICATION")]
    pub publication: Option<Publication>,

    /// Input directory, or a path whose file name (not directories) may contain `*` / `?`
    #[arg(short, long, env = "NEWS_INPUT")]
    pub input: Option<String>,

    /// SQLite database file
    #[arg(short, long, env = "NEWS_DATABASE")]
    pub database: Option<String>,

    /// Where off-template documents are moved
    #[arg(short, long, env = "NEWS_QUARANTINE_DIR")]
    pub quarantine_dir: Option<String>,

    /// Where documents that are not valid UTF-8 are moved
    #[arg(short, long, env = "NEWS_ENCODING_QUARANTINE_DIR")]
    pub encoding_quarantine_dir: Option<String>,

    /// Also write each extracted article as JSON into this directory
    #[arg(short, long, env = "NEWS_JSON_OUTPUT_DIR")]
    pub json_output_dir: Option<String>,

    /// Optional path to config.yaml file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Print extracted articles instead of storing them
    #[arg(long)]
    pub dry_run: bool,
}
