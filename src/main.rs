//! # News Archive Parser
//!
//! Turns archived HTML pages from three Egyptian English-language news sites
//! into normalized article records in SQLite.
//!
//! ## Features
//!
//! - Per-publication extractors for Egypt Independent, al-Ahram English and
//!   Daily News Egypt
//! - Derived text fields (tag-free, punctuation-free, word count) computed
//!   identically for every publication
//! - Idempotent persistence with author, source and tag dimension tables
//! - Off-template and badly encoded pages are quarantined, not fatal
//!
//! ## Usage
//!
//! ```sh
//! news_archive_parser -p ahram -i './raw/ahram/*.html' -d ./corpus.db
//! ```
//!
//! ## Architecture
//!
//! 1. **Discovery**: expand the input pattern into a sorted file list
//! 2. **Extraction**: parse each page with the publication's template rules
//! 3. **Persistence**: write the article and its links in one transaction
//! 4. **Quarantine**: move pages that do not fit the template aside

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod errors;
mod extractors;
mod markup;
mod models;
mod outputs;
mod pipeline;
mod sanitize;
mod utils;

use cli::Cli;
use config::RunConfig;
use pipeline::Pipeline;

#[tokio::main(flavor = "current_thread")]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_archive_parser starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let config = match RunConfig::resolve(&args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    info!(
        publication = %config.publication,
        input = %config.input_pattern,
        dry_run = config.dry_run,
        "Configuration resolved"
    );

    let mut pipeline = Pipeline::new(config)?;
    let summary = match pipeline.run().await {
        Ok(summary) => summary,
        Err(e) => {
            error!(error = %e, "Run failed");
            return Err(e.into());
        }
    };

    info!(
        elapsed_secs = start_time.elapsed().as_secs_f64(),
        stored = summary.persisted + summary.already_present,
        skipped = summary.quarantined + summary.encoding_quarantined,
        "news_archive_parser finished"
    );
    Ok(())
}
