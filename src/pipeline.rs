//! The per-run processing loop.
//!
//! Files are handled one at a time in sorted order:
//!
//! 1. read bytes and decode as UTF-8 (failure → encoding quarantine)
//! 2. run the publication's extractor (recoverable failure → quarantine)
//! 3. persist to the store, or print the article in dry-run mode
//! 4. optionally write the article as JSON
//!
//! Each document commits on its own, so an aborted run keeps everything
//! stored before the failure.

use crate::config::RunConfig;
use crate::errors::{PipelineError, QuarantineKind};
use crate::models::Article;
use crate::outputs::json;
use crate::outputs::sqlite::{Persisted, Store};
use crate::utils::{discover_inputs, ensure_writable_dir, quarantine, truncate_for_log};
use std::path::Path;
use tokio::fs;
use tracing::{debug, error, info, instrument, warn};

/// What happened to one successfully extracted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Stored(Persisted),
    Previewed,
}

/// Per-run counters, logged when the run ends.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub discovered: usize,
    pub persisted: usize,
    pub already_present: usize,
    pub previewed: usize,
    pub quarantined: usize,
    pub encoding_quarantined: usize,
}

pub struct Pipeline {
    config: RunConfig,
    store: Option<Store>,
}

impl Pipeline {
    /// Open the store (unless dry-running) for the whole run.
    pub fn new(config: RunConfig) -> Result<Self, PipelineError> {
        let store = match (&config.database, config.dry_run) {
            (Some(path), false) => Some(Store::open(path)?),
            _ => None,
        };
        Ok(Self { config, store })
    }

    /// Extract and store a single file.
    #[instrument(level = "info", skip_all, fields(file = %path.display()))]
    pub async fn process_file(&mut self, path: &Path) -> Result<Outcome, PipelineError> {
        let bytes = fs::read(path)
            .await
            .map_err(|e| PipelineError::io(path, e))?;
        let html = String::from_utf8(bytes).map_err(|source| PipelineError::Encoding {
            path: path.to_path_buf(),
            source,
        })?;

        let origin = path.display().to_string();
        let article = self
            .config
            .publication
            .extract(&html, &origin)
            .map_err(|source| PipelineError::Extract {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(
            title = %truncate_for_log(&article.title, 80),
            url = %article.url,
            word_count = article.word_count,
            "Extracted article"
        );

        if let Some(dir) = &self.config.json_output_dir {
            json::write_article(&article, dir).await?;
        }

        match &mut self.store {
            Some(store) => {
                let persisted = store.persist(&article)?;
                info!(
                    article_id = persisted.article_id,
                    inserted = persisted.inserted,
                    "Stored article"
                );
                Ok(Outcome::Stored(persisted))
            }
            None => {
                print_preview(&article)?;
                Ok(Outcome::Previewed)
            }
        }
    }

    /// Process every input file, quarantining recoverable failures.
    ///
    /// # Errors
    ///
    /// Fatal errors (store, I/O, programming errors in an extractor) abort the
    /// run immediately.
    #[instrument(level = "info", skip_all, fields(publication = %self.config.publication))]
    pub async fn run(&mut self) -> Result<RunSummary, PipelineError> {
        if !self.config.dry_run {
            ensure_writable_dir(&self.config.quarantine_dir).await?;
            ensure_writable_dir(&self.config.encoding_quarantine_dir).await?;
        }
        if let Some(dir) = &self.config.json_output_dir {
            ensure_writable_dir(dir).await?;
        }

        let files = discover_inputs(&self.config.input_pattern).await?;
        let mut summary = RunSummary {
            discovered: files.len(),
            ..RunSummary::default()
        };
        info!(count = files.len(), pattern = %self.config.input_pattern, "Processing input files");

        for (i, path) in files.iter().enumerate() {
            debug!(index = i, file = %path.display(), "Processing file");
            match self.process_file(path).await {
                Ok(Outcome::Stored(Persisted { inserted: true, .. })) => summary.persisted += 1,
                Ok(Outcome::Stored(Persisted { inserted: false, .. })) => {
                    summary.already_present += 1
                }
                Ok(Outcome::Previewed) => summary.previewed += 1,
                Err(e) => match e.quarantine_kind() {
                    Some(kind) => {
                        warn!(file = %path.display(), error = %e, ?kind, "Skipping document");
                        self.set_aside(path, kind).await?;
                        match kind {
                            QuarantineKind::Structural => summary.quarantined += 1,
                            QuarantineKind::Encoding => summary.encoding_quarantined += 1,
                        }
                    }
                    None => {
                        error!(file = %path.display(), error = %e, "Aborting run");
                        return Err(e);
                    }
                },
            }
        }

        info!(
            discovered = summary.discovered,
            persisted = summary.persisted,
            already_present = summary.already_present,
            previewed = summary.previewed,
            quarantined = summary.quarantined,
            encoding_quarantined = summary.encoding_quarantined,
            "Run complete"
        );
        Ok(summary)
    }

    async fn set_aside(&self, path: &Path, kind: QuarantineKind) -> Result<(), PipelineError> {
        if self.config.dry_run {
            return Ok(());
        }
        let dir = match kind {
            QuarantineKind::Structural => &self.config.quarantine_dir,
            QuarantineKind::Encoding => &self.config.encoding_quarantine_dir,
        };
        let target = quarantine(path, dir).await?;
        info!(from = %path.display(), to = %target.display(), "Quarantined document");
        Ok(())
    }
}

fn print_preview(article: &Article) -> Result<(), PipelineError> {
    println!("{}", serde_json::to_string_pretty(article)?);
    Ok(())
}
