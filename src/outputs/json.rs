//! JSON export of extracted articles.
//!
//! One file per article, named after its URL:
//! ```text
//! json_output_dir/
//! ├── news-78541.json
//! └── opinion-beyond-sectarianism.json
//! ```

use crate::errors::PipelineError;
use crate::models::Article;
use crate::utils::slug_from_url;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// Write `article` as pretty JSON to `{json_output_dir}/{slug}.json`.
///
/// Existing files are overwritten, so re-running yields the same tree.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir.display()))]
pub async fn write_article(
    article: &Article,
    json_output_dir: &Path,
) -> Result<PathBuf, PipelineError> {
    let json = serde_json::to_string_pretty(article)?;

    fs::create_dir_all(json_output_dir)
        .await
        .map_err(|e| PipelineError::io(json_output_dir, e))?;

    let path = json_output_dir.join(format!("{}.json", slug_from_url(&article.url)));
    fs::write(&path, json)
        .await
        .map_err(|e| PipelineError::io(&path, e))?;
    info!(path = %path.display(), "Wrote JSON article");

    Ok(path)
}
