//! Utility functions for input discovery, file relocation, and logging.

use crate::errors::{ConfigError, PipelineError};
use regex::Regex;
use std::ffi::OsStr;
use std::fs as stdfs;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Truncate a string for logging purposes.
///
/// Long strings are cut at a character boundary at or below `max` bytes and
/// get `"…(+N bytes)"` appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

/// Turn an article URL into a file-name-safe slug.
///
/// Path segments are joined with `-`, the extension of the last one is
/// dropped, and everything outside `[a-z0-9-]` is removed.
///
/// ```ignore
/// assert_eq!(slug_from_url("http://english.ahram.org.eg/News/78541.aspx"), "news-78541");
/// ```
pub fn slug_from_url(url: &str) -> String {
    let path = Url::parse(url)
        .map(|parsed| parsed.path().to_string())
        .unwrap_or_else(|_| url.to_string());
    let path = path.trim_matches('/');
    let path = match path.rsplit_once('.') {
        Some((stem, ext)) if !ext.contains('/') => stem,
        _ => path,
    };

    let slug = path
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() { "index".to_string() } else { slug }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and deletes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), PipelineError> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| PipelineError::io(path, e))?;
    // Sync probe keeps the error surface simple
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path).map_err(|e| PipelineError::io(path, e))?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Directory is writable");
    Ok(())
}

fn wildcard_regex(pattern: &str) -> Result<Regex, ConfigError> {
    let body = regex::escape(pattern)
        .replace(r"\*", ".*")
        .replace(r"\?", ".");
    Regex::new(&format!("^{body}$")).map_err(|_| ConfigError::InvalidPattern(pattern.to_string()))
}

/// Expand an input pattern into a sorted list of files.
///
/// `pattern` is a directory (all regular files in it), a single file, or a
/// path whose final component contains `*` or `?` wildcards.
#[instrument(level = "info", skip_all, fields(pattern = %pattern))]
pub async fn discover_inputs(pattern: &str) -> Result<Vec<PathBuf>, PipelineError> {
    let path = Path::new(pattern);

    let (dir, name_filter) = if fs::metadata(path).await.is_ok_and(|m| m.is_dir()) {
        (path.to_path_buf(), None)
    } else {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| ConfigError::InvalidPattern(pattern.to_string()))?;
        if !file_name.contains(['*', '?']) {
            return Ok(vec![path.to_path_buf()]);
        }
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        // Only the file name may be a wildcard.
        if parent.to_string_lossy().contains(['*', '?']) {
            return Err(ConfigError::InvalidPattern(pattern.to_string()).into());
        }
        (parent, Some(wildcard_regex(file_name)?))
    };

    let mut entries = fs::read_dir(&dir)
        .await
        .map_err(|e| PipelineError::io(&dir, e))?;
    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| PipelineError::io(&dir, e))?
    {
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| PipelineError::io(entry.path(), e))?;
        if !file_type.is_file() {
            continue;
        }
        let keep = match (&name_filter, entry.file_name().to_str()) {
            (None, _) => true,
            (Some(re), Some(name)) => re.is_match(name),
            (Some(_), None) => false,
        };
        if keep {
            files.push(entry.path());
        }
    }
    files.sort();

    debug!(count = files.len(), dir = %dir.display(), "Discovered input files");
    Ok(files)
}

/// First free name for `file_name` in `dir`: `57831.html`, then
/// `57831.1.html`, `57831.2.html`, ...
async fn free_target(dir: &Path, file_name: &OsStr) -> Result<PathBuf, PipelineError> {
    let name = Path::new(file_name);
    let stem = name.file_stem().unwrap_or(file_name).to_string_lossy();
    let ext = name.extension().map(|ext| ext.to_string_lossy());

    let mut target = dir.join(file_name);
    let mut n = 0;
    while fs::try_exists(&target)
        .await
        .map_err(|e| PipelineError::io(&target, e))?
    {
        n += 1;
        let candidate = match &ext {
            Some(ext) => format!("{stem}.{n}.{ext}"),
            None => format!("{stem}.{n}"),
        };
        target = dir.join(candidate);
    }
    Ok(target)
}

/// Move `path` into `dir` unmodified, returning the new location.
///
/// Never replaces a file already in `dir`; a clashing name gets a numeric
/// suffix. Falls back to copy-then-delete when a rename is impossible, e.g.
/// across filesystems.
#[instrument(level = "debug", skip_all, fields(path = %path.display(), dir = %dir.display()))]
pub async fn quarantine(path: &Path, dir: &Path) -> Result<PathBuf, PipelineError> {
    fs::create_dir_all(dir)
        .await
        .map_err(|e| PipelineError::io(dir, e))?;
    let file_name = path
        .file_name()
        .ok_or_else(|| PipelineError::io(path, std::io::ErrorKind::InvalidInput.into()))?;
    let target = free_target(dir, file_name).await?;

    if let Err(e) = fs::rename(path, &target).await {
        warn!(error = %e, "Rename failed; copying instead");
        fs::copy(path, &target)
            .await
            .map_err(|e| PipelineError::io(&target, e))?;
        fs::remove_file(path)
            .await
            .map_err(|e| PipelineError::io(path, e))?;
    }
    Ok(target)
}
