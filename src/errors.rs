//! Error types for extraction, configuration, and the processing run.
//!
//! Errors are split by the scope they abort:
//!
//! - [`ExtractError`]: one document could not be turned into an article
//! - [`ConfigError`]: the run cannot start
//! - [`PipelineError`]: the run itself failed (store, filesystem) or wraps a
//!   per-document error that the caller must classify
//!
//! Recoverability is decided here, in one place, so the pipeline loop only
//! asks [`PipelineError::quarantine_kind`] what to do with a failed file.

use std::path::PathBuf;
use thiserror::Error;

/// Why a single document could not be extracted.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// A required selector matched nothing.
    #[error("no element matches `{selector}`")]
    MissingElement { selector: String },

    /// A required element exists but has no usable text.
    #[error("element `{selector}` is empty")]
    EmptyElement { selector: String },

    /// A required element lacks an attribute.
    #[error("element `{selector}` has no `{attribute}` attribute")]
    MissingAttribute {
        selector: String,
        attribute: &'static str,
    },

    #[error("date `{text}` does not match format `{format}`")]
    DateFormat {
        text: String,
        format: &'static str,
        #[source]
        source: chrono::ParseError,
    },

    /// An extractor handed the builder an incomplete record.
    #[error("article from {origin} is missing required field `{field}`")]
    MissingField { field: &'static str, origin: String },

    #[error("invalid selector `{0}`")]
    InvalidSelector(String),
}

impl ExtractError {
    /// Off-template documents are quarantined; everything else is a bug.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ExtractError::MissingElement { .. }
                | ExtractError::EmptyElement { .. }
                | ExtractError::MissingAttribute { .. }
                | ExtractError::DateFormat { .. }
        )
    }
}

/// Startup configuration problems. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown publication `{0}` (expected one of: egind, ahram, dne)")]
    UnknownPublication(String),

    #[error("missing required setting `{0}` (pass it on the command line or in the config file)")]
    MissingSetting(&'static str),

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

    #[error("invalid input pattern `{0}`")]
    InvalidPattern(String),
}

/// Failures surfaced by [`crate::pipeline::Pipeline`].
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{path}: {source}")]
    Extract {
        path: PathBuf,
        #[source]
        source: ExtractError,
    },

    #[error("{path} is not valid UTF-8: {source}")]
    Encoding {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where a failed document should be moved, if anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuarantineKind {
    /// Off-template markup or an unparseable date.
    Structural,
    /// Undecodable bytes; needs a human to fix the encoding.
    Encoding,
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }

    /// `None` means the error must abort the run.
    pub fn quarantine_kind(&self) -> Option<QuarantineKind> {
        match self {
            PipelineError::Extract { source, .. } if source.is_recoverable() => {
                Some(QuarantineKind::Structural)
            }
            PipelineError::Encoding { .. } => Some(QuarantineKind::Encoding),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_errors_are_recoverable() {
        let err = ExtractError::MissingElement {
            selector: "#ContentPlaceHolder1_hd".to_string(),
        };
        assert!(err.is_recoverable());
        assert_eq!(err.to_string(), "no element matches `#ContentPlaceHolder1_hd`");
    }

    #[test]
    fn test_date_errors_share_the_structural_category() {
        let source = chrono::NaiveDate::parse_from_str("yesterday", "%B %d, %Y").unwrap_err();
        let err = PipelineError::Extract {
            path: PathBuf::from("a.html"),
            source: ExtractError::DateFormat {
                text: "yesterday".to_string(),
                format: "%B %d, %Y",
                source,
            },
        };
        assert_eq!(err.quarantine_kind(), Some(QuarantineKind::Structural));
    }

    #[test]
    fn test_missing_field_is_fatal() {
        let err = PipelineError::Extract {
            path: PathBuf::from("a.html"),
            source: ExtractError::MissingField {
                field: "url",
                origin: "a.html".to_string(),
            },
        };
        assert_eq!(err.quarantine_kind(), None);
        assert!(err.to_string().contains("missing required field `url`"));
    }

    #[test]
    fn test_encoding_errors_use_their_own_quarantine() {
        let source = String::from_utf8(vec![0x66, 0xff, 0x6f]).unwrap_err();
        let err = PipelineError::Encoding {
            path: PathBuf::from("bad.html"),
            source,
        };
        assert_eq!(err.quarantine_kind(), Some(QuarantineKind::Encoding));
    }
}
