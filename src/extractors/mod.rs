//! Per-publication field extractors.
//!
//! Each submodule knows exactly one archived site template and turns a raw
//! HTML page into an [`Article`]:
//!
//! | Publication | Module | Template | Notes |
//! |-------------|--------|----------|-------|
//! | Egypt Independent | [`egind`] | Drupal panels | OpenGraph URL, translation flag |
//! | al-Ahram English | [`ahram`] | ASP.NET | Source/date blob, short-link URL |
//! | Daily News Egypt | [`dne`] | WordPress | Four-way byline heuristics |
//!
//! The publication is chosen once per run; [`Publication::extract`] is the
//! only dispatch point.

pub mod ahram;
pub mod dne;
pub mod egind;
pub mod transforms;

use crate::errors::{ConfigError, ExtractError};
use crate::markup::{self, contents_text};
use crate::models::Article;
use chrono::NaiveDate;
use clap::ValueEnum;
use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The site templates this crate understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Publication {
    /// Egypt Independent
    Egind,
    /// al-Ahram English
    Ahram,
    /// Daily News Egypt
    Dne,
}

impl Publication {
    pub fn as_str(&self) -> &'static str {
        match self {
            Publication::Egind => "egind",
            Publication::Ahram => "ahram",
            Publication::Dne => "dne",
        }
    }

    /// Extract one article from the raw page text.
    ///
    /// `origin` identifies the document in diagnostics.
    pub fn extract(&self, html: &str, origin: &str) -> Result<Article, ExtractError> {
        match self {
            Publication::Egind => egind::extract(html, origin),
            Publication::Ahram => ahram::extract(html, origin),
            Publication::Dne => dne::extract(html, origin),
        }
    }
}

impl fmt::Display for Publication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Publication {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "egind" => Ok(Publication::Egind),
            "ahram" => Ok(Publication::Ahram),
            "dne" => Ok(Publication::Dne),
            _ => Err(ConfigError::UnknownPublication(s.to_string())),
        }
    }
}

/// Parse a trimmed date string; time-of-day fields in `format` are ignored.
pub(crate) fn parse_date(text: &str, format: &'static str) -> Result<NaiveDate, ExtractError> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, format).map_err(|source| ExtractError::DateFormat {
        text: text.to_string(),
        format,
        source,
    })
}

/// Direct text of an element, trimmed.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// De-tagged contents of the first match; blank text is an error.
pub(crate) fn required_text(doc: &Html, css: &str) -> Result<String, ExtractError> {
    let text = contents_text(markup::select_first(doc, css)?);
    if text.is_empty() {
        return Err(ExtractError::EmptyElement {
            selector: css.to_string(),
        });
    }
    Ok(text)
}

/// De-tagged contents of the first match, `None` when blank.
pub(crate) fn optional_text(doc: &Html, css: &str) -> Result<Option<String>, ExtractError> {
    let text = contents_text(markup::select_first(doc, css)?);
    Ok(Some(text).filter(|t| !t.is_empty()))
}

/// The OpenGraph canonical URL.
pub(crate) fn og_url(doc: &Html) -> Result<String, ExtractError> {
    markup::attr(doc, "meta[property=\"og:url\"]", "content")
}
