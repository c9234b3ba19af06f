//! Article records and the builder the extractors fill in.
//!
//! This module defines:
//! - [`Article`]: the immutable, fully populated record handed to persistence
//! - [`ArticleType`]: news or opinion
//! - [`ArticleBuilder`]: accumulates extracted fields and computes the derived
//!   text fields once everything required is present
//!
//! The derived fields (`content_no_tags`, `content_no_punc`, `word_count`) are
//! computed here and nowhere else, so all three publications agree on them.

use crate::errors::ExtractError;
use crate::sanitize::{collapse_whitespace, strip_all};
use chrono::NaiveDate;
use itertools::Itertools;
use serde::Serialize;
use std::fmt;

/// Characters replaced by spaces in `content_no_punc`.
///
/// ASCII punctuation without the hyphen, plus en dash, em dash and curly quotes.
pub const PUNCTUATION: &str = "!\"#$%&'()*+,./:;<=>?@[\\]^_`{|}~–—”’“‘";

/// Editorial category of an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArticleType {
    News,
    Opinion,
}

impl ArticleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleType::News => "News",
            ArticleType::Opinion => "Opinion",
        }
    }

    /// Classify from a yes/no opinion signal.
    pub fn from_opinion_signal(is_opinion: bool) -> Self {
        if is_opinion {
            ArticleType::Opinion
        } else {
            ArticleType::News
        }
    }
}

impl fmt::Display for ArticleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully extracted article.
///
/// Construct through [`ArticleBuilder`]. `authors` and `sources` are never
/// both non-empty: opinion pieces carry authors, news pieces carry sources.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    pub title: String,
    pub subtitle: Option<String>,
    pub date: NaiveDate,
    pub authors: Vec<String>,
    pub sources: Vec<String>,
    /// Sanitized HTML blocks joined with newlines.
    pub content: String,
    pub content_no_tags: String,
    pub content_no_punc: String,
    pub word_count: usize,
    /// Canonical URL, unique per article.
    pub url: String,
    #[serde(rename = "type")]
    pub article_type: ArticleType,
    pub tags: Vec<String>,
    pub translated: bool,
}

/// Accumulates extracted fields for one document.
///
/// The byline names are given once through [`ArticleBuilder::names`] and are
/// routed to authors or sources by the article type at build time.
#[derive(Debug, Default)]
pub struct ArticleBuilder {
    origin: String,
    title: Option<String>,
    subtitle: Option<String>,
    date: Option<NaiveDate>,
    names: Vec<String>,
    content_blocks: Option<Vec<String>>,
    url: Option<String>,
    article_type: Option<ArticleType>,
    tags: Vec<String>,
    translated: bool,
}

impl ArticleBuilder {
    /// Start a record for the document identified by `origin` (usually its path).
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Self::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Blank subtitles are stored as `None`.
    pub fn subtitle(mut self, subtitle: Option<String>) -> Self {
        self.subtitle = subtitle.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Byline names, in discovery order.
    pub fn names(mut self, names: Vec<String>) -> Self {
        self.names = names;
        self
    }

    pub fn content_blocks(mut self, blocks: Vec<String>) -> Self {
        self.content_blocks = Some(blocks);
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn article_type(mut self, article_type: ArticleType) -> Self {
        self.article_type = Some(article_type);
        self
    }

    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn translated(mut self, translated: bool) -> Self {
        self.translated = translated;
        self
    }

    fn missing(&self, field: &'static str) -> ExtractError {
        ExtractError::MissingField {
            field,
            origin: self.origin.clone(),
        }
    }

    /// Materialize the article.
    ///
    /// # Errors
    ///
    /// [`ExtractError::MissingField`] for the first required field that was
    /// never set (title, date, url, type, content).
    pub fn build(self) -> Result<Article, ExtractError> {
        let title = match self.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => return Err(self.missing("title")),
        };
        let date = self.date.ok_or_else(|| self.missing("date"))?;
        let url = match self.url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => return Err(self.missing("url")),
        };
        let article_type = self.article_type.ok_or_else(|| self.missing("type"))?;
        let blocks = self
            .content_blocks
            .as_ref()
            .ok_or_else(|| self.missing("content"))?;

        let content = blocks.join("\n");
        let content_no_tags = content_without_tags(blocks);
        let content_no_punc = remove_punctuation(&content_no_tags);
        let word_count = count_words(&content_no_punc);

        let names: Vec<String> = self
            .names
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unique()
            .collect();
        let (authors, sources) = match article_type {
            ArticleType::Opinion => (names, Vec::new()),
            ArticleType::News => (Vec::new(), names),
        };

        let tags = normalize_tags(self.tags);

        Ok(Article {
            title,
            subtitle: self.subtitle,
            date,
            authors,
            sources,
            content,
            content_no_tags,
            content_no_punc,
            word_count,
            url,
            article_type,
            tags,
            translated: self.translated,
        })
    }
}

/// One whitespace-collapsed plain-text line per non-empty block.
pub fn content_without_tags(blocks: &[String]) -> String {
    blocks
        .iter()
        .map(|block| collapse_whitespace(&strip_all(block)))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Lowercase `text` and replace every [`PUNCTUATION`] character with a space.
pub fn remove_punctuation(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if PUNCTUATION.contains(c) { ' ' } else { c })
        .collect()
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Trim, lowercase, drop blanks and duplicates, keep first-seen order.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .unique()
        .collect()
}
