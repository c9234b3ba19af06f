//! Egypt Independent (Drupal panels template).
//!
//! The cleanest of the three templates: every field lives in its own
//! `field-field-*` block and the canonical URL is published through
//! OpenGraph. Egypt Independent also marks translated pieces in their last
//! paragraph, which is where the `translated` flag comes from.

use super::{element_text, og_url, parse_date, required_text};
use crate::errors::ExtractError;
use crate::markup::{self, child_fragments};
use crate::models::{Article, ArticleBuilder, ArticleType};
use crate::sanitize::{StripMode, strip_tags};
use scraper::Html;
use tracing::debug;

const TITLE: &str = ".pane-node-title div";
const SOURCES: &str = ".field-field-source .field-items a";
const AUTHORS: &str = ".field-field-author .field-items a";
const DATE: &str = ".field-field-published-date span";
const TAGS: &str = ".view-free-tags .field-content a";
const CONTENT: &str = ".pane-node-body div";

const DATE_FORMAT: &str = "%a, %d/%m/%Y - %H:%M";

fn link_texts(doc: &Html, css: &str) -> Result<Vec<String>, ExtractError> {
    Ok(markup::select_all(doc, css)?
        .into_iter()
        .map(element_text)
        .filter(|text| !text.is_empty())
        .collect())
}

pub fn extract(html: &str, origin: &str) -> Result<Article, ExtractError> {
    let doc = markup::parse_document(html);

    let title = required_text(&doc, TITLE)?;
    let date = parse_date(&element_text(markup::select_first(&doc, DATE)?), DATE_FORMAT)?;

    let url = og_url(&doc)?;
    let article_type = ArticleType::from_opinion_signal(url.contains("/opinion/"));

    // The site files columnists under "author" and wire credits under
    // "source"; whichever matches the type wins, the other is the fallback.
    let authors = link_texts(&doc, AUTHORS)?;
    let sources = link_texts(&doc, SOURCES)?;
    let (preferred, fallback) = match article_type {
        ArticleType::Opinion => (authors, sources),
        ArticleType::News => (sources, authors),
    };
    let names = if preferred.is_empty() { fallback } else { preferred };

    let tags = markup::select_all(&doc, TAGS)?
        .into_iter()
        .map(element_text)
        .collect();

    let blocks: Vec<String> = child_fragments(markup::select_first(&doc, CONTENT)?)
        .iter()
        .map(|block| strip_tags(block, &["script", "style"], StripMode::Delete))
        .filter(|block| !block.trim().is_empty())
        .collect();
    let translated = blocks
        .last()
        .ok_or_else(|| ExtractError::EmptyElement {
            selector: CONTENT.to_string(),
        })?
        .contains("translat");

    debug!(%url, blocks = blocks.len(), %article_type, "Extracted Egypt Independent fields");

    ArticleBuilder::new(origin)
        .title(title)
        .subtitle(None)
        .date(date)
        .names(names)
        .content_blocks(blocks)
        .url(url)
        .article_type(article_type)
        .tags(tags)
        .translated(translated)
        .build()
}
