//! al-Ahram English (ASP.NET template).
//!
//! al-Ahram's markup is the least semantic of the three:
//!
//! - sources and the publication date share one text blob, separated
//!   inconsistently by commas, the word "and", or double spaces
//! - the article body, the keyword list, and the short-link box all live in
//!   the same container, with only the literal text `Short link:` between
//!   body and link box
//! - the canonical URL is only available as that short link, which is
//!   sometimes a full URL and sometimes just an article number
//! - Word-generated HTML comments are scattered through the body
//!
//! Parenthesized qualifiers such as `Egyptian Elections Watch (Ahram Online
//! and Jadaliyya)` are deliberately flattened into independent sources.

use super::transforms::{SHORT_LINK_MARKER, split_on_marker_item};
use super::{element_text, optional_text, parse_date, required_text};
use crate::errors::ExtractError;
use crate::markup::{self, child_fragments, contents_text};
use crate::models::{Article, ArticleBuilder, ArticleType};
use crate::sanitize::{StripMode, strip_all, strip_tags};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use tracing::debug;
use url::Url;

const TITLE: &str = "#ContentPlaceHolder1_hd";
const SUBTITLE: &str = "#ContentPlaceHolder1_bref";
const SOURCE_AND_DATE: &str = "#ContentPlaceHolder1_source";
const CONTENT: &str = "#ContentPlaceHolder1_divContent";
const KEYWORDS: &str = ".search_word";
const PAGE_TITLE: &str = "title";

const KEYWORDS_LABEL: &str = "Search Keywords:";
const OPINION_TITLE_MARKER: &str = "Opinion -";
const DATE_FORMAT: &str = "%A %d %b %Y";
const SHORT_LINK_BASE: &str = "http://english.ahram.org.eg/News/";

/// Tags removed, with their contents, from every body block.
const STRIPPED_TAGS: &[&str] = &["script", "style", "br", "div"];

static NAME_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",|\band\b| {2,}").expect("valid separator regex"));
static PARENTHESES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[()]").expect("valid regex"));
static SHORT_LINK_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"value="([^"]*)""#).expect("valid short link regex"));
static NON_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\D+").expect("valid regex"));

/// Split the combined source/date text into names and the trailing date text.
///
/// ```ignore
/// let (names, date) = split_source_and_date("Reuters and Ahram Online (Jadaliyya), Mon 5 Aug 2013");
/// assert_eq!(names, ["Reuters", "Ahram Online", "Jadaliyya"]);
/// assert_eq!(date, "Mon 5 Aug 2013");
/// ```
pub fn split_source_and_date(blob: &str) -> (Vec<String>, String) {
    let flattened = PARENTHESES.replace_all(blob, " ");
    let mut tokens: Vec<&str> = NAME_SEPARATORS.split(&flattened).collect();
    let date = tokens.pop().unwrap_or_default().trim().to_string();
    let names = tokens
        .into_iter()
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect();
    (names, date)
}

/// Turn a short-link input value into the article URL.
///
/// Full http(s) URLs are returned as-is; anything else is reduced to its
/// digits and slotted into the numbered article URL. `None` when no digits
/// remain.
pub fn resolve_short_link(value: &str) -> Option<String> {
    let value = value.trim();
    if let Ok(url) = Url::parse(value) {
        if matches!(url.scheme(), "http" | "https") {
            return Some(value.to_string());
        }
    }
    let digits = NON_DIGITS.replace_all(value, "");
    if digits.is_empty() {
        None
    } else {
        Some(format!("{SHORT_LINK_BASE}{digits}.aspx"))
    }
}

/// Keyword list text to tags.
pub fn parse_keywords(keywords_html: &str) -> Vec<String> {
    strip_all(keywords_html)
        .replace(KEYWORDS_LABEL, "")
        .split('|')
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect()
}

fn flatten_whitespace(fragment: &str) -> String {
    fragment
        .replace(['\n', '\t'], "")
        .replace("&nbsp;", " ")
        .replace('\u{a0}', " ")
}

fn short_link_url(link_block: &[String]) -> Result<String, ExtractError> {
    let raw = link_block.concat();
    let value = SHORT_LINK_VALUE
        .captures(&raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| ExtractError::MissingAttribute {
            selector: format!("{CONTENT} short link"),
            attribute: "value",
        })?;
    resolve_short_link(value).ok_or_else(|| ExtractError::EmptyElement {
        selector: format!("{CONTENT} short link"),
    })
}

pub fn extract(html: &str, origin: &str) -> Result<Article, ExtractError> {
    let mut doc = markup::parse_document(html);
    markup::remove_comments(&mut doc);

    let title = required_text(&doc, TITLE)?;
    let subtitle = optional_text(&doc, SUBTITLE)?;

    let blob = contents_text(markup::select_first(&doc, SOURCE_AND_DATE)?);
    let (names, date_text) = split_source_and_date(&blob);
    let date = parse_date(&date_text, DATE_FORMAT)?;

    let page_title = element_text(markup::select_first(&doc, PAGE_TITLE)?);
    let article_type = ArticleType::from_opinion_signal(page_title.contains(OPINION_TITLE_MARKER));

    let items: Vec<String> = child_fragments(markup::select_first(&doc, CONTENT)?)
        .iter()
        .map(|item| flatten_whitespace(item))
        .filter(|item| !item.is_empty())
        .collect();
    let mut segments = split_on_marker_item(&items, SHORT_LINK_MARKER).into_iter();
    let body = segments.next().ok_or_else(|| ExtractError::EmptyElement {
        selector: CONTENT.to_string(),
    })?;
    let link_block = segments.next().ok_or_else(|| ExtractError::MissingElement {
        selector: format!("{CONTENT} short link"),
    })?;

    let mut body_fragment = Html::parse_fragment(&body.join("\n"));
    let keywords = markup::detach_matching(&mut body_fragment, KEYWORDS)?;
    let tags = keywords
        .first()
        .map(|html| parse_keywords(html))
        .unwrap_or_default();

    let blocks: Vec<String> = child_fragments(body_fragment.root_element())
        .iter()
        .map(|block| strip_tags(block, STRIPPED_TAGS, StripMode::Delete))
        .filter(|block| !block.trim().is_empty())
        .collect();

    let url = short_link_url(&link_block)?;

    debug!(%url, blocks = blocks.len(), %article_type, "Extracted al-Ahram fields");

    ArticleBuilder::new(origin)
        .title(title)
        .subtitle(subtitle)
        .date(date)
        .names(names)
        .content_blocks(blocks)
        .url(url)
        .article_type(article_type)
        .tags(tags)
        .translated(false)
        .build()
}
