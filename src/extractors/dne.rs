//! Daily News Egypt (WordPress template).
//!
//! Two quirks shape this extractor.
//!
//! The post title is emitted as `<h1 class="posttitle">…</h2>`, so the raw
//! text is repaired before parsing to make the `h2.posttitle` selector match.
//!
//! Attribution is scattered. An article may credit its writer through the
//! WordPress byline, through the author bio box, through a "By …" first
//! paragraph, or through a wire-service mention in that paragraph. All four
//! signals are collected (the bio box only when the byline is missing) and an
//! article with none of them is credited to the paper itself.

use super::transforms::{
    CDATA_CLOSE_MARKER, RELATED_POSTS_MARKER, resume_after_marker, truncate_at_marker,
};
use super::{element_text, og_url, optional_text, parse_date, required_text};
use crate::errors::ExtractError;
use crate::markup::{self, child_fragments, contents_text};
use crate::models::{Article, ArticleBuilder, ArticleType};
use crate::sanitize::{StripMode, strip_all, strip_tags};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use std::borrow::Cow;
use tracing::debug;

const TITLE: &str = "h2.posttitle";
const SUBTITLE: &str = "#postExcerpt";
const DATE: &str = ".metaStuff time";
const CRUMBS: &str = "#crumbs";
const CONTENT: &str = "div.entry";
const BYLINE: &str = "span[itemprop=\"author\"] a";
const AUTHOR_BIO: &str = "#authorBio .author-data h4 a";
const TAG_ITEMS: &str = "ul#metaStuff li";

const MISMATCHED_TITLE_OPEN: &str = "<h1 class=\"posttitle\"";
const REPAIRED_TITLE_OPEN: &str = "<h2 class=\"posttitle\"";
const TAGGED_WITH_LABEL: &str = "Tagged With:";
const DATE_FORMAT: &str = "%B %d, %Y";
const DEFAULT_CREDIT: &str = "Daily News Egypt";
/// Longer "By …" fragments are prose, not bylines.
const MAX_BYLINE_WORDS: usize = 5;

/// Unwrapped, not deleted: DNE wraps real paragraphs in layout divs.
const UNWRAPPED_TAGS: &[&str] = &["script", "br", "div"];

static BYLINE_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",|\band\b").expect("valid byline regex"));
static WIRE_SERVICES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:Reuters|AP|PA|ANP|AFP|DPA|ANSA|MENA)\b").expect("valid wire service regex")
});

/// Rewrite `<h1 class="posttitle">…</h2>` lines so the tags match.
pub fn repair_post_title(raw: &str) -> Cow<'_, str> {
    if !raw.contains(MISMATCHED_TITLE_OPEN) {
        return Cow::Borrowed(raw);
    }

    let mut repaired = String::with_capacity(raw.len());
    for line in raw.split_inclusive('\n') {
        let body = line.trim_end();
        match line.strip_prefix(MISMATCHED_TITLE_OPEN) {
            Some(rest) if body.ends_with("</h2>") => {
                repaired.push_str(REPAIRED_TITLE_OPEN);
                repaired.push_str(rest);
            }
            _ => repaired.push_str(line),
        }
    }
    Cow::Owned(repaired)
}

/// Lowercase prefixes that still open a proper name, e.g. `el-Sayed`.
const NAME_PARTICLES: &[&str] = &["al-", "el-"];

fn looks_like_name(token: &str) -> bool {
    let words = token.split_whitespace().count();
    words > 0
        && words <= MAX_BYLINE_WORDS
        && (token.chars().next().is_some_and(char::is_uppercase)
            || NAME_PARTICLES.iter().any(|particle| token.starts_with(particle)))
}

/// Names from a `By Jane Doe, John Smith and …` opening line.
pub fn article_byline(first_line: &str) -> Vec<String> {
    let Some(rest) = first_line
        .strip_prefix("By ")
        .or_else(|| first_line.strip_prefix("By\u{a0}"))
    else {
        return Vec::new();
    };

    BYLINE_SEPARATORS
        .split(rest)
        .map(str::trim)
        .filter(|token| looks_like_name(token))
        .map(str::to_string)
        .collect()
}

/// Wire services mentioned anywhere in the opening line, in order.
pub fn wire_credits(first_line: &str) -> Vec<String> {
    WIRE_SERVICES
        .find_iter(first_line)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// The byline link when present (even if blank), otherwise the author bio.
fn structured_credit(doc: &Html) -> Result<Option<String>, ExtractError> {
    let element = match markup::select_optional(doc, BYLINE)? {
        Some(element) => Some(element),
        None => markup::select_optional(doc, AUTHOR_BIO)?,
    };
    Ok(element
        .map(element_text)
        .filter(|name| !name.is_empty()))
}

fn credits(doc: &Html, first_line: &str) -> Result<Vec<String>, ExtractError> {
    let mut names: Vec<String> = structured_credit(doc)?.into_iter().collect();
    names.extend(article_byline(first_line));
    names.extend(wire_credits(first_line));

    if names.is_empty() {
        names.push(DEFAULT_CREDIT.to_string());
    }
    Ok(names)
}

fn tagged_with(doc: &Html) -> Result<Vec<String>, ExtractError> {
    let tagged: String = markup::select_all(doc, TAG_ITEMS)?
        .into_iter()
        .map(|item| item.html())
        .filter(|item| item.contains(TAGGED_WITH_LABEL))
        .map(|item| item.trim().to_string())
        .collect();

    Ok(strip_all(&tagged)
        .replace(TAGGED_WITH_LABEL, "")
        .split(',')
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect())
}

pub fn extract(html: &str, origin: &str) -> Result<Article, ExtractError> {
    let doc = markup::parse_document(&repair_post_title(html));

    let title = required_text(&doc, TITLE)?;
    let subtitle = optional_text(&doc, SUBTITLE)?;
    let date = parse_date(&element_text(markup::select_first(&doc, DATE)?), DATE_FORMAT)?;

    let crumbs = contents_text(markup::select_first(&doc, CRUMBS)?);
    let article_type = ArticleType::from_opinion_signal(crumbs.contains("Opinion"));

    let blocks: Vec<String> = child_fragments(markup::select_first(&doc, CONTENT)?)
        .iter()
        .map(|child| strip_tags(child, UNWRAPPED_TAGS, StripMode::Unwrap).trim().to_string())
        .filter(|block| !block.is_empty())
        .collect();
    let blocks = truncate_at_marker(blocks, RELATED_POSTS_MARKER);
    let blocks = resume_after_marker(blocks, CDATA_CLOSE_MARKER);

    let first_line = blocks.first().map(|block| strip_all(block)).unwrap_or_default();
    let names = credits(&doc, &first_line)?;

    let url = og_url(&doc)?;
    let tags = tagged_with(&doc)?;

    debug!(%url, blocks = blocks.len(), %article_type, names = ?names, "Extracted Daily News Egypt fields");

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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    struct Page<'a> {
        crumbs: &'a str,
        byline: &'a str,
        bio: &'a str,
        first_paragraph: &'a str,
    }

    impl Page<'_> {
        fn render(&self) -> String {
            format!(
                r#"<html><head>
<meta property="og:url" content="http://www.dailynewsegypt.com/2013/07/04/egypt-after-june-30/">
</head><body>
<div id="crumbs"><a href="/">Home</a> &raquo; {crumbs}</div>
<h1 class="posttitle">Egypt after <em>June 30</em></h2>
<div id="postExcerpt"><p>What comes next</p></div>
<p class="metaStuff">{byline} <time datetime="2013-07-04">July 4, 2013</time></p>
<div class="entry">
<div class="ad"><script type="text/javascript">//<![CDATA[
showAd('top');
//]]></script></div>
<p>{first_paragraph}</p>
<div class="pullquote"><p>Second paragraph <br>continues.</p></div>
<p>Related posts:<ul><li><a href="/old">Old story</a></li></ul></p>
</div>
{bio}
<ul id="metaStuff"><li>Posted in: Politics</li><li>Tagged With: <a>Army</a>, <a>Tamarod</a>, <a> Army</a></li></ul>
</body></html>"#,
                crumbs = self.crumbs,
                byline = self.byline,
                bio = self.bio,
                first_paragraph = self.first_paragraph,
            )
        }
    }

    const WITH_BYLINE: &str = r#"<span itemprop="author"><a href="/author/jd">Jane Doe</a></span>"#;
    const BIO: &str = r#"<div id="authorBio"><div class="author-data"><h4><a href="">Basil El-Dabh</a></h4></div></div>"#;

    #[test]
    fn test_repair_post_title() {
        let raw = "<body>\n<h1 class=\"posttitle\">Title</h2>\r\n<h1 class=\"posttitle\">Fine</h1>\n";
        assert_eq!(
            repair_post_title(raw),
            "<body>\n<h2 class=\"posttitle\">Title</h2>\r\n<h1 class=\"posttitle\">Fine</h1>\n"
        );
        assert!(matches!(repair_post_title("<h2>ok</h2>"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_article_byline_scenario() {
        assert_eq!(
            article_byline("By Jane Doe, John Smith and wire reports"),
            vec!["Jane Doe", "John Smith"]
        );
    }

    #[test]
    fn test_article_byline_rejects_prose() {
        assert!(article_byline("By the time marchers reached Tahrir Square it was dark").is_empty());
        assert!(article_byline("Protesters gathered By noon").is_empty());
        assert_eq!(article_byline("By\u{a0}Rana Muhammad Taha"), vec!["Rana Muhammad Taha"]);
    }

    #[test]
    fn test_article_byline_name_particles() {
        assert_eq!(
            article_byline("By Jane Doe and el-Sayed Gamal"),
            vec!["Jane Doe", "el-Sayed Gamal"]
        );
        assert_eq!(article_byline("By al-Masry al-Youm"), vec!["al-Masry al-Youm"]);
        assert!(article_byline("By staff and wire reports").is_empty());
    }

    #[test]
    fn test_wire_credits_whole_words() {
        assert_eq!(
            wire_credits("CAIRO (Reuters) - Officials told AFP and MENA that JAPAN's APEC envoy"),
            vec!["Reuters", "AFP", "MENA"]
        );
    }

    #[test]
    fn test_extract_opinion_scenario() {
        let html = Page {
            crumbs: "<a href=\"/opinion/\">Opinion</a>",
            byline: WITH_BYLINE,
            bio: "",
            first_paragraph: "By Jane Doe, John Smith and wire reports",
        }
        .render();
        let article = extract(&html, "dne.html").unwrap();

        assert_eq!(article.title, "Egypt after June 30");
        assert_eq!(article.subtitle.as_deref(), Some("What comes next"));
        assert_eq!(article.date, NaiveDate::from_ymd_opt(2013, 7, 4).unwrap());
        assert_eq!(article.article_type, ArticleType::Opinion);
        assert_eq!(article.authors, vec!["Jane Doe", "John Smith"]);
        assert!(article.sources.is_empty());
        assert_eq!(article.tags, vec!["army", "tamarod"]);
        assert_eq!(
            article.url,
            "http://www.dailynewsegypt.com/2013/07/04/egypt-after-june-30/"
        );
        assert!(!article.translated);
    }

    #[test]
    fn test_content_cleanup() {
        let html = Page {
            crumbs: "Politics",
            byline: "",
            bio: "",
            first_paragraph: "The army deployed.",
        }
        .render();
        let article = extract(&html, "dne.html").unwrap();

        assert_eq!(
            article.content,
            "<p>The army deployed.</p>\n<p>Second paragraph continues.</p>"
        );
        assert!(!article.content.contains("showAd"));
        assert!(!article.content.contains("Related posts"));
        assert_eq!(article.word_count, 6);
    }

    #[test]
    fn test_wire_credit_news() {
        let html = Page {
            crumbs: "<a href=\"/egypt/\">Egypt</a>",
            byline: "",
            bio: "",
            first_paragraph: "CAIRO (Reuters) - The army said on Thursday, AFP reported.",
        }
        .render();
        let article = extract(&html, "dne.html").unwrap();

        assert_eq!(article.article_type, ArticleType::News);
        assert_eq!(article.sources, vec!["Reuters", "AFP"]);
        assert!(article.authors.is_empty());
    }

    #[test]
    fn test_author_bio_used_without_byline() {
        let html = Page {
            crumbs: "Business",
            byline: "",
            bio: BIO,
            first_paragraph: "Markets rallied.",
        }
        .render();
        let article = extract(&html, "dne.html").unwrap();
        assert_eq!(article.sources, vec!["Basil El-Dabh"]);
    }

    #[test]
    fn test_byline_beats_author_bio() {
        let html = Page {
            crumbs: "Business",
            byline: WITH_BYLINE,
            bio: BIO,
            first_paragraph: "Markets rallied.",
        }
        .render();
        let article = extract(&html, "dne.html").unwrap();
        assert_eq!(article.sources, vec!["Jane Doe"]);
    }

    #[test]
    fn test_blank_byline_does_not_fall_back_to_bio() {
        let html = Page {
            crumbs: "Business",
            byline: r#"<span itemprop="author"><a href="/author/"> </a></span>"#,
            bio: BIO,
            first_paragraph: "Markets rallied.",
        }
        .render();
        let article = extract(&html, "dne.html").unwrap();
        assert_eq!(article.sources, vec![DEFAULT_CREDIT]);
    }

    #[test]
    fn test_default_credit() {
        let html = Page {
            crumbs: "Politics",
            byline: "",
            bio: "",
            first_paragraph: "By the time marchers reached Tahrir Square it was already dark",
        }
        .render();
        let article = extract(&html, "dne.html").unwrap();
        assert_eq!(article.sources, vec![DEFAULT_CREDIT]);
    }

    #[test]
    fn test_missing_title_is_structural() {
        let html = Page {
            crumbs: "Politics",
            byline: "",
            bio: "",
            first_paragraph: "x",
        }
        .render()
        .replace("posttitle", "entry-title");
        let err = extract(&html, "dne.html").unwrap_err();
        assert!(matches!(err, ExtractError::MissingElement { selector } if selector == TITLE));
    }
}
