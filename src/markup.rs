//! Markup loading and selector helpers.
//!
//! Documents are parsed with `scraper` (html5ever underneath), which follows
//! the browser recovery rules: unclosed `<div>`s are closed at the end of
//! their parent, and a stray `</h2>` closes an open `<h1>`. Parsing itself
//! never fails, so every failure the extractors report comes from a selector
//! that did not match.
//!
//! The helpers here turn "no match" into [`ExtractError`] values that name the
//! selector, which is what ends up in the quarantine log line.

use crate::errors::ExtractError;
use crate::sanitize::strip_all;
use scraper::{ElementRef, Html, Node, Selector};

/// Parse a full HTML document.
pub fn parse_document(text: &str) -> Html {
    Html::parse_document(text)
}

fn selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|_| ExtractError::InvalidSelector(css.to_string()))
}

/// All elements of `doc` matching `css`, in document order.
pub fn select_all<'a>(doc: &'a Html, css: &str) -> Result<Vec<ElementRef<'a>>, ExtractError> {
    let selector = selector(css)?;
    Ok(doc.select(&selector).collect())
}

/// First element of `doc` matching `css`.
///
/// # Errors
///
/// [`ExtractError::MissingElement`] when nothing matches.
pub fn select_first<'a>(doc: &'a Html, css: &str) -> Result<ElementRef<'a>, ExtractError> {
    let selector = selector(css)?;
    doc.select(&selector)
        .next()
        .ok_or_else(|| ExtractError::MissingElement {
            selector: css.to_string(),
        })
}

/// Like [`select_first`] but tolerates absence.
pub fn select_optional<'a>(doc: &'a Html, css: &str) -> Result<Option<ElementRef<'a>>, ExtractError> {
    let selector = selector(css)?;
    Ok(doc.select(&selector).next())
}

/// Attribute value of the first element matching `css`.
pub fn attr(doc: &Html, css: &str, name: &'static str) -> Result<String, ExtractError> {
    let element = select_first(doc, css)?;
    element
        .value()
        .attr(name)
        .map(str::to_string)
        .ok_or_else(|| ExtractError::MissingAttribute {
            selector: css.to_string(),
            attribute: name,
        })
}

/// Detach every comment node in the document.
pub fn remove_comments(doc: &mut Html) {
    let comments: Vec<_> = doc
        .tree
        .root()
        .descendants()
        .filter(|node| node.value().is_comment())
        .map(|node| node.id())
        .collect();

    for id in comments {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// Detach every element matching `css`, returning their outer HTML in
/// document order.
pub fn detach_matching(doc: &mut Html, css: &str) -> Result<Vec<String>, ExtractError> {
    let selector = selector(css)?;
    let matches: Vec<_> = doc
        .select(&selector)
        .map(|element| (element.id(), element.html()))
        .collect();

    let mut removed = Vec::with_capacity(matches.len());
    for (id, html) in matches {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
        removed.push(html);
    }
    Ok(removed)
}

/// Serialize each immediate child of `element` as an HTML fragment.
///
/// Text children made only of line breaks are skipped.
pub fn child_fragments(element: ElementRef<'_>) -> Vec<String> {
    element
        .children()
        .filter_map(|child| match child.value() {
            Node::Element(_) => ElementRef::wrap(child).map(|el| el.html()),
            Node::Text(text) => {
                if text.chars().all(|c| c == '\n' || c == '\r') {
                    None
                } else {
                    Some(escape_text(text))
                }
            }
            Node::Comment(comment) => Some(format!("<!--{}-->", &**comment)),
            _ => None,
        })
        .collect()
}

/// Immediate child fragments, each trimmed, joined by single spaces.
pub fn joined_contents(element: ElementRef<'_>) -> String {
    child_fragments(element)
        .iter()
        .map(|fragment| fragment.trim())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Plain text of an element's contents.
pub fn contents_text(element: ElementRef<'_>) -> String {
    strip_all(&joined_contents(element))
}

/// Escape a text node the same way html5ever serializes one.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovers_from_unclosed_div() {
        let doc = parse_document(
            "<html><body><div id=\"content\"><p>One</p><p>Two</p></body></html>",
        );
        let content = select_first(&doc, "#content").unwrap();
        assert_eq!(content.select(&Selector::parse("p").unwrap()).count(), 2);
    }

    #[test]
    fn test_recovers_from_mismatched_heading() {
        let doc = parse_document("<h1 class=\"posttitle\">Title</h2><p>After</p>");
        let title = select_first(&doc, "h1.posttitle").unwrap();
        assert_eq!(title.text().collect::<String>(), "Title");
        assert!(select_first(&doc, "p").is_ok());
    }

    #[test]
    fn test_select_first_names_missing_selector() {
        let doc = parse_document("<p>nothing here</p>");
        let err = select_first(&doc, ".pane-node-title div").unwrap_err();
        match err {
            ExtractError::MissingElement { selector } => {
                assert_eq!(selector, ".pane-node-title div")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_attr_missing() {
        let doc = parse_document("<meta property=\"og:url\">");
        let err = attr(&doc, "meta[property=\"og:url\"]", "content").unwrap_err();
        assert!(matches!(err, ExtractError::MissingAttribute { attribute: "content", .. }));
    }

    #[test]
    fn test_remove_comments() {
        let mut doc = parse_document("<div id=\"x\"><!-- [if gte mso 9]> cruft --><p>Kept</p></div>");
        remove_comments(&mut doc);
        let div = select_first(&doc, "#x").unwrap();
        assert_eq!(div.inner_html(), "<p>Kept</p>");
    }

    #[test]
    fn test_detach_matching() {
        let mut doc = Html::parse_fragment(
            "<p>Body</p><div class=\"search_word\">Search Keywords: Egypt</div><p>End</p>",
        );
        let removed = detach_matching(&mut doc, ".search_word").unwrap();
        assert_eq!(removed, vec!["<div class=\"search_word\">Search Keywords: Egypt</div>"]);
        assert_eq!(doc.root_element().inner_html(), "<p>Body</p><p>End</p>");
    }

    #[test]
    fn test_child_fragments_skip_newlines() {
        let doc = parse_document("<div id=\"x\">\n<p>A &amp; B</p>\nloose text\n<br></div>");
        let div = select_first(&doc, "#x").unwrap();
        let fragments = child_fragments(div);
        assert_eq!(
            fragments,
            vec!["<p>A &amp; B</p>", "\nloose text\n", "<br>"]
        );
    }

    #[test]
    fn test_contents_text() {
        let doc = parse_document("<div id=\"x\"> <span>Egypt</span>\n <em>today</em> </div>");
        let div = select_first(&doc, "#x").unwrap();
        assert_eq!(contents_text(div), "Egypt today");
    }
}
