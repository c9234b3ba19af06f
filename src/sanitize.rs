//! Fragment sanitizing: tag stripping and plain-text reduction.
//!
//! Every function takes and returns serialized HTML so the extractors can
//! work on independent content blocks without holding borrows into the
//! source document.

use scraper::{Html, Node};

/// How [`strip_tags`] treats a matched tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripMode {
    /// Remove the tag and everything inside it.
    Delete,
    /// Remove only the tag, keeping its children in place.
    Unwrap,
}

/// Reduce a fragment to plain text.
///
/// Every text node is trimmed, blank ones are dropped, and the rest are joined
/// with single spaces.
pub fn strip_all(fragment: &str) -> String {
    let html = Html::parse_fragment(fragment);
    html.root_element()
        .text()
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Remove the named tags from a fragment according to `mode`.
pub fn strip_tags(fragment: &str, tag_names: &[&str], mode: StripMode) -> String {
    let mut html = Html::parse_fragment(fragment);

    let targets: Vec<_> = html
        .tree
        .root()
        .descendants()
        .filter(|node| {
            matches!(
                node.value(),
                Node::Element(element) if tag_names.contains(&element.name())
            )
        })
        .map(|node| node.id())
        .collect();

    for id in targets {
        let children: Vec<_> = match html.tree.get(id) {
            Some(node) => node.children().map(|child| child.id()).collect(),
            None => continue,
        };
        let Some(mut node) = html.tree.get_mut(id) else {
            continue;
        };
        if mode == StripMode::Unwrap {
            for child in children {
                node.insert_id_before(child);
            }
        }
        node.detach();
    }

    html.root_element().inner_html()
}

/// Collapse every whitespace run to a single space and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_all() {
        let fragment = "<p>  Cairo <b>protests</b>\n continue </p><p></p><p> today</p>";
        assert_eq!(strip_all(fragment), "Cairo protests continue today");
    }

    #[test]
    fn test_strip_all_plain_text() {
        assert_eq!(strip_all("Search Keywords: Egypt | Morsi"), "Search Keywords: Egypt | Morsi");
        assert_eq!(strip_all(""), "");
    }

    #[test]
    fn test_strip_tags_delete() {
        let fragment = "<p>Text<script>var x = 1;</script><br>more</p><div>gone <b>too</b></div>";
        assert_eq!(
            strip_tags(fragment, &["script", "style", "br", "div"], StripMode::Delete),
            "<p>Textmore</p>"
        );
    }

    #[test]
    fn test_strip_tags_unwrap() {
        let fragment = "<div class=\"wrap\"><p>First</p><div><p>Second</p></div></div>";
        assert_eq!(
            strip_tags(fragment, &["div"], StripMode::Unwrap),
            "<p>First</p><p>Second</p>"
        );
    }

    #[test]
    fn test_strip_tags_unwrap_escapes_script_text() {
        let fragment = "<script>//<![CDATA[\nx();\n//]]></script><p>Body</p>";
        let stripped = strip_tags(fragment, &["script"], StripMode::Unwrap);
        assert!(stripped.contains("//]]&gt;"));
        assert!(stripped.ends_with("<p>Body</p>"));
    }

    #[test]
    fn test_strip_tags_leaves_other_tags() {
        let fragment = "<p><a href=\"/x\">link</a></p>";
        assert_eq!(strip_tags(fragment, &["div"], StripMode::Unwrap), fragment);
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b  c "), "a b c");
    }
}
