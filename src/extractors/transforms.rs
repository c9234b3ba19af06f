//! Literal-marker text transforms applied to content block lists.
//!
//! Each template leaves some boilerplate inside its content container that
//! can only be recognized by a fixed piece of text. These functions cut that
//! boilerplate out of a list of serialized blocks.

/// Text node separating al-Ahram article content from its short-link box.
pub const SHORT_LINK_MARKER: &str = "Short link:";

/// Start of the "Related posts" list WordPress appends to DNE articles.
pub const RELATED_POSTS_MARKER: &str = "<p>Related posts:";

/// Escaped end of an inline script CDATA section, left behind once DNE's
/// `<script>` wrappers are unwrapped.
pub const CDATA_CLOSE_MARKER: &str = "//]]&gt;";

/// Split `items` into the runs of items between marker items.
///
/// An item is a marker when its trimmed text equals `marker`. Empty runs are
/// dropped, so leading, trailing, or repeated markers never produce empty
/// segments.
pub fn split_on_marker_item(items: &[String], marker: &str) -> Vec<Vec<String>> {
    items
        .split(|item| item.trim() == marker)
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.to_vec())
        .collect()
}

/// Keep only what precedes the first occurrence of `marker`.
///
/// The block holding the marker keeps its text before the marker (dropped if
/// blank) and every later block is discarded.
pub fn truncate_at_marker(blocks: Vec<String>, marker: &str) -> Vec<String> {
    let mut kept = Vec::with_capacity(blocks.len());
    for block in blocks {
        if let Some((before, _)) = block.split_once(marker) {
            if !before.trim().is_empty() {
                kept.push(before.trim_end().to_string());
            }
            break;
        }
        kept.push(block);
    }
    kept
}

/// Keep only what follows the first occurrence of `marker`.
///
/// Without a marker the blocks come back untouched.
pub fn resume_after_marker(blocks: Vec<String>, marker: &str) -> Vec<String> {
    let Some(position) = blocks.iter().position(|block| block.contains(marker)) else {
        return blocks;
    };

    let mut rest = blocks.into_iter().skip(position);
    let mut kept = Vec::new();
    if let Some(first) = rest.next() {
        if let Some((_, after)) = first.split_once(marker) {
            if !after.trim().is_empty() {
                kept.push(after.trim_start().to_string());
            }
        }
    }
    kept.extend(rest);
    kept
}
