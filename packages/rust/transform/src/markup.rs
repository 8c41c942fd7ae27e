//! Endnote upsert for the flat/legacy markup representation.

use std::sync::LazyLock;

use regex::{NoExpand, Regex};

use crate::ENDNOTE_CLASS;

/// Matches an existing endnote `<div>` through its closing tag.
/// Case-insensitive, non-greedy, may span multiple lines.
static ENDNOTE_DIV_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r#"(?is)<div\s+class="{ENDNOTE_CLASS}"[^>]*>.*?</div>"#
    ))
    .expect("valid regex")
});

/// Insert or replace the endnote block in a markup string.
///
/// Existing endnote spans are replaced with the fresh block; otherwise the
/// block is appended after a blank line, or stands alone when the input is
/// empty.
pub(crate) fn upsert_markup(html: &str, block: &str) -> String {
    if ENDNOTE_DIV_RE.is_match(html) {
        return ENDNOTE_DIV_RE.replace_all(html, NoExpand(block)).into_owned();
    }

    if html.is_empty() {
        block.to_string()
    } else {
        format!("{html}\n\n{block}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endnote_block;

    #[test]
    fn appends_after_blank_line() {
        let block = endnote_block("Test endnote content");
        let updated = upsert_markup("<p>Hello</p>", &block);
        assert_eq!(updated, format!("<p>Hello</p>\n\n{block}"));
    }

    #[test]
    fn empty_input_yields_block_exactly() {
        let block = endnote_block("Test endnote content");
        assert_eq!(upsert_markup("", &block), block);
    }

    #[test]
    fn replaces_existing_span_preserving_surroundings() {
        let stale = endnote_block("old");
        let block = endnote_block("new");
        let html = format!("<p>Before</p>\n{stale}\n<p>After</p>");

        let updated = upsert_markup(&html, &block);
        assert_eq!(updated, format!("<p>Before</p>\n{block}\n<p>After</p>"));
    }

    #[test]
    fn matches_case_insensitively_and_across_lines() {
        let html = "<p>Intro</p>\n<DIV class=\"gh-content-endnote\" data-type=\"4\">\nold\nlines\n</DIV>";
        let block = endnote_block("new");

        let updated = upsert_markup(html, &block);
        assert_eq!(updated, format!("<p>Intro</p>\n{block}"));
    }

    #[test]
    fn replaces_every_existing_span() {
        let stale = endnote_block("old");
        let block = endnote_block("new");
        let html = format!("{stale}\n<p>Middle</p>\n{stale}");

        let updated = upsert_markup(&html, &block);
        assert_eq!(updated, format!("{block}\n<p>Middle</p>\n{block}"));
    }

    #[test]
    fn dollar_signs_in_content_are_literal() {
        let stale = endnote_block("old");
        let block = endnote_block("costs $1 (or $0)");

        let updated = upsert_markup(&stale, &block);
        assert_eq!(updated, block);
    }

    #[test]
    fn other_divs_are_left_alone() {
        let block = endnote_block("content");
        let html = r#"<div class="callout">note</div>"#;

        let updated = upsert_markup(html, &block);
        assert_eq!(updated, format!("{html}\n\n{block}"));
    }
}
