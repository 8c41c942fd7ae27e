//! Endnote block transformation for post content.
//!
//! Pure functions that take one post's content and produce an updated
//! version with the endnote block inserted or replaced:
//! - [`endnote_block`] — render the marker block for a content string
//! - [`classify`] — pick the representation to transform
//! - [`apply_endnote`] — upsert the block into that representation
//!
//! No I/O happens here; the store client writes the result back.

mod lexical;
mod markup;

use tracing::debug;

use postnote_shared::{PostRecord, Result};

/// Class attribute that marks an endnote block so later runs can find it.
pub const ENDNOTE_CLASS: &str = "gh-content-endnote";

/// Render the endnote HTML block for the given content string.
pub fn endnote_block(content: &str) -> String {
    format!(r#"<div class="{ENDNOTE_CLASS}" data-type="4">{content}</div>"#)
}

// ---------------------------------------------------------------------------
// Representation classification
// ---------------------------------------------------------------------------

/// The content representation selected for a post.
///
/// Exactly one representation drives the transform. Lexical is preferred;
/// mobiledoc posts are edited through their rendered markup, which the
/// store regenerates from on write; html-only posts are edited directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceContent {
    /// Structured-tree content (serialized lexical JSON).
    Lexical(String),
    /// Rendered markup of a mobiledoc-backed post.
    LegacyMarkup(String),
    /// Flat markup content. Empty for posts with no content at all.
    Markup(String),
}

/// The updated content, tagged with the field to write back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdatedContent {
    Lexical(String),
    Html(String),
}

/// Select the representation to transform, by precedence:
/// lexical > mobiledoc (via rendered html) > html.
///
/// Empty strings count as absent, and a post with no populated content
/// field classifies as empty markup so the transform yields exactly the
/// endnote block.
pub fn classify(post: &PostRecord) -> SourceContent {
    if let Some(lexical) = non_empty(&post.lexical) {
        SourceContent::Lexical(lexical.to_string())
    } else if non_empty(&post.mobiledoc).is_some() {
        SourceContent::LegacyMarkup(post.html.clone().unwrap_or_default())
    } else {
        SourceContent::Markup(post.html.clone().unwrap_or_default())
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Transform entry point
// ---------------------------------------------------------------------------

/// Insert or replace the endnote block in the selected representation.
///
/// Idempotent: feeding the output back in yields the same result. A
/// lexical payload that cannot be parsed fails with a malformed-content
/// error rather than corrupting the tree.
pub fn apply_endnote(source: &SourceContent, block: &str) -> Result<UpdatedContent> {
    match source {
        SourceContent::Lexical(lexical) => {
            debug!(len = lexical.len(), "upserting endnote card into lexical tree");
            Ok(UpdatedContent::Lexical(lexical::upsert_html_card(
                lexical, block,
            )?))
        }
        SourceContent::LegacyMarkup(html) | SourceContent::Markup(html) => {
            debug!(len = html.len(), "upserting endnote block into markup");
            Ok(UpdatedContent::Html(markup::upsert_markup(html, block)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(lexical: Option<&str>, mobiledoc: Option<&str>, html: Option<&str>) -> PostRecord {
        PostRecord {
            id: "p1".into(),
            title: "Post One".into(),
            slug: None,
            url: None,
            updated_at: "2024-05-01T10:00:00.000Z".into(),
            lexical: lexical.map(String::from),
            mobiledoc: mobiledoc.map(String::from),
            html: html.map(String::from),
        }
    }

    #[test]
    fn block_carries_discriminator() {
        let block = endnote_block("Thanks for reading!");
        assert!(block.contains(r#"class="gh-content-endnote""#));
        assert!(block.contains("Thanks for reading!"));
    }

    #[test]
    fn classify_prefers_lexical() {
        let source = classify(&post(
            Some(r#"{"root":{"children":[]}}"#),
            Some("{}"),
            Some("<p>hi</p>"),
        ));
        assert!(matches!(source, SourceContent::Lexical(_)));
    }

    #[test]
    fn classify_mobiledoc_uses_rendered_html() {
        let source = classify(&post(None, Some("{}"), Some("<p>hi</p>")));
        assert_eq!(source, SourceContent::LegacyMarkup("<p>hi</p>".into()));
    }

    #[test]
    fn classify_html_only() {
        let source = classify(&post(None, None, Some("<p>hi</p>")));
        assert_eq!(source, SourceContent::Markup("<p>hi</p>".into()));
    }

    #[test]
    fn classify_empty_post_falls_back_to_empty_markup() {
        let source = classify(&post(None, None, None));
        assert_eq!(source, SourceContent::Markup(String::new()));
    }

    #[test]
    fn classify_treats_empty_lexical_as_absent() {
        let source = classify(&post(Some(""), None, Some("<p>hi</p>")));
        assert_eq!(source, SourceContent::Markup("<p>hi</p>".into()));
    }

    #[test]
    fn empty_post_transforms_to_exactly_the_block() {
        let block = endnote_block("Test endnote content");
        let updated = apply_endnote(&SourceContent::Markup(String::new()), &block).unwrap();
        assert_eq!(updated, UpdatedContent::Html(block));
    }

    #[test]
    fn transform_is_idempotent_across_representations() {
        let block = endnote_block("Test endnote content");

        let once = apply_endnote(&SourceContent::Markup("<p>Body</p>".into()), &block).unwrap();
        let UpdatedContent::Html(html_once) = once.clone() else {
            panic!("expected html");
        };
        let twice = apply_endnote(&SourceContent::Markup(html_once), &block).unwrap();
        assert_eq!(once, twice);

        let lexical = r#"{"root":{"children":[{"type":"paragraph","children":[]}]}}"#;
        let once = apply_endnote(&SourceContent::Lexical(lexical.into()), &block).unwrap();
        let UpdatedContent::Lexical(lexical_once) = once.clone() else {
            panic!("expected lexical");
        };
        let twice = apply_endnote(&SourceContent::Lexical(lexical_once), &block).unwrap();
        assert_eq!(once, twice);
    }
}
