//! Core domain types for Postnote migrations.

use serde::{Deserialize, Serialize};

/// One post as fetched from the Admin API browse endpoint.
///
/// `updated_at` is the optimistic-concurrency stamp: it is carried as an
/// opaque string and echoed verbatim on write-back, where a stale value is
/// rejected by the store. At most one of `lexical` / `mobiledoc` / `html`
/// drives the transform; precedence is lexical > mobiledoc > html, with
/// mobiledoc posts transformed through their rendered `html`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRecord {
    /// Store identifier.
    pub id: String,
    /// Post title, used to tag per-post errors.
    #[serde(default)]
    pub title: String,
    /// URL slug.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Public URL, when the store includes it in browse responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Last-modified stamp, echoed on write-back.
    pub updated_at: String,
    /// Structured-tree content (serialized lexical JSON).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lexical: Option<String>,
    /// Legacy-section content marker; such posts are edited via `html`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobiledoc: Option<String>,
    /// Flat markup content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

impl PostRecord {
    /// Best available label for logs and error tagging.
    pub fn label(&self) -> &str {
        if self.title.is_empty() { &self.id } else { &self.title }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_browse_shape() {
        let json = r#"{
            "id": "63887a7e1f33a2001cb5c2c1",
            "title": "Welcome",
            "slug": "welcome",
            "url": "https://demo.ghost.io/welcome/",
            "updated_at": "2024-05-01T10:00:00.000Z",
            "lexical": "{\"root\":{\"children\":[]}}",
            "html": null
        }"#;

        let post: PostRecord = serde_json::from_str(json).expect("deserialize");
        assert_eq!(post.id, "63887a7e1f33a2001cb5c2c1");
        assert_eq!(post.label(), "Welcome");
        assert!(post.lexical.is_some());
        assert!(post.html.is_none());
        assert!(post.mobiledoc.is_none());
    }

    #[test]
    fn label_falls_back_to_id() {
        let json = r#"{"id": "abc123", "updated_at": "2024-05-01T10:00:00.000Z"}"#;
        let post: PostRecord = serde_json::from_str(json).expect("deserialize");
        assert_eq!(post.label(), "abc123");
    }
}
