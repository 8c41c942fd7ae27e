//! Endnote upsert for the lexical (structured-tree) representation.

use serde_json::{Value, json};

use postnote_shared::{PostnoteError, Result};

use crate::ENDNOTE_CLASS;

/// Insert or replace the endnote HTML card in a serialized lexical document.
///
/// The document root must hold an ordered `root.children` array. An
/// existing endnote card (an `html` child whose markup carries the
/// endnote class) is replaced in place, preserving its position; when
/// several exist, only the first is replaced. Without one, a fresh card
/// is appended as the last child.
pub(crate) fn upsert_html_card(lexical: &str, block: &str) -> Result<String> {
    let mut doc: Value = serde_json::from_str(lexical)
        .map_err(|e| PostnoteError::malformed(format!("lexical is not valid JSON: {e}")))?;

    let children = doc
        .get_mut("root")
        .and_then(|root| root.get_mut("children"))
        .and_then(Value::as_array_mut)
        .ok_or_else(|| PostnoteError::malformed("lexical document has no root.children array"))?;

    let card = json!({
        "type": "html",
        "version": 1,
        "html": block,
    });

    let needle = format!(r#"class="{ENDNOTE_CLASS}""#);
    match children.iter().position(|child| is_endnote_card(child, &needle)) {
        Some(index) => children[index] = card,
        None => children.push(card),
    }

    serde_json::to_string_pretty(&doc)
        .map_err(|e| PostnoteError::malformed(format!("lexical serialization failed: {e}")))
}

fn is_endnote_card(child: &Value, needle: &str) -> bool {
    child.get("type").and_then(Value::as_str) == Some("html")
        && child
            .get("html")
            .and_then(Value::as_str)
            .is_some_and(|html| html.contains(needle))
}
