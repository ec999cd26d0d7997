//! JSON rendering of conversion results.

use crate::error::Result;
use crate::model::ContentItem;
use serde::Serialize;

/// JSON output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JsonFormat {
    /// Compact single-line JSON
    Compact,
    /// Pretty-printed with 2-space indentation
    #[default]
    Pretty,
}

#[derive(Serialize)]
struct Envelope<'a> {
    items: &'a [ContentItem],
}

/// Render items as `{"items": [...]}`.
pub fn to_json(items: &[ContentItem], format: JsonFormat) -> Result<String> {
    let envelope = Envelope { items };
    let json = match format {
        JsonFormat::Compact => serde_json::to_string(&envelope)?,
        JsonFormat::Pretty => serde_json::to_string_pretty(&envelope)?,
    };
    Ok(json)
}

/// Render items as pretty-printed JSON.
pub fn to_json_default(items: &[ContentItem]) -> Result<String> {
    to_json(items, JsonFormat::Pretty)
}
