//! Content items produced by a conversion.

use serde::{Deserialize, Serialize};

/// Text of a tab item.
pub const TAB: &str = "\t";

/// Text of a line break item.
pub const LINE_BREAK: &str = "\n";

/// One unit of extracted content, in reading order.
///
/// Serializes with a `type` discriminant:
/// `{"type":"text","text":".."}`, `{"type":"image","src":"..","mime":".."}`,
/// `{"type":"math","mathml":".."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentItem {
    /// A run of literal text; tabs and explicit breaks are single-character items
    Text {
        #[serde(rename = "text")]
        value: String,
    },
    /// An embedded image
    Image {
        /// `data:` URI, or a file path in asset-directory mode
        src: String,
        /// MIME type inferred from the part's extension
        mime: String,
    },
    /// A presentation MathML fragment
    Math {
        /// Serialized `<math>` element
        mathml: String,
    },
}

impl ContentItem {
    /// Create a text item.
    pub fn text(value: impl Into<String>) -> Self {
        ContentItem::Text {
            value: value.into(),
        }
    }

    /// Create an image item.
    pub fn image(src: impl Into<String>, mime: impl Into<String>) -> Self {
        ContentItem::Image {
            src: src.into(),
            mime: mime.into(),
        }
    }

    /// Create a math item.
    pub fn math(mathml: impl Into<String>) -> Self {
        ContentItem::Math {
            mathml: mathml.into(),
        }
    }

    /// The `type` discriminant as serialized.
    pub fn kind(&self) -> &'static str {
        match self {
            ContentItem::Text { .. } => "text",
            ContentItem::Image { .. } => "image",
            ContentItem::Math { .. } => "math",
        }
    }

    /// Text value, if this is a text item.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentItem::Text { value } => Some(value),
            _ => None,
        }
    }

    /// Whether this item survives the output filter.
    ///
    /// Text that trims to nothing is dropped, tab and line break items
    /// included. Images and math are always kept.
    pub fn is_visible(&self) -> bool {
        match self {
            ContentItem::Text { value } => !value.trim().is_empty(),
            _ => true,
        }
    }

    /// Whether this is a tab or line break item.
    pub fn is_layout_marker(&self) -> bool {
        matches!(self, ContentItem::Text { value } if value == TAB || value == LINE_BREAK)
    }
}

/// Drop items that do not survive the output filter, keeping order.
pub fn retain_visible(items: &mut Vec<ContentItem>) {
    items.retain(ContentItem::is_visible);
}

/// Like [`retain_visible`], but tab and line break items are kept.
pub fn retain_visible_with_markers(items: &mut Vec<ContentItem>) {
    items.retain(|item| item.is_visible() || item.is_layout_marker());
}

/// Concatenated text of all text items.
pub fn plain_text(items: &[ContentItem]) -> String {
    items.iter().filter_map(ContentItem::as_text).collect()
}
