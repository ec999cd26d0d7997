//! # docx-items
//!
//! Flatten Word (.docx) documents into an ordered list of content items.
//!
//! A document is read as a sequence of text runs, embedded images and math
//! expressions in reading order. Tables are flattened in place, images are
//! resolved through the document's relationships and inlined as data URIs,
//! and Office Math is converted to presentation MathML by a bundled rule set.
//!
//! ## Quick Start
//!
//! ```no_run
//! use docx_items::{convert_file, to_json, ContentItem, JsonFormat};
//!
//! let items = convert_file("quiz.docx")?;
//! for item in &items {
//!     match item {
//!         ContentItem::Text { value } => print!("{}", value),
//!         ContentItem::Image { mime, .. } => print!("[{}]", mime),
//!         ContentItem::Math { mathml } => print!("{}", mathml),
//!     }
//! }
//!
//! let json = to_json(&items, JsonFormat::Compact)?;
//! # Ok::<(), docx_items::Error>(())
//! ```
//!
//! ## Options
//!
//! ```no_run
//! use docx_items::{ConvertOptions, Converter};
//!
//! let options = ConvertOptions::default()
//!     .with_asset_dir("assets")
//!     .with_stylesheet("omml2mml.xml");
//!
//! let items = Converter::new(options).convert_file("quiz.docx")?;
//! # Ok::<(), docx_items::Error>(())
//! ```
//!
//! Only whole-document problems are errors (not a ZIP archive, legacy
//! `.doc`, no document part, broken document XML). A dangling image
//! reference or a math block that fails to convert is logged through the
//! `log` facade and left out of the result.
//!
//! ## Features
//!
//! - `async`: `convert_file_async` reading files with Tokio

pub mod container;
pub mod convert;
pub mod detect;
pub mod error;
pub mod math;
pub mod media;
pub mod model;
pub mod options;
pub mod output;
pub mod relationships;
pub mod walker;
pub mod xml;

// Re-exports
pub use container::Archive;
pub use convert::{
    convert_bytes, convert_bytes_with_options, convert_file, inspect, Converter, PackageInfo,
};
#[cfg(feature = "async")]
pub use convert::convert_file_async;
pub use detect::{detect_format_from_bytes, detect_format_from_path, FormatType};
pub use error::{Error, Result};
pub use math::MathTransformer;
pub use media::ImageMode;
pub use model::ContentItem;
pub use options::{ConvertOptions, StylesheetSource};
pub use output::{to_json, JsonFormat};
pub use relationships::RelationshipMap;
