//! Conversion pipeline: archive → document tree → content items.

use crate::container::Archive;
use crate::detect::{self, FormatType};
use crate::error::{Error, Result};
use crate::math::MathTransformer;
use crate::model::ContentItem;
use crate::options::{ConvertOptions, StylesheetSource};
use crate::relationships::{rels_path_for, RelationshipMap};
use crate::walker::Walker;
use crate::xml;
use serde::Serialize;
use std::borrow::Cow;
use std::path::Path;

/// Conventional location of the main document part.
pub const DEFAULT_DOCUMENT_PART: &str = "word/document.xml";

/// Package-level relationships part.
const PACKAGE_RELS: &str = "_rels/.rels";

/// Document converter.
///
/// Resolves the math rules once and can then convert any number of
/// documents; every conversion builds and drops its own archive, tree and
/// relationship map.
///
/// # Example
///
/// ```no_run
/// use docx_items::{ConvertOptions, Converter};
///
/// let converter = Converter::new(ConvertOptions::default().with_asset_dir("assets"));
/// let items = converter.convert_file("quiz.docx")?;
/// println!("{} items", items.len());
/// # Ok::<(), docx_items::Error>(())
/// ```
#[derive(Debug)]
pub struct Converter {
    options: ConvertOptions,
    math: Option<Cow<'static, MathTransformer>>,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(ConvertOptions::default())
    }
}

impl Converter {
    /// Create a converter, loading the configured math rules.
    pub fn new(options: ConvertOptions) -> Self {
        let math = match &options.stylesheet {
            StylesheetSource::Bundled => MathTransformer::bundled().map(Cow::Borrowed),
            StylesheetSource::Path(path) => MathTransformer::from_path(path).map(Cow::Owned),
            StylesheetSource::Disabled => None,
        };
        Self { options, math }
    }

    /// Options this converter was built with.
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Whether math blocks will be converted.
    pub fn has_math(&self) -> bool {
        self.math.is_some()
    }

    /// Convert an in-memory document.
    pub fn convert(&self, data: &[u8]) -> Result<Vec<ContentItem>> {
        if detect::is_ole_file(data) {
            return Err(Error::UnsupportedFormat(FormatType::LegacyDoc.name().to_string()));
        }
        let archive = Archive::from_bytes(data.to_vec())?.with_max_entry_size(self.options.max_entry_size);
        self.convert_archive(&archive)
    }

    /// Convert a document file, enforcing the input size limit.
    pub fn convert_file(&self, path: impl AsRef<Path>) -> Result<Vec<ContentItem>> {
        let path = path.as_ref();
        ensure_input_size(std::fs::metadata(path)?.len(), self.options.max_input_size)?;
        let data = std::fs::read(path)?;
        self.convert(&data)
    }

    /// Convert a document file using Tokio for file I/O.
    #[cfg(feature = "async")]
    pub async fn convert_file_async(&self, path: impl AsRef<Path>) -> Result<Vec<ContentItem>> {
        let path = path.as_ref();
        ensure_input_size(tokio::fs::metadata(path).await?.len(), self.options.max_input_size)?;
        let data = tokio::fs::read(path).await?;
        self.convert(&data)
    }

    /// Convert an opened archive.
    pub fn convert_archive(&self, archive: &Archive) -> Result<Vec<ContentItem>> {
        detect::detect_format_from_archive(archive).ensure_convertible()?;

        let part = locate_document_part(archive)?;
        let text = archive
            .read_text(&part)
            .ok_or_else(|| Error::MissingDocumentPart(format!("{} could not be read", part)))?;
        let root = xml::parse(&text)?
            .ok_or_else(|| Error::MalformedXml(format!("{} has no root element", part)))?;

        let relationships = RelationshipMap::build(archive.read_text(&rels_path_for(&part)).as_deref());
        log::debug!("Converting {} with {} relationships", part, relationships.len());

        let walker = Walker::new(archive, &part, &relationships)
            .with_image_mode(&self.options.image_mode)
            .with_layout_markers(self.options.layout_markers);
        let mut walker = match self.options.stylesheet {
            StylesheetSource::Disabled => walker.without_math(),
            _ => walker.with_math(self.math.as_deref()),
        };
        let items = walker.walk(&root);

        log::debug!("Extracted {} items from {}", items.len(), part);
        Ok(items)
    }
}

/// Summary of a document package, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageInfo {
    /// Detected format
    pub format: String,
    /// Main document part, when present
    pub document_part: Option<String>,
    /// Number of relationships of the document part
    pub relationships: usize,
    /// Media parts in the archive
    pub media: Vec<String>,
    /// Total number of archive entries
    pub entries: usize,
}

/// Describe the package structure without converting it.
pub fn inspect(archive: &Archive) -> PackageInfo {
    let document_part = locate_document_part(archive).ok();
    let relationships = document_part
        .as_deref()
        .map(|part| RelationshipMap::build(archive.read_text(&rels_path_for(part)).as_deref()).len())
        .unwrap_or(0);

    PackageInfo {
        format: detect::detect_format_from_archive(archive).name().to_string(),
        document_part,
        relationships,
        media: archive.list_files_with_prefix("word/media/"),
        entries: archive.list_files().len(),
    }
}

/// Find the main document part.
///
/// The package relationships name it; archives without them fall back to
/// `word/document.xml`.
pub fn locate_document_part(archive: &Archive) -> Result<String> {
    let package_rels = RelationshipMap::build(archive.read_text(PACKAGE_RELS).as_deref());
    if let Some(path) = package_rels
        .office_document_target()
        .and_then(|target| crate::media::normalize_target("", target))
    {
        if archive.exists(&path) {
            return Ok(path);
        }
        log::warn!("Package relationships name missing document part {}", path);
    }

    if archive.exists(DEFAULT_DOCUMENT_PART) {
        Ok(DEFAULT_DOCUMENT_PART.to_string())
    } else {
        Err(Error::MissingDocumentPart(DEFAULT_DOCUMENT_PART.to_string()))
    }
}

/// Reject inputs larger than `limit` bytes.
pub fn ensure_input_size(size: u64, limit: u64) -> Result<()> {
    if size > limit {
        return Err(Error::InputTooLarge { size, limit });
    }
    Ok(())
}

/// Convert an in-memory document with default options.
///
/// # Example
///
/// ```no_run
/// let data = std::fs::read("quiz.docx")?;
/// let items = docx_items::convert_bytes(&data)?;
/// # Ok::<(), docx_items::Error>(())
/// ```
pub fn convert_bytes(data: &[u8]) -> Result<Vec<ContentItem>> {
    Converter::default().convert(data)
}

/// Convert an in-memory document with options.
pub fn convert_bytes_with_options(data: &[u8], options: &ConvertOptions) -> Result<Vec<ContentItem>> {
    Converter::new(options.clone()).convert(data)
}

/// Convert a document file with default options.
pub fn convert_file(path: impl AsRef<Path>) -> Result<Vec<ContentItem>> {
    Converter::default().convert_file(path)
}

/// Convert a document file with default options using Tokio for file I/O.
#[cfg(feature = "async")]
pub async fn convert_file_async(path: impl AsRef<Path>) -> Result<Vec<ContentItem>> {
    Converter::default().convert_file_async(path).await
}
