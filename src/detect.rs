//! Input format detection.
//!
//! Word documents are ZIP archives. Legacy binary `.doc` files are OLE
//! compound files and are recognised only so they can be rejected with a
//! clear error; the other Office Open XML formats share the ZIP layout and
//! are told apart by `[Content_Types].xml`.

use crate::container::Archive;
use crate::error::{Error, Result};
use std::path::Path;

/// ZIP file magic bytes: PK\x03\x04
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// OLE compound file magic bytes.
const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Content type for DOCX main document part.
const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";

/// Content type for macro-enabled documents (.docm).
const DOCM_CONTENT_TYPE: &str = "application/vnd.ms-word.document.macroEnabled.main+xml";

/// Content type for XLSX workbook part.
const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";

/// Content type for PPTX presentation part.
const PPTX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";

/// Detected input format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatType {
    /// Word document (.docx, .docm)
    Docx,
    /// Excel workbook (.xlsx)
    Xlsx,
    /// PowerPoint presentation (.pptx)
    Pptx,
    /// Legacy binary Word document (.doc)
    LegacyDoc,
    /// A ZIP archive without recognisable Office content
    Unknown,
}

impl FormatType {
    /// Returns a human-readable name for this format.
    pub fn name(&self) -> &'static str {
        match self {
            FormatType::Docx => "Word Document",
            FormatType::Xlsx => "Excel Workbook",
            FormatType::Pptx => "PowerPoint Presentation",
            FormatType::LegacyDoc => "legacy binary Word document (.doc)",
            FormatType::Unknown => "unknown archive",
        }
    }

    /// Reject formats the converter cannot read.
    ///
    /// `Unknown` passes so a missing document part is reported as such.
    pub fn ensure_convertible(self) -> Result<()> {
        match self {
            FormatType::Docx | FormatType::Unknown => Ok(()),
            other => Err(Error::UnsupportedFormat(other.name().to_string())),
        }
    }
}

impl std::fmt::Display for FormatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Detect the format of a file.
///
/// # Example
///
/// ```no_run
/// use docx_items::detect::detect_format_from_path;
///
/// let format = detect_format_from_path("document.docx")?;
/// println!("Detected format: {}", format);
/// # Ok::<(), docx_items::Error>(())
/// ```
pub fn detect_format_from_path(path: impl AsRef<Path>) -> Result<FormatType> {
    let data = std::fs::read(path.as_ref())?;
    detect_format_from_bytes(&data)
}

/// Detect the format of an input buffer.
///
/// Fails with `CorruptArchive` when the bytes are neither an OLE compound
/// file nor a readable ZIP archive.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<FormatType> {
    if is_ole_file(data) {
        return Ok(FormatType::LegacyDoc);
    }
    let archive = Archive::from_bytes(data.to_vec())?;
    Ok(detect_format_from_archive(&archive))
}

/// Detect the format of an opened archive.
pub fn detect_format_from_archive(archive: &Archive) -> FormatType {
    if let Some(content_types) = archive.read_text("[Content_Types].xml") {
        if content_types.contains(DOCX_CONTENT_TYPE) || content_types.contains(DOCM_CONTENT_TYPE) {
            return FormatType::Docx;
        }
        if content_types.contains(XLSX_CONTENT_TYPE) {
            return FormatType::Xlsx;
        }
        if content_types.contains(PPTX_CONTENT_TYPE) {
            return FormatType::Pptx;
        }
    }
    detect_by_folder_structure(archive)
}

/// Fallback detection by checking folder structure.
fn detect_by_folder_structure(archive: &Archive) -> FormatType {
    let names = archive.list_files();

    let has_word = names.iter().any(|n| n.starts_with("word/"));
    let has_xl = names.iter().any(|n| n.starts_with("xl/"));
    let has_ppt = names.iter().any(|n| n.starts_with("ppt/"));

    match (has_word, has_xl, has_ppt) {
        (true, false, false) => FormatType::Docx,
        (false, true, false) => FormatType::Xlsx,
        (false, false, true) => FormatType::Pptx,
        _ => FormatType::Unknown,
    }
}

/// Check if data starts with ZIP magic bytes.
pub fn is_zip_file(data: &[u8]) -> bool {
    data.starts_with(&ZIP_MAGIC)
}

/// Check if data starts with OLE compound file magic bytes.
pub fn is_ole_file(data: &[u8]) -> bool {
    data.starts_with(&OLE_MAGIC)
}
