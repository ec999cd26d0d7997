//! ZIP container abstraction for OOXML documents.

use crate::error::{Error, Result};
use std::cell::RefCell;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

/// Default cap on the decompressed size of a single archive entry.
pub const DEFAULT_MAX_ENTRY_SIZE: u64 = 64 * 1024 * 1024;

/// Fix XML encoding declaration from UTF-16 to UTF-8.
///
/// When we decode UTF-16 XML to a Rust String (UTF-8), the XML declaration
/// still says encoding="UTF-16". This causes quick-xml to fail when it tries
/// to re-interpret the already-decoded UTF-8 string as UTF-16.
fn fix_xml_encoding_declaration(content: &str) -> String {
    if content.starts_with("<?xml") {
        if let Some(end_decl) = content.find("?>") {
            let decl = &content[..end_decl + 2];
            let rest = &content[end_decl + 2..];

            let fixed_decl = decl
                .replace("encoding=\"UTF-16\"", "encoding=\"UTF-8\"")
                .replace("encoding='UTF-16'", "encoding='UTF-8'")
                .replace("encoding=\"utf-16\"", "encoding=\"UTF-8\"")
                .replace("encoding='utf-16'", "encoding='UTF-8'");

            return format!("{}{}", fixed_decl, rest);
        }
    }
    content.to_string()
}

/// Decode XML bytes handling different encodings (UTF-8, UTF-16 LE/BE).
///
/// OOXML parts are normally UTF-8, but some producers write UTF-16.
/// Undecodable input falls back to a lossy UTF-8 conversion so a single odd
/// part never aborts the caller.
pub fn decode_xml_bytes(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(b"\xEF\xBB\xBF") {
        return String::from_utf8_lossy(rest).into_owned();
    }

    if let Some(rest) = bytes.strip_prefix(b"\xFF\xFE") {
        return fix_xml_encoding_declaration(&decode_utf16(rest, u16::from_le_bytes));
    }

    if let Some(rest) = bytes.strip_prefix(b"\xFE\xFF") {
        return fix_xml_encoding_declaration(&decode_utf16(rest, u16::from_be_bytes));
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        // UTF-16 without BOM: ASCII markup leaves NUL in every other byte
        Err(_) if bytes.len() >= 4 && bytes[1] == 0 && bytes[3] == 0 => {
            decode_utf16(bytes, u16::from_le_bytes)
        }
        Err(_) if bytes.len() >= 4 && bytes[0] == 0 && bytes[2] == 0 => {
            decode_utf16(bytes, u16::from_be_bytes)
        }
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> String {
    let units = bytes.chunks_exact(2).map(|pair| unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Read-only view over the ZIP archive of a Word document.
///
/// Lookups of missing entries return `None` instead of failing; deciding
/// whether an absent part is fatal is left to the caller.
pub struct Archive {
    archive: RefCell<zip::ZipArchive<Cursor<Vec<u8>>>>,
    max_entry_size: u64,
}

impl Archive {
    /// Open an archive from a file path.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use docx_items::container::Archive;
    ///
    /// let archive = Archive::open("document.docx")?;
    /// assert!(archive.exists("word/document.xml"));
    /// # Ok::<(), docx_items::Error>(())
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let mut reader = BufReader::new(file);
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(data)
    }

    /// Create an archive from a byte vector.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let archive = zip::ZipArchive::new(Cursor::new(data))?;
        Ok(Self {
            archive: RefCell::new(archive),
            max_entry_size: DEFAULT_MAX_ENTRY_SIZE,
        })
    }

    /// Create an archive from a reader.
    pub fn from_reader<R: Read + Seek>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(data)
    }

    /// Set the cap on decompressed entry size.
    pub fn with_max_entry_size(mut self, limit: u64) -> Self {
        self.max_entry_size = limit;
        self
    }

    /// Cap on decompressed entry size.
    pub fn max_entry_size(&self) -> u64 {
        self.max_entry_size
    }

    /// Read an entry's decompressed bytes.
    ///
    /// Returns `None` when the entry is absent, unreadable, or larger than
    /// the configured entry cap.
    pub fn read_bytes(&self, path: &str) -> Option<Vec<u8>> {
        let mut archive = self.archive.borrow_mut();
        let file = archive.by_name(path).ok()?;

        if file.size() > self.max_entry_size {
            log::warn!(
                "Skipping archive entry {}: {} bytes exceeds limit of {}",
                path,
                file.size(),
                self.max_entry_size
            );
            return None;
        }

        // The declared size can lie; never read past the cap.
        let mut data = Vec::new();
        let mut limited = file.take(self.max_entry_size + 1);
        if let Err(e) = limited.read_to_end(&mut data) {
            log::warn!("Failed to decompress archive entry {}: {}", path, e);
            return None;
        }
        if data.len() as u64 > self.max_entry_size {
            log::warn!(
                "Skipping archive entry {}: decompressed size exceeds limit of {}",
                path,
                self.max_entry_size
            );
            return None;
        }
        Some(data)
    }

    /// Read an XML entry as text.
    ///
    /// Handles UTF-8 (with or without BOM) and UTF-16 LE/BE.
    pub fn read_text(&self, path: &str) -> Option<String> {
        self.read_bytes(path).map(|bytes| decode_xml_bytes(&bytes))
    }

    /// Check if an entry exists in the archive.
    pub fn exists(&self, path: &str) -> bool {
        let archive = self.archive.borrow();
        let found = archive.file_names().any(|n| n == path);
        found
    }

    /// List all entries in the archive, sorted by name.
    pub fn list_files(&self) -> Vec<String> {
        let archive = self.archive.borrow();
        let mut names: Vec<String> = archive.file_names().map(String::from).collect();
        names.sort();
        names
    }

    /// List entries matching a prefix, sorted by name.
    pub fn list_files_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.list_files()
            .into_iter()
            .filter(|n| n.starts_with(prefix))
            .collect()
    }
}

impl std::fmt::Debug for Archive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("files", &self.archive.borrow().len())
            .field("max_entry_size", &self.max_entry_size)
            .finish()
    }
}

/// Build an in-memory archive from `(name, bytes)` pairs.
#[cfg(test)]
pub(crate) fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    use std::io::Write;

    let mut buffer = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(Cursor::new(&mut buffer));
        let options = zip::write::SimpleFileOptions::default();
        for (name, data) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }
    buffer
}
