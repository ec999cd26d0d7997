//! Error types for the docx-items library.

use std::io;
use thiserror::Error;

/// Result type alias for docx-items operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a whole conversion.
///
/// Per-node problems (a dangling image reference, a math block that fails
/// to transform) never surface here; they are logged and the node is
/// dropped from the output.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not a readable ZIP archive.
    #[error("Corrupt archive: {0}")]
    CorruptArchive(String),

    /// The input is a recognised but unsupported format (e.g. legacy .doc).
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The main document part is absent from the archive.
    #[error("Missing document part: {0}")]
    MissingDocumentPart(String),

    /// Error parsing XML content.
    #[error("Malformed XML: {0}")]
    MalformedXml(String),

    /// The input buffer exceeds the accepted size.
    #[error("Input too large: {size} bytes (limit {limit})")]
    InputTooLarge {
        /// Size of the rejected input in bytes
        size: u64,
        /// Configured limit in bytes
        limit: u64,
    },

    /// Error serializing the output.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Whether this error is caused by the submitted document rather than
    /// by the host environment.
    ///
    /// Hosts map these to a client-error response (HTTP 400 in the
    /// upload service); everything else is an internal failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::CorruptArchive(_)
                | Error::UnsupportedFormat(_)
                | Error::MissingDocumentPart(_)
                | Error::MalformedXml(_)
                | Error::InputTooLarge { .. }
        )
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::CorruptArchive(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::MalformedXml(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::MissingDocumentPart("word/document.xml".to_string());
        assert_eq!(
            err.to_string(),
            "Missing document part: word/document.xml"
        );

        let err = Error::InputTooLarge { size: 30, limit: 25 };
        assert_eq!(err.to_string(), "Input too large: 30 bytes (limit 25)");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_client_errors() {
        assert!(Error::CorruptArchive("bad".into()).is_client_error());
        assert!(Error::MissingDocumentPart("x".into()).is_client_error());
        assert!(Error::UnsupportedFormat("doc".into()).is_client_error());
        assert!(!Error::Serialization("x".into()).is_client_error());
    }
}
