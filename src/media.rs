//! Embedded media extraction.

use crate::container::Archive;
use base64::Engine;
use std::path::{Component, Path, PathBuf};

/// MIME type used when the extension is not recognised.
pub const DEFAULT_MIME: &str = "application/octet-stream";

/// How extracted images are handed to the consumer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ImageMode {
    /// Inline `data:<mime>;base64,...` URI
    #[default]
    DataUri,
    /// Write each image into this directory and reference it by path
    AssetDir(PathBuf),
}

/// A media part pulled out of the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAsset {
    /// Archive-internal path of the part
    pub path: String,
    /// Raw bytes
    pub bytes: Vec<u8>,
    /// MIME type inferred from the extension
    pub mime: String,
}

impl MediaAsset {
    /// Encode as a base64 data URI.
    pub fn to_data_uri(&self) -> String {
        let payload = base64::engine::general_purpose::STANDARD.encode(&self.bytes);
        format!("data:{};base64,{}", self.mime, payload)
    }

    /// File name of the part (`word/media/image1.png` → `image1.png`).
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Write into `dir` and return the written path.
    pub fn store(&self, dir: &Path) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }

    /// Produce the `src` value for an image item under `mode`.
    ///
    /// Returns `None` when the asset cannot be stored.
    pub fn encode(&self, mode: &ImageMode) -> Option<String> {
        match mode {
            ImageMode::DataUri => Some(self.to_data_uri()),
            ImageMode::AssetDir(dir) => match self.store(dir) {
                Ok(path) => Some(path.to_string_lossy().replace('\\', "/")),
                Err(e) => {
                    log::warn!("Failed to store image {}: {}", self.path, e);
                    None
                }
            },
        }
    }
}

/// Map a file extension to a MIME type.
pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        _ => DEFAULT_MIME,
    }
}

/// Resolve a relationship target to an archive-internal path.
///
/// Absolute targets (`/word/media/x.png`) are taken from the package root;
/// relative ones (`media/x.png`, `../media/x.png`) are resolved against the
/// directory of `base_part`. Targets that climb out of the archive or carry
/// a URI scheme yield `None`.
pub fn normalize_target(base_part: &str, target: &str) -> Option<String> {
    let target = target.trim();
    if target.is_empty() || target.contains("://") {
        return None;
    }

    let (mut parts, relative): (Vec<String>, &str) = match target.strip_prefix('/') {
        Some(stripped) => (Vec::new(), stripped),
        None => {
            let base_dir = Path::new(base_part).parent().unwrap_or(Path::new(""));
            let parts = base_dir
                .components()
                .filter_map(|c| match c {
                    Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect();
            (parts, target)
        }
    };

    for segment in relative.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            s => parts.push(s.to_string()),
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Extract the media part at `path` from the archive.
pub fn materialize(archive: &Archive, path: &str) -> Option<MediaAsset> {
    let bytes = archive.read_bytes(path)?;
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    Some(MediaAsset {
        path: path.to_string(),
        bytes,
        mime: mime_for_extension(ext).to_string(),
    })
}
