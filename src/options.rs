//! Conversion options.

use crate::container::DEFAULT_MAX_ENTRY_SIZE;
use crate::media::ImageMode;
use std::path::PathBuf;

/// Default cap on the size of an input file.
pub const DEFAULT_MAX_INPUT_SIZE: u64 = 25 * 1024 * 1024;

/// Where the OMML → MathML rules come from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StylesheetSource {
    /// Rules shipped with the library
    #[default]
    Bundled,
    /// Rules loaded from a file; a missing or invalid file disables math
    Path(PathBuf),
    /// Drop math blocks without converting them
    Disabled,
}

/// Options for converting documents.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Math stylesheet
    pub stylesheet: StylesheetSource,

    /// How images are emitted
    pub image_mode: ImageMode,

    /// Cap on the decompressed size of any archive entry
    pub max_entry_size: u64,

    /// Cap on the size of an input file, checked by file-based entry points
    pub max_input_size: u64,

    /// Keep tab and line break items, which the output filter drops by default
    pub layout_markers: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            stylesheet: StylesheetSource::Bundled,
            image_mode: ImageMode::DataUri,
            max_entry_size: DEFAULT_MAX_ENTRY_SIZE,
            max_input_size: DEFAULT_MAX_INPUT_SIZE,
            layout_markers: false,
        }
    }
}

impl ConvertOptions {
    /// Create new options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load math rules from a file instead of the bundled ones.
    pub fn with_stylesheet(mut self, path: impl Into<PathBuf>) -> Self {
        self.stylesheet = StylesheetSource::Path(path.into());
        self
    }

    /// Skip math conversion entirely.
    pub fn without_math(mut self) -> Self {
        self.stylesheet = StylesheetSource::Disabled;
        self
    }

    /// Write images into `dir` and reference them by path.
    pub fn with_asset_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.image_mode = ImageMode::AssetDir(dir.into());
        self
    }

    /// Set the image mode.
    pub fn with_image_mode(mut self, mode: ImageMode) -> Self {
        self.image_mode = mode;
        self
    }

    /// Set the per-entry decompression cap.
    pub fn with_max_entry_size(mut self, limit: u64) -> Self {
        self.max_entry_size = limit;
        self
    }

    /// Set the input file size cap.
    pub fn with_max_input_size(mut self, limit: u64) -> Self {
        self.max_input_size = limit;
        self
    }

    /// Keep `"\t"` and `"\n"` items in the output.
    pub fn with_layout_markers(mut self) -> Self {
        self.layout_markers = true;
        self
    }
}
