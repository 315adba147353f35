//! OCR backend abstraction.

use std::path::PathBuf;

use image::RgbImage;

use crate::error::{Error, Result};

/// Default recognition language.
pub const DEFAULT_LANGUAGE: &str = "eng";

/// Default number of pages recognized per document.
pub const DEFAULT_MAX_PAGES: usize = 3;

/// Recognitions shorter than this (in characters) are retried.
pub const RETRY_MIN_LENGTH: usize = 50;

/// Recognitions less confident than this are retried.
pub const RETRY_MIN_CONFIDENCE: f32 = 70.0;

/// OCR configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrConfig {
    /// Tesseract language code(s), e.g. `eng` or `chi_sim+eng`
    pub language: String,

    /// Directory holding `*.traineddata`; the engine default when `None`
    pub tessdata: Option<PathBuf>,

    /// Recognize at most this many pages
    pub max_pages: usize,

    /// Retry when the first recognition is shorter than this
    pub retry_min_length: usize,

    /// Retry when the first recognition is less confident than this
    pub retry_min_confidence: f32,
}

impl OcrConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the recognition language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set the tessdata directory.
    pub fn with_tessdata(mut self, path: impl Into<PathBuf>) -> Self {
        self.tessdata = Some(path.into());
        self
    }

    /// Set the page cap.
    pub fn with_max_pages(mut self, pages: usize) -> Self {
        self.max_pages = pages;
        self
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            tessdata: None,
            max_pages: DEFAULT_MAX_PAGES,
            retry_min_length: RETRY_MIN_LENGTH,
            retry_min_confidence: RETRY_MIN_CONFIDENCE,
        }
    }
}

/// Page segmentation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentationParams {
    /// Tesseract page segmentation mode
    pub page_seg_mode: u8,
    /// Whether table detection runs
    pub find_tables: bool,
}

impl SegmentationParams {
    /// Fully automatic page segmentation (PSM 1) with table detection.
    pub const AUTO: Self = Self {
        page_seg_mode: 1,
        find_tables: true,
    };

    /// A single column of variable-size text (PSM 4), tables off.
    pub const SINGLE_COLUMN: Self = Self {
        page_seg_mode: 4,
        find_tables: false,
    };

    /// The engine variables that express these parameters.
    pub fn variables(&self) -> [(&'static str, String); 2] {
        [
            ("tessedit_pageseg_mode", self.page_seg_mode.to_string()),
            (
                "textord_tabfind_find_tables",
                if self.find_tables { "1" } else { "0" }.to_string(),
            ),
        ]
    }
}

impl Default for SegmentationParams {
    fn default() -> Self {
        Self::AUTO
    }
}

/// Raw output of one recognition.
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    pub text: String,
    /// Mean confidence, 0-100
    pub confidence: f32,
}

/// A recognition engine.
///
/// Calls arrive in order: `initialize`, then any number of
/// `set_segmentation` / `recognize`, then `terminate`.
pub trait OcrBackend {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Load the language model.
    fn initialize(&mut self, config: &OcrConfig) -> Result<()>;

    /// Change segmentation for subsequent recognitions.
    fn set_segmentation(&mut self, params: SegmentationParams) -> Result<()>;

    /// Recognize the text of a page image.
    fn recognize(&mut self, image: &RgbImage) -> Result<Recognition>;

    /// Release engine resources.
    fn terminate(&mut self);
}

/// Backend used when no OCR engine is compiled in; never initializes.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableBackend;

impl OcrBackend for UnavailableBackend {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn initialize(&mut self, _config: &OcrConfig) -> Result<()> {
        Err(Error::OcrInit(
            "no OCR engine available (build with the `tesseract` feature)".to_string(),
        ))
    }

    fn set_segmentation(&mut self, _params: SegmentationParams) -> Result<()> {
        Err(Error::OcrInit("OCR engine not initialized".to_string()))
    }

    fn recognize(&mut self, _image: &RgbImage) -> Result<Recognition> {
        Err(Error::OcrInit("OCR engine not initialized".to_string()))
    }

    fn terminate(&mut self) {}
}

/// The backend compiled into this build.
pub fn default_backend() -> Box<dyn OcrBackend> {
    #[cfg(feature = "tesseract")]
    {
        Box::new(super::tesseract::TesseractBackend::new())
    }
    #[cfg(not(feature = "tesseract"))]
    {
        Box::new(UnavailableBackend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = OcrConfig::new()
            .with_language("chi_sim+eng")
            .with_tessdata("/usr/share/tessdata")
            .with_max_pages(5);
        assert_eq!(config.language, "chi_sim+eng");
        assert_eq!(config.tessdata, Some(PathBuf::from("/usr/share/tessdata")));
        assert_eq!(config.max_pages, 5);
        assert_eq!(config.retry_min_length, RETRY_MIN_LENGTH);
    }

    #[test]
    fn test_segmentation_variables() {
        let vars = SegmentationParams::SINGLE_COLUMN.variables();
        assert_eq!(vars[0], ("tessedit_pageseg_mode", "4".to_string()));
        assert_eq!(vars[1], ("textord_tabfind_find_tables", "0".to_string()));
        assert_eq!(SegmentationParams::default(), SegmentationParams::AUTO);
    }

    #[test]
    fn test_unavailable_backend_fails_init() {
        let mut backend = UnavailableBackend;
        let err = backend.initialize(&OcrConfig::default()).unwrap_err();
        assert!(matches!(err, Error::OcrInit(_)));
    }
}
