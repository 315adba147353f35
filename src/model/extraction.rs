//! Intermediate results of the extraction stages.

use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Minimum number of characters for extracted text to count as usable.
///
/// Shared by the text-layer and OCR paths so both report success the same way.
pub const MIN_TEXT_LENGTH: usize = 50;

/// Whether text is long enough to be analyzed.
pub fn is_sufficient(text: &str) -> bool {
    text.chars().count() > MIN_TEXT_LENGTH
}

/// One page of a document during a single ingestion run.
#[derive(Debug, Clone)]
pub struct RawPage {
    /// Page number (1-indexed)
    pub index: u32,
    /// Text-layer text of the page (or its sentinel)
    pub text: String,
    /// Rendered bitmap; `None` when the page failed to render
    pub raster: Option<RgbImage>,
}

impl RawPage {
    /// Create a new page.
    pub fn new(index: u32, text: impl Into<String>, raster: Option<RgbImage>) -> Self {
        Self {
            index,
            text: text.into(),
            raster,
        }
    }
}

/// Text extracted from a document, by either the text layer or OCR.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    /// Cleaned text of the whole document, or a diagnostic message
    pub full_text: String,
    /// One entry per page, index-aligned with page numbers
    pub text_by_page: Vec<String>,
    /// `full_text` is longer than [`MIN_TEXT_LENGTH`]
    pub success: bool,
    /// At least one page paints an image
    pub has_images: bool,
    /// Text layer was insufficient but images are present
    pub needs_ocr: bool,
    /// Text came from OCR rather than the text layer
    pub ocr_processed: bool,
}

impl ExtractionResult {
    /// Number of page slots.
    pub fn page_count(&self) -> usize {
        self.text_by_page.len()
    }
}

/// One OCR recognition of a page.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrAttempt {
    /// Page number (1-indexed)
    pub page_index: u32,
    /// Recognized text
    pub text: String,
    /// Engine confidence, 0-100
    pub confidence: f32,
}

impl OcrAttempt {
    /// Create a new attempt.
    pub fn new(page_index: u32, text: impl Into<String>, confidence: f32) -> Self {
        Self {
            page_index,
            text: text.into(),
            confidence: confidence.clamp(0.0, 100.0),
        }
    }

    /// Length of the recognized text in characters.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    /// Whether nothing was recognized.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Whether a retry with different parameters is warranted.
    pub fn needs_retry(&self, min_length: usize, min_confidence: f32) -> bool {
        self.len() < min_length || self.confidence < min_confidence
    }

    /// Pick the better of a first attempt and its retry.
    ///
    /// The retry wins if it is longer OR more confident; ties keep the first.
    pub fn select(first: OcrAttempt, retry: OcrAttempt) -> OcrAttempt {
        if retry.len() > first.len() || retry.confidence > first.confidence {
            retry
        } else {
            first
        }
    }
}
