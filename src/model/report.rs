//! Ingestion input and output types.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{ExtractionResult, ResumeRecord};
use crate::detect::DocumentKind;
use crate::error::Result;

/// An uploaded document.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Display name, usually the original file name
    pub file_name: String,
    /// Raw document bytes
    pub bytes: Vec<u8>,
    /// Declared MIME-type-like tag; sniffed from the bytes when absent
    pub mime_type: Option<String>,
}

impl SourceFile {
    /// Create a source file with a declared type.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            mime_type: Some(mime_type.into()),
        }
    }

    /// Create a source file whose type is sniffed from its bytes.
    pub fn untyped(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            mime_type: None,
        }
    }

    /// Read a file, declaring its type from the extension when recognized.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        Ok(Self::from_parts(path, bytes))
    }

    /// Build a source file from a path and already-read bytes.
    pub fn from_parts(path: &Path, bytes: Vec<u8>) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = DocumentKind::from_path(path)
            .ok()
            .map(|kind| kind.mime_type().to_string());
        Self {
            file_name,
            bytes,
            mime_type,
        }
    }
}

/// Per-run metadata reported alongside the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub file_name: String,
    pub page_count: usize,
    /// Text handed to the analyzer, or the diagnostic message
    pub extracted_text: String,
    pub text_by_page: Vec<String>,
    pub processing_time_seconds: f64,
    pub text_extraction_success: bool,
    pub has_images: bool,
    /// OCR ran during this ingestion
    pub ocr_processing: bool,
    /// Last reported OCR progress, 0-100
    pub ocr_progress: u8,
    pub ocr_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ocr_error: Option<String>,
}

impl Diagnostics {
    /// Diagnostics describing an extraction result.
    pub fn from_extraction(file_name: impl Into<String>, result: &ExtractionResult) -> Self {
        Self {
            file_name: file_name.into(),
            page_count: result.page_count(),
            extracted_text: result.full_text.clone(),
            text_by_page: result.text_by_page.clone(),
            processing_time_seconds: 0.0,
            text_extraction_success: result.success,
            has_images: result.has_images,
            ocr_processing: result.ocr_processed,
            ocr_progress: if result.ocr_processed { 100 } else { 0 },
            ocr_complete: result.ocr_processed,
            ocr_error: None,
        }
    }
}

/// The outcome of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub record: ResumeRecord,
    pub diagnostics: Diagnostics,
}

impl IngestReport {
    /// Whether the record came from usable text.
    pub fn is_success(&self) -> bool {
        self.diagnostics.text_extraction_success
    }

    /// Serialize to JSON.
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        json.map_err(|e| crate::error::Error::Other(e.to_string()))
    }
}
