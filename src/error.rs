//! Error types for unresume library.

use std::io;
use thiserror::Error;

/// Result type alias for unresume operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during résumé ingestion.
///
/// `Decode`, `Encrypted` and `UnsupportedFormat` are fatal to a run.
/// `PageExtraction` and `OcrPage` only ever affect one page; the pipeline
/// logs them and substitutes a sentinel string instead of returning them.
/// `OcrInit` disables OCR for the run but keeps the text-layer result.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The declared or detected file type cannot be ingested.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The document bytes are not a valid document structure.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The PDF document is encrypted and cannot be decoded.
    #[error("Document is encrypted")]
    Encrypted,

    /// A single page could not be extracted.
    #[error("Page {page}: {message}")]
    PageExtraction { page: u32, message: String },

    /// The OCR engine could not be initialized.
    #[error("OCR initialization failed: {0}")]
    OcrInit(String),

    /// OCR failed on a single page.
    #[error("OCR failed on page {page}: {message}")]
    OcrPage { page: u32, message: String },

    /// An image could not be decoded or encoded.
    #[error("Image error: {0}")]
    Image(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error only affects a single page.
    pub fn is_page_local(&self) -> bool {
        matches!(self, Error::PageExtraction { .. } | Error::OcrPage { .. })
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::Decode(err.to_string()),
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Image(err.to_string())
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Decode(format!("not a valid word-processor archive: {}", err))
    }
}
