//! Optical character recognition for image-only documents.
//!
//! An [`OcrEngine`] wraps an [`OcrBackend`] and owns its lifecycle. Pages
//! are rendered by [`crate::pdf::PageRasterizer`] and recognized here, one
//! at a time, with progress reported through a [`ProgressSink`].

mod backend;
mod engine;
mod progress;
#[cfg(feature = "tesseract")]
mod tesseract;

pub use backend::{
    default_backend, OcrBackend, OcrConfig, Recognition, SegmentationParams, UnavailableBackend,
    DEFAULT_LANGUAGE, DEFAULT_MAX_PAGES, RETRY_MIN_CONFIDENCE, RETRY_MIN_LENGTH,
};
pub use engine::{truncation_note, unrecognized_page_sentinel, EngineState, OcrEngine};
pub use progress::{percent, ChannelProgress, NoProgress, ProgressSink};
#[cfg(feature = "tesseract")]
pub use tesseract::TesseractBackend;
