//! # unresume
//!
//! Résumé ingestion library for Rust.
//!
//! This library takes an uploaded résumé (PDF or DOCX), extracts its text,
//! falls back to OCR for image-only PDFs, and fills a structured
//! [`ResumeRecord`] using heuristic field analysis.
//!
//! ## Quick Start
//!
//! ```no_run
//! use unresume::{ingest_file, IngestOptions};
//!
//! fn main() -> unresume::Result<()> {
//!     let report = ingest_file("resume.pdf", IngestOptions::default())?;
//!
//!     println!("Name: {}", report.record.name);
//!     println!("Skills: {}", report.record.skills.join(", "));
//!     println!("{}", report.to_json(true)?);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Reusing an OCR engine
//!
//! Loading an OCR language model is slow, so long-running hosts keep one
//! [`OcrEngine`] and pass it to every run:
//!
//! ```no_run
//! use unresume::{Ingestor, IngestOptions, OcrConfig, OcrEngine, SourceFile};
//!
//! # fn main() -> unresume::Result<()> {
//! let ingestor = Ingestor::new(IngestOptions::default());
//! let mut engine = OcrEngine::new(OcrConfig::new().with_language("chi_sim+eng"));
//!
//! for path in ["a.pdf", "b.docx"] {
//!     let source = SourceFile::from_path(path)?;
//!     let report = ingestor.ingest(&source, &mut engine, &mut |p: u8| eprint!("\r{p}%"))?;
//!     println!("{}: {}", path, report.record.name);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **PDF text layer**: glyph runs grouped into reading-order lines
//! - **OCR fallback**: Tesseract (`tesseract` feature) with a single-column retry
//! - **DOCX**: paragraph text from WordprocessingML
//! - **Field analysis**: name, title, contact, skills, education, experience,
//!   projects, certificates (Chinese and English labels)
//! - **Parallel processing**: Uses Rayon for multi-page line reconstruction
//! - **Async**: `ingest_file_async` behind the `async` feature

pub mod analyze;
pub mod detect;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod model;
pub mod ocr;
pub mod pdf;
pub mod text;

// Re-export commonly used types
pub use analyze::{analyze_resume_text, MAX_SKILLS};
pub use detect::{detect_kind_from_bytes, is_pdf_bytes, resolve_kind, DocumentKind};
pub use error::{Error, Result};
pub use extract::{ExtractorRegistry, TextExtractor};
pub use ingest::{analyze_text, ingest_bytes, ingest_file, IngestOptions, Ingestor};
pub use model::{
    Contact, Diagnostics, EducationEntry, ExperienceEntry, ExtractionResult, IngestReport,
    OcrAttempt, ProjectEntry, RawPage, ResumeRecord, SourceFile,
};
pub use ocr::{
    ChannelProgress, EngineState, NoProgress, OcrBackend, OcrConfig, OcrEngine, ProgressSink,
};
pub use pdf::{ExtractOptions, PageRasterizer, TextLayerExtractor};
pub use text::{CleanupOptions, CleanupPipeline};

#[cfg(feature = "async")]
pub use ingest::ingest_file_async;

use std::path::Path;

/// Extract the text layer of a PDF file.
///
/// Returns the full text; a document without usable text yields the
/// diagnostic message instead.
///
/// # Example
///
/// ```no_run
/// let text = unresume::extract_text("resume.pdf").unwrap();
/// println!("{}", text);
/// ```
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let data = std::fs::read(path)?;
    let result = TextLayerExtractor::default().extract_bytes(&data)?;
    Ok(result.full_text)
}

/// Render every page of a PDF file to an RGB bitmap at the default scale.
pub fn render_pages<P: AsRef<Path>>(path: P) -> Result<Vec<Option<image::RgbImage>>> {
    let data = std::fs::read(path)?;
    PageRasterizer::default().rasterize_bytes(&data)
}
