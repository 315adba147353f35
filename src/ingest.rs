//! Ingestion orchestration: detect, extract, fall back to OCR, analyze.

use std::path::Path;
use std::time::Instant;

use crate::analyze::analyze_resume_text;
use crate::detect::{resolve_kind, DocumentKind};
use crate::error::{Error, Result};
use crate::extract::{ExtractorRegistry, TextExtractor};
use crate::model::{Diagnostics, ExtractionResult, IngestReport, ResumeRecord, SourceFile};
use crate::ocr::{NoProgress, OcrConfig, OcrEngine, ProgressSink};
use crate::pdf::{ExtractOptions, LopdfBackend, PageRasterizer};

/// Options for an ingestion run.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Fall back to OCR for image-only PDFs
    pub enable_ocr: bool,

    /// OCR configuration for engines created by the convenience functions
    pub ocr: OcrConfig,

    /// Text-layer and rendering options
    pub extract: ExtractOptions,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            enable_ocr: true,
            ocr: OcrConfig::default(),
            extract: ExtractOptions::default(),
        }
    }
}

impl IngestOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the OCR fallback.
    pub fn with_ocr(mut self, enabled: bool) -> Self {
        self.enable_ocr = enabled;
        self
    }

    /// Disable the OCR fallback.
    pub fn without_ocr(self) -> Self {
        self.with_ocr(false)
    }

    /// Set the OCR configuration.
    pub fn with_ocr_config(mut self, config: OcrConfig) -> Self {
        self.ocr = config;
        self
    }

    /// Set the OCR page cap.
    pub fn with_max_ocr_pages(mut self, pages: usize) -> Self {
        self.ocr.max_pages = pages;
        self
    }

    /// Set the extraction options.
    pub fn with_extract_options(mut self, options: ExtractOptions) -> Self {
        self.extract = options;
        self
    }
}

/// Runs documents through extraction, optional OCR, and analysis.
///
/// The OCR engine is passed in rather than owned, so one initialized engine
/// can serve many runs.
pub struct Ingestor {
    options: IngestOptions,
    registry: ExtractorRegistry,
}

impl Default for Ingestor {
    fn default() -> Self {
        Self::new(IngestOptions::default())
    }
}

impl Ingestor {
    /// Create an ingestor with the default extractors.
    pub fn new(options: IngestOptions) -> Self {
        let registry = ExtractorRegistry::with_options(options.extract.clone());
        Self { options, registry }
    }

    /// Create an ingestor with a custom extractor registry.
    ///
    /// Registered extractors take over their kinds. A kind with no
    /// extractor is rejected; legacy `.doc` files get a `Decode` error.
    pub fn with_registry(options: IngestOptions, registry: ExtractorRegistry) -> Self {
        Self { options, registry }
    }

    /// The active options.
    pub fn options(&self) -> &IngestOptions {
        &self.options
    }

    /// Ingest one document.
    ///
    /// The registered extractor for the document's kind produces the text.
    /// A PDF without a usable text layer but with page images goes to OCR;
    /// the engine is initialized only then. If that initialization fails,
    /// the text-layer diagnostics are returned with `ocr_error` set instead
    /// of failing the run.
    pub fn ingest<P>(
        &self,
        source: &SourceFile,
        engine: &mut OcrEngine,
        progress: &mut P,
    ) -> Result<IngestReport>
    where
        P: ProgressSink + ?Sized,
    {
        let started = Instant::now();
        let kind = resolve_kind(source.mime_type.as_deref(), &source.bytes)?;
        log::info!("Ingesting '{}' as {}", source.file_name, kind);

        let extractor = self.registry.get(kind).ok_or_else(|| missing_extractor(kind))?;
        log::debug!("Extracting {} with '{}'", kind, extractor.name());
        let result = extractor.extract_bytes(&source.bytes)?;

        let mut report = if result.success {
            analyzed(&source.file_name, &result)
        } else if kind == DocumentKind::Pdf {
            self.recognize_scanned(source, &result, engine, progress)?
        } else if !result.full_text.trim().is_empty() {
            // Short word-processor documents are still worth analyzing
            analyzed(&source.file_name, &result)
        } else {
            unanalyzed(&source.file_name, &result)
        };

        report.diagnostics.processing_time_seconds = started.elapsed().as_secs_f64();
        log::info!(
            "Ingested '{}' in {:.2}s ({} fields)",
            source.file_name,
            report.diagnostics.processing_time_seconds,
            report.record.populated_fields()
        );
        Ok(report)
    }

    /// OCR fallback for a PDF whose text layer was not usable.
    fn recognize_scanned<P>(
        &self,
        source: &SourceFile,
        text_layer: &ExtractionResult,
        engine: &mut OcrEngine,
        progress: &mut P,
    ) -> Result<IngestReport>
    where
        P: ProgressSink + ?Sized,
    {
        if !text_layer.needs_ocr {
            log::info!("No text layer and no page images; skipping OCR");
            return Ok(unanalyzed(&source.file_name, text_layer));
        }
        if !self.options.enable_ocr {
            log::info!("Document needs OCR but OCR is disabled");
            return Ok(unanalyzed(&source.file_name, text_layer));
        }

        let backend = LopdfBackend::load_bytes(&source.bytes)?;
        let rasterizer = PageRasterizer::from_options(&self.options.extract);
        let pages = rasterizer.raw_pages(&backend, &text_layer.text_by_page);
        match engine.recognize_pages(pages, progress) {
            Ok(ocr) if ocr.success => Ok(analyzed(&source.file_name, &ocr)),
            Ok(ocr) => Ok(unanalyzed(&source.file_name, &ocr)),
            Err(Error::OcrInit(message)) => {
                log::warn!("OCR unavailable: {}", message);
                let mut report = unanalyzed(&source.file_name, text_layer);
                report.diagnostics.ocr_error = Some(message);
                Ok(report)
            }
            Err(e) => Err(e),
        }
    }
}

fn missing_extractor(kind: DocumentKind) -> Error {
    match kind {
        DocumentKind::LegacyWord => Error::Decode(
            "legacy Word (.doc) documents cannot be read; save as .docx".to_string(),
        ),
        DocumentKind::Image => {
            Error::UnsupportedFormat("images are stored as attachments, not ingested".to_string())
        }
        other => Error::UnsupportedFormat(format!("no extractor registered for {}", other)),
    }
}

fn analyzed(file_name: &str, result: &ExtractionResult) -> IngestReport {
    IngestReport {
        record: analyze_resume_text(&result.full_text),
        diagnostics: Diagnostics::from_extraction(file_name, result),
    }
}

fn unanalyzed(file_name: &str, result: &ExtractionResult) -> IngestReport {
    IngestReport {
        record: ResumeRecord::new(),
        diagnostics: Diagnostics::from_extraction(file_name, result),
    }
}

/// Ingest in-memory bytes with a fresh OCR engine.
///
/// `mime_type` is the declared type; `None` sniffs it from the bytes.
pub fn ingest_bytes(
    file_name: &str,
    bytes: Vec<u8>,
    mime_type: Option<&str>,
    options: IngestOptions,
) -> Result<IngestReport> {
    let source = match mime_type {
        Some(mime) => SourceFile::new(file_name, bytes, mime),
        None => SourceFile::untyped(file_name, bytes),
    };
    let mut engine = OcrEngine::new(options.ocr.clone());
    Ingestor::new(options).ingest(&source, &mut engine, &mut NoProgress)
}

/// Ingest a file, declaring its type from the extension.
pub fn ingest_file<P: AsRef<Path>>(path: P, options: IngestOptions) -> Result<IngestReport> {
    let source = SourceFile::from_path(path)?;
    let mut engine = OcrEngine::new(options.ocr.clone());
    Ingestor::new(options).ingest(&source, &mut engine, &mut NoProgress)
}

/// Analyze plain text without any document decoding.
pub fn analyze_text(text: &str) -> ResumeRecord {
    analyze_resume_text(text)
}

/// Ingest a file on the blocking thread pool.
///
/// The file is read asynchronously; extraction, OCR and analysis are CPU
/// bound and run under `spawn_blocking`.
#[cfg(feature = "async")]
pub async fn ingest_file_async<P: AsRef<Path>>(
    path: P,
    options: IngestOptions,
) -> Result<IngestReport> {
    let path = path.as_ref().to_path_buf();
    let bytes = tokio::fs::read(&path).await?;

    tokio::task::spawn_blocking(move || {
        let source = SourceFile::from_parts(&path, bytes);
        let mut engine = OcrEngine::new(options.ocr.clone());
        Ingestor::new(options).ingest(&source, &mut engine, &mut NoProgress)
    })
    .await
    .map_err(|e| Error::Other(format!("ingestion task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_options_builder() {
        let options = IngestOptions::new()
            .without_ocr()
            .with_max_ocr_pages(5)
            .with_extract_options(ExtractOptions::new().sequential());
        assert!(!options.enable_ocr);
        assert_eq!(options.ocr.max_pages, 5);
        assert!(!options.extract.parallel);
    }

    #[test]
    fn test_image_upload_is_rejected() {
        let png = b"\x89PNG\r\n\x1a\n0000".to_vec();
        let err = ingest_bytes("photo.png", png, Some("image/png"), IngestOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_unknown_tag_fails_before_decoding() {
        let err = ingest_bytes("notes.txt", b"hello".to_vec(), Some("text/plain"), IngestOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_corrupt_pdf_is_decode_error() {
        let err = ingest_bytes(
            "cv.pdf",
            b"not a pdf".to_vec(),
            Some("application/pdf"),
            IngestOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_legacy_word_is_decode_error() {
        let ole = vec![0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
        let err = ingest_bytes("cv.doc", ole, None, IngestOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    struct PlainTextDoc;

    impl TextExtractor for PlainTextDoc {
        fn kinds(&self) -> &[DocumentKind] {
            &[DocumentKind::LegacyWord, DocumentKind::Pdf]
        }

        fn name(&self) -> &str {
            "plain"
        }

        fn extract_bytes(&self, bytes: &[u8]) -> Result<ExtractionResult> {
            let text = String::from_utf8_lossy(&bytes[8..]).to_string();
            Ok(ExtractionResult {
                success: false,
                text_by_page: vec![text.clone()],
                full_text: text,
                ..Default::default()
            })
        }
    }

    fn custom_ingestor() -> Ingestor {
        let mut registry = ExtractorRegistry::new();
        registry.register(Arc::new(PlainTextDoc));
        Ingestor::with_registry(IngestOptions::default(), registry)
    }

    #[test]
    fn test_registered_extractor_reads_legacy_word() {
        let mut bytes = vec![0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
        bytes.extend_from_slice("王五\n产品经理".as_bytes());
        let source = SourceFile::untyped("cv.doc", bytes);

        let report = custom_ingestor()
            .ingest(&source, &mut OcrEngine::default(), &mut NoProgress)
            .unwrap();
        assert_eq!(report.record.name, "王五");
        assert_eq!(report.record.title, "产品经理");
    }

    #[test]
    fn test_registered_extractor_replaces_text_layer() {
        let mut bytes = b"%PDF-1.4".to_vec();
        bytes.extend_from_slice(b"short");
        let source = SourceFile::new("cv.pdf", bytes, "application/pdf");

        // Not a real PDF: only the registered extractor ever reads it
        let report = custom_ingestor()
            .ingest(&source, &mut OcrEngine::default(), &mut NoProgress)
            .unwrap();
        assert_eq!(report.diagnostics.extracted_text, "short");
        assert!(report.record.is_empty());
    }

    #[test]
    fn test_empty_registry_rejects_docx() {
        let ingestor = Ingestor::with_registry(IngestOptions::default(), ExtractorRegistry::new());
        let source =
            SourceFile::new("cv.docx", b"PK\x03\x04".to_vec(), crate::detect::MIME_DOCX);
        let err = ingestor
            .ingest(&source, &mut OcrEngine::default(), &mut NoProgress)
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_analyze_text() {
        let record = analyze_text("张三\n软件工程师");
        assert_eq!(record.name, "张三");
        assert_eq!(record.title, "软件工程师");
    }
}
