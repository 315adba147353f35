//! Integration tests for the ingestion pipeline.

mod common;

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use image::RgbImage;
use unresume::error::Result;
use unresume::ocr::{Recognition, SegmentationParams, UnavailableBackend};
use lopdf::ObjectId;
use unresume::pdf::backend::{
    ContentOp, FormXObject, ImageXObject, PageId, ResourceScope, XObjectKind,
};
use unresume::pdf::{
    LopdfBackend, PdfBackend, SCANNED_DOCUMENT_MESSAGE, UNREADABLE_DOCUMENT_MESSAGE,
};
use unresume::{
    ingest_bytes, Error, IngestOptions, Ingestor, NoProgress, OcrBackend, OcrConfig, OcrEngine,
    PageRasterizer, SourceFile, TextLayerExtractor,
};

const MIME_PDF: &str = "application/pdf";

/// Backend that answers every page with the same text.
struct FixedBackend {
    text: String,
    calls: Rc<RefCell<Vec<&'static str>>>,
}

impl FixedBackend {
    fn new(text: &str) -> (Self, Rc<RefCell<Vec<&'static str>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                text: text.to_string(),
                calls: calls.clone(),
            },
            calls,
        )
    }
}

impl OcrBackend for FixedBackend {
    fn name(&self) -> &str {
        "fixed"
    }

    fn initialize(&mut self, _config: &OcrConfig) -> Result<()> {
        self.calls.borrow_mut().push("initialize");
        Ok(())
    }

    fn set_segmentation(&mut self, _params: SegmentationParams) -> Result<()> {
        self.calls.borrow_mut().push("segmentation");
        Ok(())
    }

    fn recognize(&mut self, image: &RgbImage) -> Result<Recognition> {
        assert!(image.width() > 0 && image.height() > 0);
        self.calls.borrow_mut().push("recognize");
        Ok(Recognition {
            text: self.text.clone(),
            confidence: 92.0,
        })
    }

    fn terminate(&mut self) {
        self.calls.borrow_mut().push("terminate");
    }
}

const OCR_RESUME: &str = "Zhang Wei\nFrontend Engineer\nzhang.wei@example.com\nSkills\nReact, TypeScript, Vue\n";

fn pdf_source(name: &str, bytes: Vec<u8>) -> SourceFile {
    SourceFile::new(name, bytes, MIME_PDF)
}

#[test]
fn test_text_pdf_keeps_page_order() {
    let pdf = common::text_pdf(&[
        &["First page opening line", "First page closing line"],
        &["Second page opening line", "Second page closing line"],
    ]);

    let result = TextLayerExtractor::default().extract_bytes(&pdf).unwrap();

    assert!(result.success);
    assert!(!result.needs_ocr);
    assert_eq!(result.text_by_page.len(), 2);
    assert_eq!(
        result.text_by_page[0],
        "First page opening line\nFirst page closing line"
    );
    let first = result.full_text.find("First page").unwrap();
    let second = result.full_text.find("Second page").unwrap();
    assert!(first < second);
}

#[test]
fn test_text_pdf_is_analyzed() {
    let pdf = common::text_pdf(&[&[
        "Alice Chen",
        "Backend Engineer",
        "alice@example.com",
        "Skills",
        "Rust, Go, Kubernetes",
        "EDUCATION",
        "Zhejiang University",
        "Bachelor of Engineering",
    ]]);

    let report = ingest_bytes("alice.pdf", pdf, Some(MIME_PDF), IngestOptions::default()).unwrap();

    assert!(report.is_success());
    assert_eq!(report.diagnostics.page_count, 1);
    assert!(!report.diagnostics.ocr_processing);
    assert!(report.diagnostics.processing_time_seconds >= 0.0);

    let record = &report.record;
    assert_eq!(record.name, "Alice Chen");
    assert_eq!(record.title, "Backend Engineer");
    assert_eq!(record.contact.email, "alice@example.com");
    assert_eq!(record.skills, vec!["Rust", "Go", "Kubernetes"]);
    assert_eq!(record.education[0].school, "Zhejiang University");
    assert_eq!(record.education[0].degree, "Bachelor of Engineering");
}

#[test]
fn test_blank_pdf_without_images() {
    let report = ingest_bytes("blank.pdf", common::blank_pdf(), None, IngestOptions::default())
        .unwrap();

    let diagnostics = &report.diagnostics;
    assert!(!diagnostics.text_extraction_success);
    assert!(!diagnostics.has_images);
    assert!(!diagnostics.ocr_processing);
    assert_eq!(diagnostics.extracted_text, UNREADABLE_DOCUMENT_MESSAGE);
    assert_eq!(diagnostics.text_by_page, vec![UNREADABLE_DOCUMENT_MESSAGE]);
    assert!(report.record.is_empty());
}

#[test]
fn test_image_only_pdf_needs_ocr() {
    let pdf = common::image_pdf(2);

    let result = TextLayerExtractor::default().extract_bytes(&pdf).unwrap();
    assert!(!result.success);
    assert!(result.has_images);
    assert!(result.needs_ocr);
    assert_eq!(result.full_text, SCANNED_DOCUMENT_MESSAGE);
    assert_eq!(result.text_by_page.len(), 2);

    let rasters = PageRasterizer::default().rasterize_bytes(&pdf).unwrap();
    assert_eq!(rasters.len(), 2);
    let page = rasters[0].as_ref().unwrap();
    assert_eq!((page.width(), page.height()), (300, 150));
    // The image covers the middle of the page, so it is no longer all white
    let center = page.get_pixel(150, 75);
    assert_ne!(center.0, [255, 255, 255]);
}

#[test]
fn test_ocr_fallback_feeds_analyzer() {
    let (backend, calls) = FixedBackend::new(OCR_RESUME);
    let mut engine = OcrEngine::with_backend(Box::new(backend), OcrConfig::default());
    let ingestor = Ingestor::new(IngestOptions::default());

    let mut progress = Vec::new();
    let report = ingestor
        .ingest(
            &pdf_source("scan.pdf", common::image_pdf(1)),
            &mut engine,
            &mut |p: u8| progress.push(p),
        )
        .unwrap();

    assert!(report.diagnostics.ocr_processing);
    assert!(report.diagnostics.ocr_complete);
    assert_eq!(report.diagnostics.ocr_progress, 100);
    assert!(report.diagnostics.text_extraction_success);
    assert_eq!(report.record.name, "Zhang Wei");
    assert_eq!(report.record.contact.email, "zhang.wei@example.com");
    assert_eq!(report.record.skills, vec!["React", "TypeScript", "Vue"]);
    assert_eq!(progress, vec![0, 100]);
    assert_eq!(*calls.borrow(), vec!["initialize", "recognize"]);
}

#[test]
fn test_ocr_engine_is_reused_across_runs() {
    let (backend, calls) = FixedBackend::new(OCR_RESUME);
    let mut engine = OcrEngine::with_backend(Box::new(backend), OcrConfig::default());
    let ingestor = Ingestor::default();

    for name in ["a.pdf", "b.pdf"] {
        let report = ingestor
            .ingest(&pdf_source(name, common::image_pdf(1)), &mut engine, &mut NoProgress)
            .unwrap();
        assert_eq!(report.diagnostics.file_name, name);
    }

    let inits = calls.borrow().iter().filter(|c| **c == "initialize").count();
    assert_eq!(inits, 1);
    drop(engine);
    assert_eq!(calls.borrow().last(), Some(&"terminate"));
}

#[test]
fn test_ocr_page_cap_fills_every_slot() {
    let (backend, calls) = FixedBackend::new(OCR_RESUME);
    let mut engine = OcrEngine::with_backend(Box::new(backend), OcrConfig::default());
    let ingestor = Ingestor::new(IngestOptions::default().with_max_ocr_pages(2));

    let report = ingestor
        .ingest(&pdf_source("long.pdf", common::image_pdf(4)), &mut engine, &mut NoProgress)
        .unwrap();

    // The page cap comes from the engine's own config, not the ingest options
    assert_eq!(report.diagnostics.page_count, 4);
    assert_eq!(report.diagnostics.text_by_page.len(), 4);
    let recognized = calls.borrow().iter().filter(|c| **c == "recognize").count();
    assert_eq!(recognized, 3);
    assert!(report.diagnostics.text_by_page[3].contains("first 3 of 4"));
}

/// Delegates to lopdf and counts image loads, one per rendered page.
struct CountingPdf {
    inner: LopdfBackend,
    image_loads: Cell<usize>,
}

impl PdfBackend for CountingPdf {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.inner.pages()
    }

    fn media_box(&self, page: PageId) -> [f32; 4] {
        self.inner.media_box(page)
    }

    fn page_content(&self, page: PageId) -> Result<Vec<u8>> {
        self.inner.page_content(page)
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>> {
        self.inner.decode_content(data)
    }

    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String {
        self.inner.decode_text(page, font_name, bytes)
    }

    fn xobject_kind(&self, scope: ResourceScope, name: &[u8]) -> Option<XObjectKind> {
        self.inner.xobject_kind(scope, name)
    }

    fn image_xobject(&self, scope: ResourceScope, name: &[u8]) -> Result<ImageXObject> {
        self.image_loads.set(self.image_loads.get() + 1);
        self.inner.image_xobject(scope, name)
    }

    fn form_xobject(&self, id: ObjectId) -> Result<FormXObject> {
        self.inner.form_xobject(id)
    }
}

#[test]
fn test_only_capped_pages_are_rendered() {
    let pdf = CountingPdf {
        inner: LopdfBackend::load_bytes(&common::image_pdf(4)).unwrap(),
        image_loads: Cell::new(0),
    };
    let text_layer = TextLayerExtractor::default().extract(&pdf);
    assert!(text_layer.needs_ocr);
    pdf.image_loads.set(0);

    let (backend, _calls) = FixedBackend::new(OCR_RESUME);
    let mut engine =
        OcrEngine::with_backend(Box::new(backend), OcrConfig::new().with_max_pages(2));
    let rasterizer = PageRasterizer::default();
    let result = engine
        .recognize_pages(
            rasterizer.raw_pages(&pdf, &text_layer.text_by_page),
            &mut NoProgress,
        )
        .unwrap();

    assert_eq!(pdf.image_loads.get(), 2);
    assert_eq!(result.text_by_page.len(), 4);
    assert!(result.text_by_page[3].contains("first 2 of 4"));
}

#[test]
fn test_ocr_init_failure_keeps_text_layer_result() {
    let mut engine = OcrEngine::with_backend(Box::new(UnavailableBackend), OcrConfig::default());
    let ingestor = Ingestor::default();

    let report = ingestor
        .ingest(&pdf_source("scan.pdf", common::image_pdf(1)), &mut engine, &mut NoProgress)
        .unwrap();

    let diagnostics = &report.diagnostics;
    assert!(!diagnostics.text_extraction_success);
    assert!(diagnostics.has_images);
    assert!(!diagnostics.ocr_processing);
    assert_eq!(diagnostics.extracted_text, SCANNED_DOCUMENT_MESSAGE);
    assert!(diagnostics.ocr_error.is_some());
    assert!(report.record.is_empty());
}

#[test]
fn test_disabled_ocr_never_touches_engine() {
    let (backend, calls) = FixedBackend::new(OCR_RESUME);
    let mut engine = OcrEngine::with_backend(Box::new(backend), OcrConfig::default());
    let ingestor = Ingestor::new(IngestOptions::default().without_ocr());

    let report = ingestor
        .ingest(&pdf_source("scan.pdf", common::image_pdf(1)), &mut engine, &mut NoProgress)
        .unwrap();

    assert!(!report.diagnostics.ocr_processing);
    assert!(report.diagnostics.ocr_error.is_none());
    assert!(calls.borrow().is_empty());
}

#[test]
fn test_report_json_is_camel_case() {
    let pdf = common::text_pdf(&[&[
        "Bob Smith",
        "Site Reliability Engineer at a company",
        "bob@example.org",
    ]]);
    let report = ingest_bytes("bob.pdf", pdf, Some(MIME_PDF), IngestOptions::default()).unwrap();
    let json = report.to_json(false).unwrap();

    assert!(json.contains("\"textExtractionSuccess\""));
    assert!(json.contains("\"processingTimeSeconds\""));
    assert!(json.contains("\"textByPage\""));
    assert!(!json.contains("ocrError"));
}

#[test]
fn test_mismatched_tag_is_decode_error() {
    let docx = common::docx(&["Not a PDF"]);
    let err = ingest_bytes("cv.pdf", docx, Some(MIME_PDF), IngestOptions::default()).unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
}
