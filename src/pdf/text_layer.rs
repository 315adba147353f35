//! Text-layer extraction.
//!
//! Walks each page's content stream to collect positioned glyph runs,
//! rebuilds reading-order lines from their coordinates, and classifies the
//! document as usable text, scanned (image-only), or unreadable.

use std::collections::HashSet;

use lopdf::ObjectId;
use rayon::prelude::*;

use super::backend::{
    get_number_from_value, ContentOp, LopdfBackend, PageId, PdfBackend, PdfValue, ResourceScope,
    XObjectKind,
};
use super::options::ExtractOptions;
use crate::error::{Error, Result};
use crate::model::{is_sufficient, ExtractionResult};
use crate::text::{is_spaceless_script_char, CleanupPipeline};

/// Diagnostic for a document whose pages are images.
pub const SCANNED_DOCUMENT_MESSAGE: &str =
    "This PDF appears to be a scanned or image-only document, so its text cannot be read directly. Trying OCR...";

/// Diagnostic for a document with neither usable text nor images.
pub const UNREADABLE_DOCUMENT_MESSAGE: &str =
    "Could not extract text from this PDF. It may be encrypted or use special fonts.";

/// Nesting limit for Form XObjects.
pub const MAX_FORM_DEPTH: usize = 8;

/// TJ adjustment (thousandths of text space) treated as a word gap.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// Sentinel text for a page whose extraction failed.
pub fn page_failure_sentinel(page: u32, reason: &str) -> String {
    format!("[unable to extract page {}: {}]", page, reason)
}

/// A positioned piece of text from a content stream.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphRun {
    pub text: String,
    pub x: f32,
    pub y: f32,
}

impl GlyphRun {
    /// Create a new glyph run.
    pub fn new(text: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
        }
    }
}

/// Group glyph runs into reading-order lines.
///
/// Runs are ordered top to bottom (descending `y`). A run joins the current
/// line while its `y` is within `tolerance` of the previous run's `y`; each
/// line is then ordered left to right and joined with single spaces.
pub fn group_runs_into_lines(mut runs: Vec<GlyphRun>, tolerance: f32) -> Vec<String> {
    if runs.is_empty() {
        return Vec::new();
    }

    runs.sort_by(|a, b| b.y.partial_cmp(&a.y).unwrap_or(std::cmp::Ordering::Equal));

    let mut lines: Vec<Vec<GlyphRun>> = Vec::new();
    let mut current: Vec<GlyphRun> = Vec::new();

    for run in runs {
        match current.last() {
            Some(prev) if (run.y - prev.y).abs() < tolerance => current.push(run),
            Some(_) => {
                lines.push(std::mem::take(&mut current));
                current.push(run);
            }
            None => current.push(run),
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines
        .into_iter()
        .map(|mut line| {
            line.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
            line.iter()
                .map(|r| r.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

/// What a single content-stream walk found on one page.
#[derive(Debug, Clone, Default)]
pub struct PageScan {
    pub runs: Vec<GlyphRun>,
    pub paints_image: bool,
}

/// Text-layer extractor.
#[derive(Debug, Clone, Default)]
pub struct TextLayerExtractor {
    options: ExtractOptions,
}

impl TextLayerExtractor {
    /// Create an extractor with the given options.
    pub fn new(options: ExtractOptions) -> Self {
        Self { options }
    }

    /// The active options.
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Decode `data` as a PDF and extract its text layer.
    pub fn extract_bytes(&self, data: &[u8]) -> Result<ExtractionResult> {
        let backend = LopdfBackend::load_bytes(data)?;
        Ok(self.extract(&backend))
    }

    /// Extract the text layer from an opened document.
    ///
    /// Never fails: a page that cannot be read gets a sentinel entry in
    /// `text_by_page` and contributes nothing to `full_text`.
    pub fn extract<B: PdfBackend>(&self, backend: &B) -> ExtractionResult {
        let pages = backend.pages();
        log::debug!("Extracting text layer from {} pages", pages.len());

        let scans: Vec<(u32, std::result::Result<PageScan, String>)> = pages
            .iter()
            .map(|(&number, &page_id)| {
                let scan = scan_page(backend, page_id).map_err(|e| {
                    let failure = Error::PageExtraction {
                        page: number,
                        message: e.to_string(),
                    };
                    log::warn!("Text layer unreadable: {}", failure);
                    e.to_string()
                });
                (number, scan)
            })
            .collect();

        let has_images = scans
            .iter()
            .any(|(_, scan)| scan.as_ref().map(|s| s.paints_image).unwrap_or(false));

        let tolerance = self.options.line_tolerance;
        let build = |(number, scan): &(u32, std::result::Result<PageScan, String>)| match scan {
            Ok(scan) => Ok(group_runs_into_lines(scan.runs.clone(), tolerance).join("\n")),
            Err(reason) => Err(page_failure_sentinel(*number, reason)),
        };
        let page_texts: Vec<std::result::Result<String, String>> = if self.options.parallel {
            scans.par_iter().map(build).collect()
        } else {
            scans.iter().map(build).collect()
        };

        let mut raw = String::new();
        let mut text_by_page = Vec::with_capacity(page_texts.len());
        for page in page_texts {
            match page {
                Ok(text) => {
                    raw.push_str(&text);
                    raw.push_str("\n\n");
                    text_by_page.push(text);
                }
                Err(sentinel) => text_by_page.push(sentinel),
            }
        }

        let full_text = CleanupPipeline::new(self.options.cleanup.clone()).process(&raw);
        let success = is_sufficient(&full_text);
        log::info!(
            "Text layer: {} characters, success={}, has_images={}",
            full_text.chars().count(),
            success,
            has_images
        );

        if success {
            return ExtractionResult {
                full_text,
                text_by_page,
                success,
                has_images,
                needs_ocr: false,
                ocr_processed: false,
            };
        }

        let message = if has_images {
            SCANNED_DOCUMENT_MESSAGE
        } else {
            UNREADABLE_DOCUMENT_MESSAGE
        };
        ExtractionResult {
            full_text: message.to_string(),
            text_by_page: vec![message.to_string(); text_by_page.len()],
            success: false,
            has_images,
            needs_ocr: has_images,
            ocr_processed: false,
        }
    }
}

/// Walk one page's content stream.
pub fn scan_page<B: PdfBackend>(backend: &B, page_id: PageId) -> Result<PageScan> {
    let content = backend.page_content(page_id)?;
    let ops = backend.decode_content(&content)?;

    let mut scan = PageScan {
        runs: collect_runs(backend, page_id, &ops),
        paints_image: false,
    };
    let mut visited = HashSet::new();
    scan.paints_image = ops_paint_image(
        backend,
        ResourceScope::Page(page_id),
        &ops,
        0,
        &mut visited,
    );
    Ok(scan)
}

/// Whether `ops` (or a Form XObject they invoke) paints an image.
fn ops_paint_image<B: PdfBackend>(
    backend: &B,
    scope: ResourceScope,
    ops: &[ContentOp],
    depth: usize,
    visited: &mut HashSet<ObjectId>,
) -> bool {
    for op in ops {
        match op.operator.as_str() {
            "BI" | "ID" | "EI" => return true,
            "Do" => {
                let Some(PdfValue::Name(name)) = op.operands.first() else {
                    continue;
                };
                match backend.xobject_kind(scope, name) {
                    Some(XObjectKind::Image) => return true,
                    Some(XObjectKind::Form(id)) if depth < MAX_FORM_DEPTH && visited.insert(id) => {
                        let nested = backend
                            .form_xobject(id)
                            .and_then(|form| backend.decode_content(&form.content));
                        match nested {
                            Ok(nested) => {
                                if ops_paint_image(
                                    backend,
                                    ResourceScope::Form(id),
                                    &nested,
                                    depth + 1,
                                    visited,
                                ) {
                                    return true;
                                }
                            }
                            Err(e) => log::debug!("Skipping form XObject {:?}: {}", id, e),
                        }
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }
    false
}

/// Collect positioned text runs from decoded operations.
fn collect_runs<B: PdfBackend>(backend: &B, page_id: PageId, ops: &[ContentOp]) -> Vec<GlyphRun> {
    let mut runs = Vec::new();
    let mut font_name: Vec<u8> = Vec::new();
    let mut matrix = TextMatrix::default();
    let mut in_text_block = false;

    let decode = |font: &[u8], bytes: &[u8]| backend.decode_text(page_id, font, bytes);

    for op in ops {
        match op.operator.as_str() {
            "BT" => {
                in_text_block = true;
                matrix.reset();
            }
            "ET" => in_text_block = false,
            "Tf" => {
                if let Some(PdfValue::Name(name)) = op.operands.first() {
                    font_name = name.clone();
                }
            }
            "TL" => {
                if let Some(leading) = op.operands.first().and_then(get_number_from_value) {
                    matrix.leading = leading;
                }
            }
            "Td" | "TD" => {
                if op.operands.len() >= 2 {
                    let tx = get_number_from_value(&op.operands[0]).unwrap_or(0.0);
                    let ty = get_number_from_value(&op.operands[1]).unwrap_or(0.0);
                    if op.operator == "TD" {
                        matrix.leading = -ty;
                    }
                    matrix.translate(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = super::backend::matrix_from_operands(&op.operands) {
                    matrix.set(m);
                }
            }
            "T*" => matrix.next_line(),
            "Tj" | "TJ" | "'" | "\"" => {
                if op.operator == "'" || op.operator == "\"" {
                    matrix.next_line();
                }
                if !in_text_block {
                    continue;
                }

                let text = match op.operator.as_str() {
                    "TJ" => match op.operands.first() {
                        Some(PdfValue::Array(items)) => {
                            decode_tj_array(items, |bytes| decode(&font_name, bytes))
                        }
                        _ => String::new(),
                    },
                    "\"" => match op.operands.get(2) {
                        Some(PdfValue::Str(bytes)) => decode(&font_name, bytes),
                        _ => String::new(),
                    },
                    _ => match op.operands.first() {
                        Some(PdfValue::Str(bytes)) => decode(&font_name, bytes),
                        _ => String::new(),
                    },
                };

                if !text.trim().is_empty() {
                    let (x, y) = matrix.position();
                    runs.push(GlyphRun::new(text, x, y));
                }
            }
            _ => {}
        }
    }

    runs
}

/// Join the strings of a TJ array, inserting a space at large gaps.
fn decode_tj_array<F>(items: &[PdfValue], mut decode: F) -> String
where
    F: FnMut(&[u8]) -> String,
{
    let mut combined = String::new();
    for item in items {
        match item {
            PdfValue::Str(bytes) => combined.push_str(&decode(bytes)),
            PdfValue::Integer(_) | PdfValue::Real(_) => {
                let adjustment = -get_number_from_value(item).unwrap_or(0.0);
                if adjustment > TJ_SPACE_THRESHOLD
                    && !combined.is_empty()
                    && !combined.ends_with(' ')
                    && !combined.ends_with('\u{00A0}')
                    && !combined
                        .chars()
                        .last()
                        .map(is_spaceless_script_char)
                        .unwrap_or(false)
                {
                    combined.push(' ');
                }
            }
            _ => {}
        }
    }
    combined
}

/// Text matrix for tracking position in content stream.
#[derive(Debug, Clone)]
struct TextMatrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
    leading: f32,
}

impl Default for TextMatrix {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
            leading: 0.0,
        }
    }
}

impl TextMatrix {
    fn reset(&mut self) {
        let leading = self.leading;
        *self = Self {
            leading,
            ..Self::default()
        };
    }

    fn set(&mut self, m: [f32; 6]) {
        let [a, b, c, d, e, f] = m;
        self.a = a;
        self.b = b;
        self.c = c;
        self.d = d;
        self.e = e;
        self.f = f;
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        self.e += tx * self.a + ty * self.c;
        self.f += tx * self.b + ty * self.d;
    }

    fn next_line(&mut self) {
        // Zero leading still needs to move down, otherwise T* lines merge
        let leading = if self.leading == 0.0 { 12.0 } else { self.leading };
        self.translate(0.0, -leading);
    }

    fn position(&self) -> (f32, f32) {
        (self.e, self.f)
    }
}
