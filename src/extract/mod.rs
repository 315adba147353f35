//! Text extractors for each ingestible document kind.
//!
//! Extractors are registered per [`DocumentKind`]. The ingestion
//! orchestrator looks up every document in the registry, so registering an
//! extractor takes over its kinds.
//!
//! # Example
//!
//! ```no_run
//! use unresume::extract::ExtractorRegistry;
//! use unresume::DocumentKind;
//!
//! fn main() -> unresume::Result<()> {
//!     let registry = ExtractorRegistry::with_defaults();
//!     let bytes = std::fs::read("resume.pdf")?;
//!     let result = registry.extract(DocumentKind::Pdf, &bytes)?;
//!     println!("{}", result.full_text);
//!     Ok(())
//! }
//! ```

mod word;

pub use word::{document_xml_to_text, unescape_xml, DocxExtractor};

use std::collections::HashMap;
use std::sync::Arc;

use crate::detect::DocumentKind;
use crate::error::{Error, Result};
use crate::model::ExtractionResult;
use crate::pdf::{ExtractOptions, TextLayerExtractor};

/// Trait for document text extractors.
///
/// Implement this trait to add support for a new document kind.
pub trait TextExtractor: Send + Sync {
    /// The document kinds this extractor reads.
    fn kinds(&self) -> &[DocumentKind];

    /// Get the name of this extractor.
    fn name(&self) -> &str;

    /// Extract text from document bytes.
    fn extract_bytes(&self, bytes: &[u8]) -> Result<ExtractionResult>;

    /// Check if this extractor reads the given kind.
    fn supports(&self, kind: DocumentKind) -> bool {
        self.kinds().contains(&kind)
    }
}

/// PDF text-layer extractor.
#[derive(Debug, Clone, Default)]
pub struct PdfExtractor {
    inner: TextLayerExtractor,
}

impl PdfExtractor {
    /// Create a PDF extractor with the given options.
    pub fn new(options: ExtractOptions) -> Self {
        Self {
            inner: TextLayerExtractor::new(options),
        }
    }
}

impl TextExtractor for PdfExtractor {
    fn kinds(&self) -> &[DocumentKind] {
        &[DocumentKind::Pdf]
    }

    fn name(&self) -> &str {
        "pdf"
    }

    fn extract_bytes(&self, bytes: &[u8]) -> Result<ExtractionResult> {
        self.inner.extract_bytes(bytes)
    }
}

/// Registry mapping document kinds to extractors.
pub struct ExtractorRegistry {
    by_kind: HashMap<DocumentKind, Arc<dyn TextExtractor>>,
}

impl ExtractorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            by_kind: HashMap::new(),
        }
    }

    /// Create a registry with the PDF and DOCX extractors.
    pub fn with_defaults() -> Self {
        Self::with_options(ExtractOptions::default())
    }

    /// Create a registry with the default extractors, configuring the PDF one.
    pub fn with_options(options: ExtractOptions) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PdfExtractor::new(options)));
        registry.register(Arc::new(DocxExtractor::new()));
        registry
    }

    /// Register an extractor for all its kinds, replacing earlier ones.
    pub fn register(&mut self, extractor: Arc<dyn TextExtractor>) {
        for kind in extractor.kinds() {
            self.by_kind.insert(*kind, extractor.clone());
        }
    }

    /// Get an extractor by document kind.
    pub fn get(&self, kind: DocumentKind) -> Option<Arc<dyn TextExtractor>> {
        self.by_kind.get(&kind).cloned()
    }

    /// Check if a kind has an extractor.
    pub fn supports(&self, kind: DocumentKind) -> bool {
        self.by_kind.contains_key(&kind)
    }

    /// Extract text with the extractor registered for `kind`.
    pub fn extract(&self, kind: DocumentKind, bytes: &[u8]) -> Result<ExtractionResult> {
        let extractor = self
            .get(kind)
            .ok_or_else(|| Error::UnsupportedFormat(format!("no extractor for {}", kind)))?;
        log::debug!("Extracting {} with '{}'", kind, extractor.name());
        extractor.extract_bytes(bytes)
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
