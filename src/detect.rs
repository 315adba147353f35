//! Document kind detection from declared type tags and magic bytes.

use crate::error::{Error, Result};
use std::path::Path;

/// MIME type for PDF documents.
pub const MIME_PDF: &str = "application/pdf";
/// MIME type for Office Open XML word-processor documents.
pub const MIME_DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
/// MIME type for legacy binary Word documents.
pub const MIME_MSWORD: &str = "application/msword";

const PDF_MAGIC: &[u8] = b"%PDF-";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G'];
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const GIF_MAGIC: &[u8] = b"GIF8";

/// The kind of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// Portable Document Format
    Pdf,
    /// Office Open XML word-processor document (.docx)
    Docx,
    /// Legacy binary Word document (.doc)
    LegacyWord,
    /// Raster image (avatar uploads); never ingested
    Image,
}

impl DocumentKind {
    /// Resolve a declared MIME-type-like tag.
    ///
    /// Parameters after `;` are ignored and matching is case-insensitive.
    pub fn from_mime(tag: &str) -> Result<Self> {
        let essence = tag
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            MIME_PDF => Ok(DocumentKind::Pdf),
            MIME_DOCX => Ok(DocumentKind::Docx),
            MIME_MSWORD => Ok(DocumentKind::LegacyWord),
            s if s.starts_with("image/") => Ok(DocumentKind::Image),
            _ => Err(Error::UnsupportedFormat(tag.to_string())),
        }
    }

    /// Resolve a file extension (without the leading dot).
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Ok(DocumentKind::Pdf),
            "docx" => Ok(DocumentKind::Docx),
            "doc" => Ok(DocumentKind::LegacyWord),
            "png" | "jpg" | "jpeg" | "gif" | "bmp" | "webp" => Ok(DocumentKind::Image),
            other => Err(Error::UnsupportedFormat(format!(".{}", other))),
        }
    }

    /// Resolve the kind of a file from its path extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| {
                Error::UnsupportedFormat(format!("{} has no extension", path.display()))
            })?;
        Self::from_extension(ext)
    }

    /// Canonical MIME type for this kind.
    pub fn mime_type(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => MIME_PDF,
            DocumentKind::Docx => MIME_DOCX,
            DocumentKind::LegacyWord => MIME_MSWORD,
            DocumentKind::Image => "image/*",
        }
    }

    /// Whether the pipeline extracts text from this kind.
    pub fn is_ingestible(&self) -> bool {
        matches!(self, DocumentKind::Pdf | DocumentKind::Docx)
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DocumentKind::Pdf => "PDF",
            DocumentKind::Docx => "DOCX",
            DocumentKind::LegacyWord => "DOC",
            DocumentKind::Image => "image",
        };
        f.write_str(name)
    }
}

/// Sniff the document kind from leading bytes.
pub fn detect_kind_from_bytes(data: &[u8]) -> Result<DocumentKind> {
    if data.starts_with(PDF_MAGIC) {
        Ok(DocumentKind::Pdf)
    } else if data.starts_with(ZIP_MAGIC) {
        Ok(DocumentKind::Docx)
    } else if data.starts_with(OLE_MAGIC) {
        Ok(DocumentKind::LegacyWord)
    } else if data.starts_with(PNG_MAGIC)
        || data.starts_with(JPEG_MAGIC)
        || data.starts_with(GIF_MAGIC)
    {
        Ok(DocumentKind::Image)
    } else {
        Err(Error::UnsupportedFormat(
            "unrecognized file signature".to_string(),
        ))
    }
}

/// Check if bytes start with a PDF header.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    data.starts_with(PDF_MAGIC)
}

/// Resolve the kind of an upload: the declared tag wins, sniffing is the fallback.
///
/// A declared PDF whose bytes lack the PDF header is a decode error rather
/// than a format error, matching how a corrupt upload is reported.
pub fn resolve_kind(declared: Option<&str>, data: &[u8]) -> Result<DocumentKind> {
    let kind = match declared {
        Some(tag) => DocumentKind::from_mime(tag)?,
        None => detect_kind_from_bytes(data)?,
    };

    if kind == DocumentKind::Pdf && !is_pdf_bytes(data) {
        return Err(Error::Decode("missing %PDF- header".to_string()));
    }

    Ok(kind)
}
