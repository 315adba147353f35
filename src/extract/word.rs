//! Word-processor (DOCX) text extraction.
//!
//! A DOCX file is a zip archive whose body lives in `word/document.xml`.
//! Only the visible text runs are read: `<w:t>` content, tabs, and breaks,
//! with one output line per paragraph.

use std::io::{Cursor, Read};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::TextExtractor;
use crate::detect::DocumentKind;
use crate::error::{Error, Result};
use crate::model::{is_sufficient, ExtractionResult};

const DOCUMENT_PART: &str = "word/document.xml";

/// Upper bound on the uncompressed body part, to refuse zip bombs.
const MAX_DOCUMENT_PART_BYTES: u64 = 64 * 1024 * 1024;

static WORD_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<w:t(?:\s[^>]*)?>(.*?)</w:t>|<w:tab\b[^>]*/>|<w:(?:br|cr)\b[^>]*/>|</w:p>")
        .unwrap()
});

static XML_ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(lt|gt|amp|quot|apos|#[0-9]+|#x[0-9A-Fa-f]+);").unwrap());

/// DOCX text extractor.
#[derive(Debug, Clone, Default)]
pub struct DocxExtractor {
    _private: (),
}

impl DocxExtractor {
    /// Create a new DOCX extractor.
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Read the raw text of a DOCX archive, one line per paragraph.
    pub fn raw_text(&self, bytes: &[u8]) -> Result<String> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
        let part = archive.by_name(DOCUMENT_PART)?;
        if part.size() > MAX_DOCUMENT_PART_BYTES {
            return Err(Error::Decode(format!(
                "{} is too large ({} bytes)",
                DOCUMENT_PART,
                part.size()
            )));
        }

        let mut xml = String::new();
        part.take(MAX_DOCUMENT_PART_BYTES)
            .read_to_string(&mut xml)
            .map_err(|e| Error::Decode(format!("{} is not UTF-8 XML: {}", DOCUMENT_PART, e)))?;

        Ok(document_xml_to_text(&xml))
    }
}

impl TextExtractor for DocxExtractor {
    fn kinds(&self) -> &[DocumentKind] {
        &[DocumentKind::Docx]
    }

    fn name(&self) -> &str {
        "docx"
    }

    fn extract_bytes(&self, bytes: &[u8]) -> Result<ExtractionResult> {
        let text = self.raw_text(bytes)?;
        log::debug!("DOCX body: {} characters", text.chars().count());
        Ok(ExtractionResult {
            success: is_sufficient(&text),
            text_by_page: vec![text.clone()],
            full_text: text,
            has_images: false,
            needs_ocr: false,
            ocr_processed: false,
        })
    }
}

/// Convert WordprocessingML body XML to plain text.
pub fn document_xml_to_text(xml: &str) -> String {
    let mut text = String::new();
    for token in WORD_TOKEN.captures_iter(xml) {
        if let Some(run) = token.get(1) {
            text.push_str(&unescape_xml(run.as_str()));
            continue;
        }
        let tag = token.get(0).map(|m| m.as_str()).unwrap_or_default();
        if tag.starts_with("<w:tab") {
            text.push('\t');
        } else {
            text.push('\n');
        }
    }

    text.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Resolve the predefined XML entities and character references.
pub fn unescape_xml(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    XML_ENTITY
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            let resolved = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => {
                    let code = if let Some(hex) = entity.strip_prefix("#x") {
                        u32::from_str_radix(hex, 16).ok()
                    } else {
                        entity[1..].parse::<u32>().ok()
                    };
                    code.and_then(char::from_u32)
                }
            };
            resolved
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .to_string()
}
