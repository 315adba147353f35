//! PDF backend abstraction layer.
//!
//! Provides a trait-based interface for PDF operations, isolating
//! the concrete PDF library (lopdf) from text-layer and raster logic.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId, Stream};

use crate::error::{Error, Result};

/// Page identifier: (object number, generation number).
pub type PageId = ObjectId;

/// US Letter, used when a page declares no usable MediaBox.
pub const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

const MAX_INHERITANCE_DEPTH: usize = 32;

/// A value from a PDF content stream operand.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfValue {
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Other,
}

/// A single operation from a PDF content stream.
#[derive(Debug, Clone)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

/// Where XObject names are looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceScope {
    /// The (possibly inherited) resources of a page
    Page(PageId),
    /// The resources of a Form XObject stream
    Form(ObjectId),
}

/// The subtype of a named XObject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XObjectKind {
    Image,
    Form(ObjectId),
}

/// Color space of an image XObject, reduced to its component layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageColorSpace {
    Gray,
    Rgb,
    Cmyk,
}

impl ImageColorSpace {
    /// Number of color components per sample.
    pub fn components(&self) -> usize {
        match self {
            ImageColorSpace::Gray => 1,
            ImageColorSpace::Rgb => 3,
            ImageColorSpace::Cmyk => 4,
        }
    }
}

/// How the sample data of an image XObject is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageData {
    /// A complete JPEG file (DCTDecode)
    Jpeg(Vec<u8>),
    /// Decompressed, packed samples
    Raw(Vec<u8>),
}

/// An image XObject ready for decoding.
#[derive(Debug, Clone)]
pub struct ImageXObject {
    pub width: u32,
    pub height: u32,
    pub bits_per_component: u8,
    pub color_space: ImageColorSpace,
    /// Stencil mask: 1-bit samples painted in black
    pub is_mask: bool,
    pub data: ImageData,
}

/// A Form XObject: a nested content stream.
#[derive(Debug, Clone)]
pub struct FormXObject {
    pub id: ObjectId,
    pub content: Vec<u8>,
    /// Form space to user space
    pub matrix: [f32; 6],
}

/// Abstract interface for PDF document access.
///
/// Implementations provide page enumeration, content stream decoding,
/// text decoding and XObject access — without exposing any concrete PDF
/// library types.
pub trait PdfBackend {
    /// Return all pages as (page_number → PageId).
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// Return the page's MediaBox as `[x0, y0, x1, y1]`, honoring inheritance.
    fn media_box(&self, page: PageId) -> [f32; 4];

    /// Return the raw (decompressed) content stream bytes for a page.
    fn page_content(&self, page: PageId) -> Result<Vec<u8>>;

    /// Parse raw content stream bytes into a sequence of operations.
    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>>;

    /// Decode a text byte sequence using the font's encoding on the given page.
    /// Falls back to simple decoding if the font or encoding is unavailable.
    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String;

    /// Classify the XObject registered under `name`, if any.
    fn xobject_kind(&self, scope: ResourceScope, name: &[u8]) -> Option<XObjectKind>;

    /// Load the image XObject registered under `name`.
    fn image_xobject(&self, scope: ResourceScope, name: &[u8]) -> Result<ImageXObject>;

    /// Load a Form XObject by object id.
    fn form_xobject(&self, id: ObjectId) -> Result<FormXObject>;
}

/// Simple text decoding fallback when no encoding is available.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    // UTF-16BE with BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

// ---------------------------------------------------------------------------
// LopdfBackend — concrete implementation backed by lopdf
// ---------------------------------------------------------------------------

/// Concrete [`PdfBackend`] backed by `lopdf::Document`.
pub struct LopdfBackend {
    doc: LopdfDocument,
}

impl LopdfBackend {
    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        let doc = LopdfDocument::load_mem(data)?;
        Ok(Self { doc })
    }

    /// Check if the document carries an encryption dictionary.
    pub fn is_encrypted(&self) -> bool {
        self.doc.is_encrypted()
    }

    /// Load from a file path.
    pub fn load_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::load_bytes(&data)
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// Get PDF version string.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> Option<&'a Object> {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).ok(),
            other => Some(other),
        }
    }

    /// Look up a page attribute, walking up the page tree for inherited keys.
    fn inherited(&self, page: PageId, key: &[u8]) -> Option<&Object> {
        let mut current = self.doc.get_dictionary(page).ok()?;
        for _ in 0..MAX_INHERITANCE_DEPTH {
            if let Ok(value) = current.get(key) {
                return self.resolve(value);
            }
            let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
            current = self.doc.get_dictionary(parent).ok()?;
        }
        None
    }

    fn resources(&self, scope: ResourceScope) -> Option<&Dictionary> {
        match scope {
            ResourceScope::Page(page) => self.inherited(page, b"Resources")?.as_dict().ok(),
            ResourceScope::Form(id) => {
                let stream = self.doc.get_object(id).ok()?.as_stream().ok()?;
                self.resolve(stream.dict.get(b"Resources").ok()?)?
                    .as_dict()
                    .ok()
            }
        }
    }

    /// Find the XObject entry `name`; streams are always indirect.
    fn xobject_entry(&self, scope: ResourceScope, name: &[u8]) -> Option<(ObjectId, &Stream)> {
        let resources = self.resources(scope)?;
        let xobjects = self.resolve(resources.get(b"XObject").ok()?)?.as_dict().ok()?;
        let id = xobjects.get(name).ok()?.as_reference().ok()?;
        let stream = self.doc.get_object(id).ok()?.as_stream().ok()?;
        Some((id, stream))
    }

    fn color_space(&self, dict: &Dictionary) -> Result<ImageColorSpace> {
        let Some(cs) = dict.get(b"ColorSpace").ok().and_then(|o| self.resolve(o)) else {
            // Masks and JPEGs may omit the color space
            return Ok(ImageColorSpace::Gray);
        };

        match cs {
            Object::Name(name) => color_space_from_name(name),
            Object::Array(arr) => {
                let family = arr
                    .first()
                    .and_then(|o| o.as_name().ok())
                    .ok_or_else(|| Error::Image("malformed color space".to_string()))?;
                if family == b"ICCBased" {
                    let n = arr
                        .get(1)
                        .and_then(|o| self.resolve(o))
                        .and_then(|o| o.as_stream().ok())
                        .and_then(|s| s.dict.get(b"N").ok())
                        .and_then(|n| n.as_i64().ok())
                        .unwrap_or(3);
                    match n {
                        1 => Ok(ImageColorSpace::Gray),
                        4 => Ok(ImageColorSpace::Cmyk),
                        _ => Ok(ImageColorSpace::Rgb),
                    }
                } else {
                    color_space_from_name(family)
                }
            }
            _ => Err(Error::Image("malformed color space".to_string())),
        }
    }
}

fn color_space_from_name(name: &[u8]) -> Result<ImageColorSpace> {
    match name {
        b"DeviceGray" | b"CalGray" | b"G" => Ok(ImageColorSpace::Gray),
        b"DeviceRGB" | b"CalRGB" | b"RGB" => Ok(ImageColorSpace::Rgb),
        b"DeviceCMYK" | b"CMYK" => Ok(ImageColorSpace::Cmyk),
        other => Err(Error::Image(format!(
            "unsupported color space {}",
            String::from_utf8_lossy(other)
        ))),
    }
}

fn filter_names(dict: &Dictionary) -> Vec<Vec<u8>> {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![name.clone()],
        Ok(Object::Array(arr)) => arr
            .iter()
            .filter_map(|o| o.as_name().ok().map(|n| n.to_vec()))
            .collect(),
        _ => Vec::new(),
    }
}

fn dict_u32(dict: &Dictionary, key: &[u8]) -> Option<u32> {
    dict.get(key)
        .ok()
        .and_then(|o| o.as_i64().ok())
        .and_then(|v| u32::try_from(v).ok())
}

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn media_box(&self, page: PageId) -> [f32; 4] {
        let Some(Object::Array(arr)) = self.inherited(page, b"MediaBox") else {
            return DEFAULT_MEDIA_BOX;
        };
        let values: Vec<f32> = arr
            .iter()
            .filter_map(|o| self.resolve(o))
            .filter_map(get_number)
            .collect();
        match values.as_slice() {
            [x0, y0, x1, y1] if (x1 - x0).abs() > 0.0 && (y1 - y0).abs() > 0.0 => [
                x0.min(*x1),
                y0.min(*y1),
                x0.max(*x1),
                y0.max(*y1),
            ],
            _ => DEFAULT_MEDIA_BOX,
        }
    }

    fn page_content(&self, page_id: PageId) -> Result<Vec<u8>> {
        let page_dict = self.doc.get_dictionary(page_id)?;

        // A page without Contents is blank
        let Ok(contents) = page_dict.get(b"Contents") else {
            return Ok(Vec::new());
        };

        match contents {
            Object::Reference(r) => match self.doc.get_object(*r)? {
                Object::Stream(s) => Ok(decompress(s)?),
                Object::Array(arr) => Ok(self.concat_streams(arr)),
                _ => Err(Error::Decode("invalid content stream".to_string())),
            },
            Object::Array(arr) => Ok(self.concat_streams(arr)),
            _ => Err(Error::Decode("invalid content stream".to_string())),
        }
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>> {
        let content = lopdf::content::Content::decode(data)?;

        Ok(content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operator: op.operator,
                operands: op.operands.iter().map(convert_object).collect(),
            })
            .collect())
    }

    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String {
        if let Ok(fonts) = self.doc.get_page_fonts(page) {
            if let Some(font_dict) = fonts.get(font_name) {
                if let Ok(enc) = font_dict.get_font_encoding(&self.doc) {
                    if let Ok(text) = LopdfDocument::decode_text(&enc, bytes) {
                        return text;
                    }
                }
            }
        }
        decode_text_simple(bytes)
    }

    fn xobject_kind(&self, scope: ResourceScope, name: &[u8]) -> Option<XObjectKind> {
        let (id, stream) = self.xobject_entry(scope, name)?;
        match stream.dict.get(b"Subtype").ok()?.as_name().ok()? {
            b"Image" => Some(XObjectKind::Image),
            b"Form" => Some(XObjectKind::Form(id)),
            _ => None,
        }
    }

    fn image_xobject(&self, scope: ResourceScope, name: &[u8]) -> Result<ImageXObject> {
        let (_, stream) = self.xobject_entry(scope, name).ok_or_else(|| {
            Error::Image(format!(
                "missing image XObject /{}",
                String::from_utf8_lossy(name)
            ))
        })?;
        let dict = &stream.dict;

        let width = dict_u32(dict, b"Width").unwrap_or(0);
        let height = dict_u32(dict, b"Height").unwrap_or(0);
        if width == 0 || height == 0 {
            return Err(Error::Image("image has no dimensions".to_string()));
        }

        let is_mask = matches!(dict.get(b"ImageMask"), Ok(Object::Boolean(true)));
        let bits_per_component = if is_mask {
            1
        } else {
            dict_u32(dict, b"BitsPerComponent").unwrap_or(8) as u8
        };
        let color_space = if is_mask {
            ImageColorSpace::Gray
        } else {
            self.color_space(dict)?
        };

        let filters = filter_names(dict);
        let data = if filters.iter().any(|f| f == b"DCTDecode" || f == b"DCT") {
            if filters.len() == 1 {
                ImageData::Jpeg(stream.content.clone())
            } else {
                return Err(Error::Image("chained JPEG filters".to_string()));
            }
        } else if let Some(other) = filters.iter().find(|f| {
            matches!(
                f.as_slice(),
                b"JPXDecode" | b"CCITTFaxDecode" | b"JBIG2Decode"
            )
        }) {
            return Err(Error::Image(format!(
                "unsupported image filter {}",
                String::from_utf8_lossy(other)
            )));
        } else {
            ImageData::Raw(decompress(stream)?)
        };

        Ok(ImageXObject {
            width,
            height,
            bits_per_component,
            color_space,
            is_mask,
            data,
        })
    }

    fn form_xobject(&self, id: ObjectId) -> Result<FormXObject> {
        let stream = self.doc.get_object(id)?.as_stream()?;
        let matrix = match stream.dict.get(b"Matrix") {
            Ok(Object::Array(arr)) if arr.len() == 6 => {
                let mut m = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
                for (slot, value) in m.iter_mut().zip(arr.iter()) {
                    if let Some(v) = get_number(value) {
                        *slot = v;
                    }
                }
                m
            }
            _ => [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
        };
        Ok(FormXObject {
            id,
            content: decompress(stream)?,
            matrix,
        })
    }
}

impl LopdfBackend {
    fn concat_streams(&self, arr: &[Object]) -> Vec<u8> {
        let mut content = Vec::new();
        for obj in arr {
            if let Object::Reference(r) = obj {
                if let Ok(Object::Stream(s)) = self.doc.get_object(*r) {
                    match decompress(s) {
                        Ok(data) => {
                            content.extend_from_slice(&data);
                            content.push(b' ');
                        }
                        Err(e) => log::warn!("Skipping unreadable content stream {:?}: {}", r, e),
                    }
                }
            }
        }
        content
    }
}

/// Decompressed stream bytes; unfiltered streams are returned as stored.
fn decompress(stream: &Stream) -> Result<Vec<u8>> {
    if filter_names(&stream.dict).is_empty() {
        return Ok(stream.content.clone());
    }
    Ok(stream.decompressed_content()?)
}

/// Convert a `lopdf::Object` to [`PdfValue`].
fn convert_object(obj: &Object) -> PdfValue {
    match obj {
        Object::Integer(i) => PdfValue::Integer(*i),
        Object::Real(r) => PdfValue::Real(*r),
        Object::Name(n) => PdfValue::Name(n.clone()),
        Object::String(b, _) => PdfValue::Str(b.clone()),
        Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        _ => PdfValue::Other,
    }
}

fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Helper: extract a number from a [`PdfValue`].
pub fn get_number_from_value(val: &PdfValue) -> Option<f32> {
    match val {
        PdfValue::Integer(i) => Some(*i as f32),
        PdfValue::Real(r) => Some(*r),
        _ => None,
    }
}

/// Helper: read six numeric operands as a matrix.
pub fn matrix_from_operands(operands: &[PdfValue]) -> Option<[f32; 6]> {
    if operands.len() < 6 {
        return None;
    }
    let mut m = [0.0f32; 6];
    for (slot, value) in m.iter_mut().zip(operands.iter()) {
        *slot = get_number_from_value(value)?;
    }
    Some(m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_text_simple_utf8() {
        assert_eq!(decode_text_simple(b"Hello"), "Hello");
        assert_eq!(decode_text_simple("张三".as_bytes()), "张三");
    }

    #[test]
    fn test_decode_text_simple_latin1() {
        // 0xE9 = 'é' in Latin-1
        let bytes = vec![0x48, 0x65, 0x6C, 0x6C, 0xE9];
        assert_eq!(decode_text_simple(&bytes), "Hellé");
    }

    #[test]
    fn test_decode_text_simple_utf16be() {
        let bytes = vec![0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69];
        assert_eq!(decode_text_simple(&bytes), "Hi");
    }

    #[test]
    fn test_get_number_from_value() {
        assert_eq!(get_number_from_value(&PdfValue::Integer(42)), Some(42.0));
        assert_eq!(get_number_from_value(&PdfValue::Real(2.5)), Some(2.5));
        assert_eq!(get_number_from_value(&PdfValue::Other), None);
    }

    #[test]
    fn test_matrix_from_operands() {
        let ops = vec![
            PdfValue::Integer(2),
            PdfValue::Integer(0),
            PdfValue::Integer(0),
            PdfValue::Real(3.0),
            PdfValue::Integer(10),
            PdfValue::Integer(20),
        ];
        assert_eq!(
            matrix_from_operands(&ops),
            Some([2.0, 0.0, 0.0, 3.0, 10.0, 20.0])
        );
        assert_eq!(matrix_from_operands(&ops[..4]), None);
    }

    #[test]
    fn test_load_garbage_is_decode_error() {
        let err = LopdfBackend::load_bytes(b"%PDF-1.4\nthis is not a pdf").err();
        assert!(matches!(err, Some(Error::Decode(_)) | Some(Error::Io(_))));
    }

    #[test]
    fn test_color_space_names() {
        assert_eq!(color_space_from_name(b"DeviceGray").unwrap(), ImageColorSpace::Gray);
        assert_eq!(color_space_from_name(b"DeviceCMYK").unwrap().components(), 4);
        assert!(color_space_from_name(b"Indexed").is_err());
    }
}
