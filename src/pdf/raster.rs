//! Page rasterization.
//!
//! Produces one bitmap per page for OCR and previews. Only image content is
//! painted: embedded image XObjects are decoded and composited onto a white
//! canvas through the current transformation matrix. Text glyphs are not
//! drawn, since pages are only rasterized when their text layer is unusable.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

use super::backend::{
    matrix_from_operands, ContentOp, ImageColorSpace, ImageData, ImageXObject, LopdfBackend,
    PageId, PdfBackend, PdfValue, ResourceScope, XObjectKind,
};
use super::options::{ExtractOptions, DEFAULT_RENDER_SCALE, MAX_RENDER_DIMENSION};
use super::text_layer::MAX_FORM_DEPTH;
use crate::error::{Error, Result};
use crate::model::RawPage;

type Matrix = [f32; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// `m1 × m2` in PDF row-vector convention (apply `m1` first).
fn multiply(m1: &Matrix, m2: &Matrix) -> Matrix {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

fn apply(m: &Matrix, x: f32, y: f32) -> (f32, f32) {
    (m[0] * x + m[2] * y + m[4], m[1] * x + m[3] * y + m[5])
}

/// Renders PDF pages to RGB bitmaps.
#[derive(Debug, Clone)]
pub struct PageRasterizer {
    scale: f32,
}

impl Default for PageRasterizer {
    fn default() -> Self {
        Self::new(DEFAULT_RENDER_SCALE)
    }
}

impl PageRasterizer {
    /// Create a rasterizer; scales below 1.5 are raised to 1.5.
    pub fn new(scale: f32) -> Self {
        let scale = if scale.is_finite() {
            scale.max(DEFAULT_RENDER_SCALE)
        } else {
            DEFAULT_RENDER_SCALE
        };
        Self { scale }
    }

    /// Create a rasterizer from extract options.
    pub fn from_options(options: &ExtractOptions) -> Self {
        Self::new(options.effective_render_scale())
    }

    /// The scale factor in use.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Decode `data` as a PDF and render every page.
    ///
    /// Fails only when the document itself cannot be decoded.
    pub fn rasterize_bytes(&self, data: &[u8]) -> Result<Vec<Option<RgbImage>>> {
        let backend = LopdfBackend::load_bytes(data)?;
        Ok(self.rasterize(&backend))
    }

    /// Render every page in order. A page that fails to render is `None`.
    pub fn rasterize<B: PdfBackend>(&self, backend: &B) -> Vec<Option<RgbImage>> {
        backend
            .pages()
            .into_iter()
            .map(|(number, page_id)| self.try_render(backend, number, page_id))
            .collect()
    }

    /// Pair each page's text with its raster, rendering on demand.
    ///
    /// A page is rendered only when the iterator reaches it, so a consumer
    /// that stops early never pays for the remaining pages and holds one
    /// bitmap at a time. `texts` is index-aligned with the pages; missing
    /// entries become empty text.
    pub fn raw_pages<'a, B: PdfBackend>(
        &'a self,
        backend: &'a B,
        texts: &'a [String],
    ) -> impl ExactSizeIterator<Item = RawPage> + 'a {
        backend
            .pages()
            .into_iter()
            .enumerate()
            .map(move |(i, (number, page_id))| {
                let text = texts.get(i).cloned().unwrap_or_default();
                RawPage::new(number, text, self.try_render(backend, number, page_id))
            })
    }

    fn try_render<B: PdfBackend>(
        &self,
        backend: &B,
        number: u32,
        page_id: PageId,
    ) -> Option<RgbImage> {
        match self.render_page(backend, page_id) {
            Ok(image) => {
                log::debug!(
                    "Rendered page {} at {}x{}",
                    number,
                    image.width(),
                    image.height()
                );
                Some(image)
            }
            Err(e) => {
                log::warn!("Page {}: render failed: {}", number, e);
                None
            }
        }
    }

    /// Render a single page.
    pub fn render_page<B: PdfBackend>(&self, backend: &B, page_id: PageId) -> Result<RgbImage> {
        let [x0, y0, x1, y1] = backend.media_box(page_id);
        let width = ((x1 - x0) * self.scale).ceil() as u32;
        let height = ((y1 - y0) * self.scale).ceil() as u32;
        if width == 0
            || height == 0
            || width > MAX_RENDER_DIMENSION
            || height > MAX_RENDER_DIMENSION
        {
            return Err(Error::Image(format!(
                "page size {}x{} is out of range",
                width, height
            )));
        }

        let mut canvas = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
        // User space (origin bottom-left) to device space (origin top-left)
        let device = [
            self.scale,
            0.0,
            0.0,
            -self.scale,
            -x0 * self.scale,
            y1 * self.scale,
        ];

        let content = backend.page_content(page_id)?;
        let ops = backend.decode_content(&content)?;
        let mut painter = Painter {
            backend,
            canvas: &mut canvas,
            device,
        };
        painter.paint(ResourceScope::Page(page_id), &ops, IDENTITY, 0);

        Ok(canvas)
    }
}

struct Painter<'a, B: PdfBackend> {
    backend: &'a B,
    canvas: &'a mut RgbImage,
    device: Matrix,
}

impl<B: PdfBackend> Painter<'_, B> {
    fn paint(&mut self, scope: ResourceScope, ops: &[ContentOp], base: Matrix, depth: usize) {
        let mut ctm = base;
        let mut stack: Vec<Matrix> = Vec::new();

        for op in ops {
            match op.operator.as_str() {
                "q" => stack.push(ctm),
                "Q" => {
                    if let Some(saved) = stack.pop() {
                        ctm = saved;
                    }
                }
                "cm" => {
                    if let Some(m) = matrix_from_operands(&op.operands) {
                        ctm = multiply(&m, &ctm);
                    }
                }
                "Do" => {
                    let Some(PdfValue::Name(name)) = op.operands.first() else {
                        continue;
                    };
                    match self.backend.xobject_kind(scope, name) {
                        Some(XObjectKind::Image) => {
                            let drawn = self
                                .backend
                                .image_xobject(scope, name)
                                .and_then(|xobject| decode_image(&xobject));
                            match drawn {
                                Ok(image) => self.composite(&image, &ctm),
                                Err(e) => log::warn!(
                                    "Skipping image /{}: {}",
                                    String::from_utf8_lossy(name),
                                    e
                                ),
                            }
                        }
                        Some(XObjectKind::Form(id)) if depth < MAX_FORM_DEPTH => {
                            let nested = self.backend.form_xobject(id).and_then(|form| {
                                Ok((form.matrix, self.backend.decode_content(&form.content)?))
                            });
                            match nested {
                                Ok((matrix, nested_ops)) => self.paint(
                                    ResourceScope::Form(id),
                                    &nested_ops,
                                    multiply(&matrix, &ctm),
                                    depth + 1,
                                ),
                                Err(e) => log::debug!("Skipping form XObject {:?}: {}", id, e),
                            }
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }
    }

    /// Draw `image` into the unit square mapped by `ctm`.
    fn composite(&mut self, image: &RgbaImage, ctm: &Matrix) {
        let m = multiply(ctm, &self.device);
        let det = m[0] * m[3] - m[1] * m[2];
        if det.abs() < f32::EPSILON {
            return;
        }

        let corners = [
            apply(&m, 0.0, 0.0),
            apply(&m, 1.0, 0.0),
            apply(&m, 0.0, 1.0),
            apply(&m, 1.0, 1.0),
        ];
        let (cw, ch) = (self.canvas.width() as f32, self.canvas.height() as f32);
        let min_x = corners.iter().map(|c| c.0).fold(f32::MAX, f32::min).max(0.0);
        let max_x = corners.iter().map(|c| c.0).fold(f32::MIN, f32::max).min(cw);
        let min_y = corners.iter().map(|c| c.1).fold(f32::MAX, f32::min).max(0.0);
        let max_y = corners.iter().map(|c| c.1).fold(f32::MIN, f32::max).min(ch);
        if min_x >= max_x || min_y >= max_y {
            return;
        }

        let (iw, ih) = (image.width() as f32, image.height() as f32);
        for py in (min_y.floor() as u32)..(max_y.ceil() as u32).min(self.canvas.height()) {
            for px in (min_x.floor() as u32)..(max_x.ceil() as u32).min(self.canvas.width()) {
                let (dx, dy) = (px as f32 + 0.5 - m[4], py as f32 + 0.5 - m[5]);
                let u = (m[3] * dx - m[2] * dy) / det;
                let v = (-m[1] * dx + m[0] * dy) / det;
                if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
                    continue;
                }
                // Image row 0 is the top of the unit square
                let col = ((u * iw) as u32).min(image.width() - 1);
                let row = (((1.0 - v) * ih) as u32).min(image.height() - 1);
                let Rgba([r, g, b, a]) = *image.get_pixel(col, row);
                if a > 0 {
                    self.canvas.put_pixel(px, py, Rgb([r, g, b]));
                }
            }
        }
    }
}

/// Decode an image XObject into RGBA; stencil masks paint opaque black.
pub fn decode_image(xobject: &ImageXObject) -> Result<RgbaImage> {
    match &xobject.data {
        ImageData::Jpeg(bytes) => {
            let image = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)?;
            Ok(image.to_rgba8())
        }
        ImageData::Raw(bytes) => decode_raw_samples(xobject, bytes),
    }
}

fn decode_raw_samples(xobject: &ImageXObject, data: &[u8]) -> Result<RgbaImage> {
    let (width, height) = (xobject.width, xobject.height);
    let bpc = xobject.bits_per_component as usize;
    if !matches!(bpc, 1 | 2 | 4 | 8 | 16) {
        return Err(Error::Image(format!("unsupported bits per component {}", bpc)));
    }

    let components = xobject.color_space.components();
    let row_bytes = (width as usize * components * bpc).div_ceil(8);
    let needed = row_bytes * height as usize;
    if data.len() < needed {
        return Err(Error::Image(format!(
            "image data truncated: {} of {} bytes",
            data.len(),
            needed
        )));
    }

    let max = ((1u32 << bpc.min(8)) - 1) as f32;
    let sample = |row: &[u8], index: usize| -> u8 {
        match bpc {
            8 => row[index],
            16 => row[index * 2],
            _ => {
                let bit = index * bpc;
                let byte = row[bit / 8];
                let shift = 8 - bpc - (bit % 8);
                let value = (byte >> shift) & ((1u8 << bpc) - 1);
                (value as f32 * 255.0 / max).round() as u8
            }
        }
    };

    let mut image = RgbaImage::new(width, height);
    for (y, row) in data.chunks(row_bytes).take(height as usize).enumerate() {
        for x in 0..width as usize {
            let base = x * components;
            let pixel = if xobject.is_mask {
                // Stencil: 0 paints, 1 leaves the page untouched
                if sample(row, base) == 0 {
                    Rgba([0, 0, 0, 255])
                } else {
                    Rgba([0, 0, 0, 0])
                }
            } else {
                match xobject.color_space {
                    ImageColorSpace::Gray => {
                        let g = sample(row, base);
                        Rgba([g, g, g, 255])
                    }
                    ImageColorSpace::Rgb => Rgba([
                        sample(row, base),
                        sample(row, base + 1),
                        sample(row, base + 2),
                        255,
                    ]),
                    ImageColorSpace::Cmyk => {
                        let [c, m, y, k] = [
                            sample(row, base) as f32 / 255.0,
                            sample(row, base + 1) as f32 / 255.0,
                            sample(row, base + 2) as f32 / 255.0,
                            sample(row, base + 3) as f32 / 255.0,
                        ];
                        Rgba([
                            ((1.0 - c) * (1.0 - k) * 255.0) as u8,
                            ((1.0 - m) * (1.0 - k) * 255.0) as u8,
                            ((1.0 - y) * (1.0 - k) * 255.0) as u8,
                            255,
                        ])
                    }
                }
            };
            image.put_pixel(x as u32, y as u32, pixel);
        }
    }

    Ok(image)
}

/// Encode a page raster as PNG.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image.clone()).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::backend::FormXObject;

    fn raw(width: u32, height: u32, bpc: u8, cs: ImageColorSpace, data: Vec<u8>) -> ImageXObject {
        ImageXObject {
            width,
            height,
            bits_per_component: bpc,
            color_space: cs,
            is_mask: false,
            data: ImageData::Raw(data),
        }
    }

    #[test]
    fn test_multiply_identity() {
        let m = [2.0, 0.0, 0.0, 3.0, 10.0, 20.0];
        assert_eq!(multiply(&m, &IDENTITY), m);
        assert_eq!(multiply(&IDENTITY, &m), m);
    }

    #[test]
    fn test_multiply_order() {
        // Scale then translate
        let scale = [2.0, 0.0, 0.0, 2.0, 0.0, 0.0];
        let translate = [1.0, 0.0, 0.0, 1.0, 5.0, 5.0];
        let m = multiply(&scale, &translate);
        assert_eq!(apply(&m, 1.0, 1.0), (7.0, 7.0));
    }

    #[test]
    fn test_decode_gray_8bit() {
        let image = decode_image(&raw(2, 1, 8, ImageColorSpace::Gray, vec![0, 255])).unwrap();
        assert_eq!(*image.get_pixel(0, 0), Rgba([0, 0, 0, 255]));
        assert_eq!(*image.get_pixel(1, 0), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_decode_1bit_rows_are_byte_aligned() {
        // 3 pixels per row, two rows, each row padded to one byte
        let image =
            decode_image(&raw(3, 2, 1, ImageColorSpace::Gray, vec![0b1010_0000, 0b0100_0000]))
                .unwrap();
        assert_eq!(image.get_pixel(0, 0).0[0], 255);
        assert_eq!(image.get_pixel(1, 0).0[0], 0);
        assert_eq!(image.get_pixel(1, 1).0[0], 255);
    }

    #[test]
    fn test_decode_cmyk() {
        let image =
            decode_image(&raw(1, 1, 8, ImageColorSpace::Cmyk, vec![0, 0, 0, 255])).unwrap();
        assert_eq!(*image.get_pixel(0, 0), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_truncated_samples_rejected() {
        let result = decode_image(&raw(4, 4, 8, ImageColorSpace::Rgb, vec![0; 10]));
        assert!(matches!(result, Err(Error::Image(_))));
    }

    #[test]
    fn test_stencil_mask_is_transparent_where_set() {
        let mut xobject = raw(2, 1, 1, ImageColorSpace::Gray, vec![0b0100_0000]);
        xobject.is_mask = true;
        let image = decode_image(&xobject).unwrap();
        assert_eq!(image.get_pixel(0, 0).0[3], 255);
        assert_eq!(image.get_pixel(1, 0).0[3], 0);
    }

    #[test]
    fn test_scale_floor() {
        assert_eq!(PageRasterizer::new(1.0).scale(), DEFAULT_RENDER_SCALE);
        assert_eq!(PageRasterizer::new(3.0).scale(), 3.0);
    }

    #[test]
    fn test_encode_png_signature() {
        let image = RgbImage::from_pixel(2, 2, Rgb([10, 20, 30]));
        let png = encode_png(&image).unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    /// Blank pages; counts how many were rendered.
    struct BlankPages {
        count: u32,
        rendered: std::cell::Cell<usize>,
    }

    impl PdfBackend for BlankPages {
        fn pages(&self) -> std::collections::BTreeMap<u32, PageId> {
            (1..=self.count).map(|n| (n, (n, 0))).collect()
        }

        fn media_box(&self, _page: PageId) -> [f32; 4] {
            self.rendered.set(self.rendered.get() + 1);
            [0.0, 0.0, 20.0, 10.0]
        }

        fn page_content(&self, _page: PageId) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }

        fn decode_content(&self, _data: &[u8]) -> Result<Vec<ContentOp>> {
            Ok(Vec::new())
        }

        fn decode_text(&self, _page: PageId, _font: &[u8], _bytes: &[u8]) -> String {
            String::new()
        }

        fn xobject_kind(&self, _scope: ResourceScope, _name: &[u8]) -> Option<XObjectKind> {
            None
        }

        fn image_xobject(&self, _scope: ResourceScope, _name: &[u8]) -> Result<ImageXObject> {
            Err(Error::Other("no images".into()))
        }

        fn form_xobject(&self, _id: lopdf::ObjectId) -> Result<FormXObject> {
            Err(Error::Other("no forms".into()))
        }
    }

    #[test]
    fn test_raw_pages_render_on_demand() {
        let backend = BlankPages {
            count: 4,
            rendered: Default::default(),
        };
        let texts = vec!["one".to_string(), "two".to_string()];
        let rasterizer = PageRasterizer::default();

        let pages = rasterizer.raw_pages(&backend, &texts);
        assert_eq!(pages.len(), 4);
        assert_eq!(backend.rendered.get(), 0);

        let first_two: Vec<RawPage> = pages.take(2).collect();
        assert_eq!(backend.rendered.get(), 2);
        assert_eq!(first_two[1].index, 2);
        assert_eq!(first_two[1].text, "two");
        assert_eq!(first_two[0].raster.as_ref().map(|r| r.width()), Some(30));

        let all: Vec<RawPage> = rasterizer.raw_pages(&backend, &texts).collect();
        assert_eq!(all[3].text, "");
        assert!(all[3].raster.is_some());
    }
}
