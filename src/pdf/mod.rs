//! PDF decoding: text layer and page rasters.

pub mod backend;
mod options;
mod raster;
mod text_layer;

pub use backend::{LopdfBackend, PdfBackend};
pub use options::{ExtractOptions, DEFAULT_LINE_TOLERANCE, DEFAULT_RENDER_SCALE};
pub use raster::{decode_image, encode_png, PageRasterizer};
pub use text_layer::{
    group_runs_into_lines, page_failure_sentinel, scan_page, GlyphRun, PageScan,
    TextLayerExtractor, SCANNED_DOCUMENT_MESSAGE, UNREADABLE_DOCUMENT_MESSAGE,
};
