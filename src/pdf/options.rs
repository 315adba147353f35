//! Text-layer and rasterization options.

use crate::text::CleanupOptions;

/// Vertical distance (in PDF units) under which two runs share a line.
pub const DEFAULT_LINE_TOLERANCE: f32 = 5.0;

/// Default raster scale relative to PDF units (72 dpi × 1.5 = 108 dpi).
pub const DEFAULT_RENDER_SCALE: f32 = 1.5;

/// Largest rendered page side, in pixels.
pub const MAX_RENDER_DIMENSION: u32 = 8000;

/// Options for extracting a PDF.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Line grouping tolerance in PDF units
    pub line_tolerance: f32,

    /// Whether to reconstruct page lines in parallel
    pub parallel: bool,

    /// Raster scale factor; values below the default are raised to it
    pub render_scale: f32,

    /// Cleanup applied to the joined text
    pub cleanup: CleanupOptions,
}

impl ExtractOptions {
    /// Create new extract options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the line grouping tolerance.
    pub fn with_line_tolerance(mut self, tolerance: f32) -> Self {
        self.line_tolerance = tolerance.max(0.0);
        self
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Set the raster scale factor.
    pub fn with_render_scale(mut self, scale: f32) -> Self {
        self.render_scale = scale;
        self
    }

    /// Set cleanup options.
    pub fn with_cleanup(mut self, cleanup: CleanupOptions) -> Self {
        self.cleanup = cleanup;
        self
    }

    /// The scale actually used for rendering.
    pub fn effective_render_scale(&self) -> f32 {
        if self.render_scale.is_finite() {
            self.render_scale.max(DEFAULT_RENDER_SCALE)
        } else {
            DEFAULT_RENDER_SCALE
        }
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            line_tolerance: DEFAULT_LINE_TOLERANCE,
            parallel: true,
            render_scale: DEFAULT_RENDER_SCALE,
            cleanup: CleanupOptions::standard(),
        }
    }
}
