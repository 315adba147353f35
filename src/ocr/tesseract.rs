//! Tesseract backend (requires libtesseract and leptonica).

use image::RgbImage;
use tesseract::Tesseract;

use super::backend::{OcrBackend, OcrConfig, Recognition, SegmentationParams};
use crate::error::{Error, Result};

/// [`OcrBackend`] backed by the `tesseract` crate.
///
/// The crate's API consumes the handle on every configuring call, so a
/// failed call loses it; the next recognition re-creates it from the stored
/// config.
#[derive(Default)]
pub struct TesseractBackend {
    api: Option<Tesseract>,
    config: Option<OcrConfig>,
    params: SegmentationParams,
}

impl TesseractBackend {
    /// Create an uninitialized backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn open(config: &OcrConfig) -> Result<Tesseract> {
        let datapath = config
            .tessdata
            .as_ref()
            .map(|p| p.to_string_lossy().to_string());
        Tesseract::new(datapath.as_deref(), Some(config.language.as_str()))
            .map_err(|e| Error::OcrInit(format!("{} ({})", e, config.language)))
    }

    fn take_api(&mut self) -> Result<Tesseract> {
        if let Some(api) = self.api.take() {
            return Ok(api);
        }
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| Error::OcrInit("Tesseract not initialized".to_string()))?;
        log::debug!("Re-creating Tesseract handle");
        Self::open(config)
    }
}

impl OcrBackend for TesseractBackend {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn initialize(&mut self, config: &OcrConfig) -> Result<()> {
        let api = Self::open(config)?;
        log::info!("Tesseract initialized for '{}'", config.language);
        self.api = Some(api);
        self.config = Some(config.clone());
        self.params = SegmentationParams::AUTO;
        Ok(())
    }

    fn set_segmentation(&mut self, params: SegmentationParams) -> Result<()> {
        if self.config.is_none() {
            return Err(Error::OcrInit("Tesseract not initialized".to_string()));
        }
        self.params = params;
        Ok(())
    }

    fn recognize(&mut self, image: &RgbImage) -> Result<Recognition> {
        let (width, height) = (image.width() as i32, image.height() as i32);
        let mut api = self.take_api()?;

        for (name, value) in self.params.variables() {
            api = api
                .set_variable(name, &value)
                .map_err(|e| Error::Other(format!("set {}: {}", name, e)))?;
        }

        let mut api = api
            .set_frame(image.as_raw(), width, height, 3, width * 3)
            .map_err(|e| Error::Other(format!("set image: {}", e)))?
            .recognize()
            .map_err(|e| Error::Other(format!("recognize: {}", e)))?;

        let text = api
            .get_text()
            .map_err(|e| Error::Other(format!("read text: {}", e)))?;
        let confidence = api.mean_text_conf() as f32;
        self.api = Some(api);

        Ok(Recognition { text, confidence })
    }

    fn terminate(&mut self) {
        self.api = None;
        self.config = None;
    }
}
