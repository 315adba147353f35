//! Stateful OCR engine.

use image::RgbImage;

use super::backend::{default_backend, OcrBackend, OcrConfig, SegmentationParams};
use super::progress::{percent, ProgressSink};
use crate::error::{Error, Result};
use crate::model::{is_sufficient, ExtractionResult, OcrAttempt, RawPage};
use crate::text::CleanupPipeline;

/// Lifecycle of an [`OcrEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Initializing,
    Ready,
    Recognizing,
    Terminated,
}

/// Sentinel text for a page that could not be recognized.
pub fn unrecognized_page_sentinel(page: u32) -> String {
    format!("[unable to recognize page {}]", page)
}

/// Note recorded when pages beyond the cap were skipped.
pub fn truncation_note(processed: usize, total: usize) -> String {
    format!(
        "[only the first {} of {} pages were recognized]",
        processed, total
    )
}

/// A recognition worker with a single owner.
///
/// The language model is loaded once by [`ensure_ready`](Self::ensure_ready)
/// and reused for every page. All operations take `&mut self`, so
/// recognitions never overlap.
pub struct OcrEngine {
    backend: Box<dyn OcrBackend>,
    config: OcrConfig,
    state: EngineState,
}

impl std::fmt::Debug for OcrEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrEngine")
            .field("backend", &self.backend.name())
            .field("config", &self.config)
            .field("state", &self.state)
            .finish()
    }
}

impl Default for OcrEngine {
    fn default() -> Self {
        Self::new(OcrConfig::default())
    }
}

impl OcrEngine {
    /// Create an engine with the backend compiled into this build.
    pub fn new(config: OcrConfig) -> Self {
        Self::with_backend(default_backend(), config)
    }

    /// Create an engine around a specific backend.
    pub fn with_backend(backend: Box<dyn OcrBackend>, config: OcrConfig) -> Self {
        Self {
            backend,
            config,
            state: EngineState::Uninitialized,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Whether recognition can run without initializing first.
    pub fn is_ready(&self) -> bool {
        self.state == EngineState::Ready
    }

    /// The active configuration.
    pub fn config(&self) -> &OcrConfig {
        &self.config
    }

    /// Initialize the backend unless it is already ready.
    ///
    /// A failure leaves the engine `Uninitialized`, so a later call retries.
    pub fn ensure_ready(&mut self) -> Result<()> {
        match self.state {
            EngineState::Ready => Ok(()),
            EngineState::Uninitialized | EngineState::Terminated => {
                self.state = EngineState::Initializing;
                log::info!(
                    "Initializing OCR backend '{}' ({})",
                    self.backend.name(),
                    self.config.language
                );
                match self.backend.initialize(&self.config) {
                    Ok(()) => {
                        self.state = EngineState::Ready;
                        Ok(())
                    }
                    Err(e) => {
                        self.state = EngineState::Uninitialized;
                        Err(match e {
                            Error::OcrInit(msg) => Error::OcrInit(msg),
                            other => Error::OcrInit(other.to_string()),
                        })
                    }
                }
            }
            EngineState::Initializing | EngineState::Recognizing => Err(Error::Other(format!(
                "OCR engine is busy ({:?})",
                self.state
            ))),
        }
    }

    /// Recognize one image with the current segmentation.
    pub fn recognize(&mut self, page: u32, image: &RgbImage) -> Result<OcrAttempt> {
        if self.state != EngineState::Ready {
            return Err(Error::OcrInit(format!(
                "OCR engine is not ready ({:?})",
                self.state
            )));
        }

        self.state = EngineState::Recognizing;
        let result = self.backend.recognize(image);
        self.state = EngineState::Ready;

        let recognition = result.map_err(|e| Error::OcrPage {
            page,
            message: e.to_string(),
        })?;
        Ok(OcrAttempt::new(page, recognition.text, recognition.confidence))
    }

    /// Recognize one page, retrying with single-column segmentation when
    /// the first attempt is short or unconfident.
    ///
    /// Returns the raw text of the better attempt. Default segmentation is
    /// restored after a retry, whether or not the retry succeeded.
    pub fn recognize_page(&mut self, page: u32, image: &RgbImage) -> Result<OcrAttempt> {
        let first = self.recognize(page, image)?;
        log::debug!(
            "Page {}: {} characters at {:.0}% confidence",
            page,
            first.len(),
            first.confidence
        );

        if !first.needs_retry(self.config.retry_min_length, self.config.retry_min_confidence) {
            return Ok(first);
        }

        log::info!("Page {}: weak recognition, retrying as a single column", page);
        let retry = self
            .backend
            .set_segmentation(SegmentationParams::SINGLE_COLUMN)
            .and_then(|_| self.recognize(page, image));

        if let Err(e) = self.backend.set_segmentation(SegmentationParams::AUTO) {
            log::warn!("Failed to restore OCR segmentation: {}", e);
        }

        match retry {
            Ok(retry) => Ok(OcrAttempt::select(first, retry)),
            Err(e) => {
                log::warn!("Page {}: retry failed: {}", page, e);
                Ok(first)
            }
        }
    }

    /// Recognize the first pages of a rendered document.
    ///
    /// `pages` yields one entry per page; a page without a raster failed to
    /// render. At most `config.max_pages` pages are pulled from the iterator
    /// and each is dropped once recognized. Every page slot is filled, so
    /// `text_by_page.len() == pages.len()`.
    pub fn recognize_pages<I, P>(
        &mut self,
        pages: I,
        progress: &mut P,
    ) -> Result<ExtractionResult>
    where
        I: IntoIterator<Item = RawPage>,
        I::IntoIter: ExactSizeIterator,
        P: ProgressSink + ?Sized,
    {
        self.ensure_ready()?;

        let pages = pages.into_iter();
        let total = pages.len();
        let to_process = total.min(self.config.max_pages);
        let page_cleanup = CleanupPipeline::ocr();

        log::info!("Recognizing {} of {} pages", to_process, total);
        progress.report(0);

        let mut text_by_page = Vec::with_capacity(total);
        let mut joined = String::new();

        for (i, raw) in pages.take(to_process).enumerate() {
            let page = raw.index;
            let text = match &raw.raster {
                None => {
                    log::warn!("Page {}: no page image to recognize", page);
                    None
                }
                Some(image) => match self.recognize_page(page, image) {
                    Ok(attempt) => Some(page_cleanup.process(&attempt.text)),
                    Err(e) => {
                        log::warn!("{}", e);
                        None
                    }
                },
            };

            match text {
                Some(text) => {
                    joined.push_str(&text);
                    joined.push_str("\n\n");
                    text_by_page.push(text);
                }
                None => text_by_page.push(unrecognized_page_sentinel(page)),
            }
            progress.report(percent(i + 1, to_process));
        }

        if to_process < total {
            let note = truncation_note(to_process, total);
            joined.push_str("\n\n");
            joined.push_str(&note);
            text_by_page.resize(total, note);
        }

        let full_text = CleanupPipeline::standard().process(&joined);
        let success = is_sufficient(&full_text);
        log::info!(
            "OCR finished: {} characters, success={}",
            full_text.chars().count(),
            success
        );

        Ok(ExtractionResult {
            full_text,
            text_by_page,
            success,
            has_images: true,
            needs_ocr: false,
            ocr_processed: true,
        })
    }

    /// Release the backend. A later `ensure_ready` starts over.
    pub fn terminate(&mut self) {
        if matches!(
            self.state,
            EngineState::Ready | EngineState::Recognizing | EngineState::Initializing
        ) {
            log::debug!("Terminating OCR backend '{}'", self.backend.name());
            self.backend.terminate();
        }
        self.state = EngineState::Terminated;
    }
}

impl Drop for OcrEngine {
    fn drop(&mut self) {
        if self.state != EngineState::Terminated {
            self.terminate();
        }
    }
}
