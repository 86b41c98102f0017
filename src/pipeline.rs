//! Page extraction pipeline.
//!
//! For every page, in order: read the text layer; if it is blank, render the
//! page, enhance the raster and run OCR on it. Non-empty page texts are
//! joined with one trailing newline each and the result is trimmed.
//!
//! Page-level faults are contained here according to
//! [`OcrErrorPolicy`]. Document-level faults (an unreadable container, or no
//! text at all) reach the caller.

use image::DynamicImage;
use serde::Serialize;

use crate::document::PageSource;
use crate::enhance::enhance;
use crate::error::{Error, Result};
use crate::ocr::{OcrEngine, TesseractCli};
use crate::options::{ExtractOptions, OcrErrorPolicy};
use crate::page::{classify, PageMethod, PageReport, PageStrategy};
use crate::raster::{Pdftoppm, Rasterizer};

/// Text extracted from a document, with per-page provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extraction {
    /// Concatenated page texts, trimmed
    pub text: String,
    /// One report per processed page, in page order
    pub pages: Vec<PageReport>,
}

impl Extraction {
    /// The extracted text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Consume the extraction and keep the text.
    pub fn into_text(self) -> String {
        self.text
    }

    /// Number of pages whose text came from the text layer.
    pub fn direct_pages(&self) -> usize {
        self.count(PageMethod::Direct)
    }

    /// Number of pages whose text came from OCR.
    pub fn ocr_pages(&self) -> usize {
        self.count(PageMethod::Ocr)
    }

    /// Number of processed pages that contributed no text.
    pub fn skipped_pages(&self) -> usize {
        self.pages.iter().filter(|p| !p.method.has_text()).count()
    }

    /// Reports that carry a warning.
    pub fn warnings(&self) -> impl Iterator<Item = &PageReport> {
        self.pages.iter().filter(|p| p.warning.is_some())
    }

    fn count(&self, method: PageMethod) -> usize {
        self.pages.iter().filter(|p| p.method == method).count()
    }
}

/// Result of processing one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOutcome {
    /// Text contributed by the page, if any
    pub text: Option<String>,
    /// Provenance
    pub report: PageReport,
}

/// Drives extraction over the pages of a document.
pub struct Pipeline {
    options: ExtractOptions,
    ocr: Option<Box<dyn OcrEngine>>,
    rasterizer: Box<dyn Rasterizer>,
}

impl Pipeline {
    /// Pipeline using `tesseract` and `pdftoppm` from `PATH`.
    pub fn new(options: ExtractOptions) -> Self {
        Self {
            options,
            ocr: Some(Box::new(TesseractCli::new())),
            rasterizer: Box::new(Pdftoppm::new()),
        }
    }

    /// Replace the OCR engine.
    pub fn with_ocr_engine(mut self, engine: impl OcrEngine + 'static) -> Self {
        self.ocr = Some(Box::new(engine));
        self
    }

    /// Run with direct extraction only.
    pub fn without_ocr(mut self) -> Self {
        self.ocr = None;
        self
    }

    /// Replace the rasterizer.
    pub fn with_rasterizer(mut self, rasterizer: impl Rasterizer + 'static) -> Self {
        self.rasterizer = Box::new(rasterizer);
        self
    }

    /// The options this pipeline was built with.
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract the text of every selected page and assemble it.
    ///
    /// Returns [`Error::EmptyExtraction`] when no page produced text, and
    /// [`Error::OcrFailed`] when a page fails under
    /// [`OcrErrorPolicy::AbortDocument`].
    pub fn extract(&self, source: &dyn PageSource) -> Result<Extraction> {
        let numbers = self.selected_pages(source)?;
        let mut run = Run::new(self);
        let mut text = String::new();
        let mut pages = Vec::with_capacity(numbers.len());

        for number in numbers {
            let outcome = run.page(source, number)?;
            if let Some(page_text) = outcome.text {
                text.push_str(&page_text);
                text.push('\n');
            }
            pages.push(outcome.report);
        }

        let extraction = Extraction {
            text: text.trim().to_string(),
            pages,
        };
        log::info!(
            "Extracted {} characters from {} pages ({} direct, {} OCR, {} without text)",
            extraction.text.chars().count(),
            extraction.pages.len(),
            extraction.direct_pages(),
            extraction.ocr_pages(),
            extraction.skipped_pages(),
        );

        if extraction.text.is_empty() {
            return Err(Error::EmptyExtraction {
                pages: extraction.pages.len(),
            });
        }
        Ok(extraction)
    }

    /// Process a single page on its own.
    pub fn extract_page(&self, source: &dyn PageSource, page: u32) -> Result<PageOutcome> {
        Run::new(self).page(source, page)
    }

    fn selected_pages(&self, source: &dyn PageSource) -> Result<Vec<u32>> {
        let all = source.page_numbers();
        let selected: Vec<u32> = all
            .iter()
            .copied()
            .filter(|&n| self.options.pages.includes(n))
            .collect();

        if selected.is_empty() && !all.is_empty() {
            return Err(Error::InvalidPageRange(format!(
                "{:?} selects none of the {} pages",
                self.options.pages,
                all.len()
            )));
        }
        Ok(selected)
    }

    /// Render, decode, enhance and recognize one page. Every intermediate
    /// buffer is dropped before this returns.
    fn recognize_page(
        &self,
        engine: &dyn OcrEngine,
        source: &dyn PageSource,
        page: u32,
    ) -> Result<String> {
        let raster = self
            .rasterizer
            .rasterize(source.path(), page, self.options.raster_dpi)?;
        let image: DynamicImage = image::load_from_memory(&raster)?;
        drop(raster);

        log::debug!(
            "Page {}: rasterized at {} DPI ({}x{})",
            page,
            self.options.raster_dpi,
            image.width(),
            image.height()
        );

        let image = enhance(image, &self.options.enhance);
        engine.recognize(
            &image,
            &self.options.ocr_language_hint,
            self.options.ocr_mode,
        )
    }
}

/// OCR readiness, checked lazily on the first page that needs it.
enum OcrStatus {
    Unchecked,
    Ready,
    Unavailable(String),
}

/// State of one pipeline invocation.
struct Run<'a> {
    pipeline: &'a Pipeline,
    ocr: OcrStatus,
}

impl<'a> Run<'a> {
    fn new(pipeline: &'a Pipeline) -> Self {
        Self {
            pipeline,
            ocr: OcrStatus::Unchecked,
        }
    }

    fn page(&mut self, source: &dyn PageSource, number: u32) -> Result<PageOutcome> {
        let text_layer = source.page_text(number).unwrap_or_else(|e| {
            log::warn!("Page {}: text layer unreadable, trying OCR: {}", number, e);
            String::new()
        });

        match classify(text_layer) {
            PageStrategy::DirectText(text) => {
                let chars = text.chars().count();
                log::info!("Page {}: direct text ({} chars)", number, chars);
                Ok(PageOutcome {
                    text: Some(text),
                    report: PageReport::new(number, PageMethod::Direct, chars),
                })
            }
            PageStrategy::NeedsOcr => self.ocr_page(source, number),
        }
    }

    fn ocr_page(&mut self, source: &dyn PageSource, number: u32) -> Result<PageOutcome> {
        let engine = match self.engine() {
            Ok(engine) => engine,
            Err(reason) => {
                log::warn!("Page {}: no text layer and OCR skipped ({})", number, reason);
                return Ok(Self::without_text(number, PageMethod::OcrUnavailable, reason));
            }
        };

        log::info!("Page {}: no text layer, running {}", number, engine.name());
        match self.pipeline.recognize_page(engine, source, number) {
            Ok(text) if !text.trim().is_empty() => {
                let chars = text.chars().count();
                log::info!("Page {}: OCR recovered {} chars", number, chars);
                Ok(PageOutcome {
                    text: Some(text),
                    report: PageReport::new(number, PageMethod::Ocr, chars),
                })
            }
            Ok(_) => {
                log::warn!("Page {}: OCR returned no text", number);
                Ok(Self::without_text(
                    number,
                    PageMethod::Empty,
                    "no text recovered",
                ))
            }
            Err(e) if e.is_ocr_unavailable() => {
                let reason = e.to_string();
                log::warn!("Page {}: {}; OCR disabled for this document", number, reason);
                self.ocr = OcrStatus::Unavailable(reason.clone());
                Ok(Self::without_text(number, PageMethod::OcrUnavailable, reason))
            }
            Err(e) => match self.pipeline.options.on_ocr_error {
                OcrErrorPolicy::SkipPage => {
                    log::warn!("Page {}: OCR failed, skipping page: {}", number, e);
                    Ok(Self::without_text(
                        number,
                        PageMethod::OcrFailed,
                        e.to_string(),
                    ))
                }
                OcrErrorPolicy::AbortDocument => {
                    log::error!("Page {}: OCR failed, aborting document: {}", number, e);
                    Err(Error::OcrFailed {
                        page: number,
                        message: e.to_string(),
                    })
                }
            },
        }
    }

    /// The engine if OCR can run; otherwise why not.
    fn engine(&mut self) -> std::result::Result<&'a dyn OcrEngine, String> {
        let pipeline: &'a Pipeline = self.pipeline;
        let engine = match pipeline.ocr.as_deref() {
            Some(engine) => engine,
            None => return Err("OCR disabled".to_string()),
        };

        if let OcrStatus::Unchecked = self.ocr {
            self.ocr = if !engine.is_available() {
                OcrStatus::Unavailable(format!("{} is not available", engine.name()))
            } else if !pipeline.rasterizer.is_available() {
                OcrStatus::Unavailable("page rasterizer is not available".to_string())
            } else {
                OcrStatus::Ready
            };
            if let OcrStatus::Unavailable(reason) = &self.ocr {
                log::warn!("OCR unavailable: {}", reason);
            }
        }

        match &self.ocr {
            OcrStatus::Ready => Ok(engine),
            OcrStatus::Unavailable(reason) => Err(reason.clone()),
            OcrStatus::Unchecked => unreachable!("OCR status resolved above"),
        }
    }

    fn without_text(number: u32, method: PageMethod, warning: impl Into<String>) -> PageOutcome {
        PageOutcome {
            text: None,
            report: PageReport::new(number, method, 0).with_warning(warning),
        }
    }
}
