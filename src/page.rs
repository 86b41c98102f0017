//! Per-page strategy decision and provenance records.

use serde::{Deserialize, Serialize};

/// How a page's text should be obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageStrategy {
    /// The text layer has content; use it as is.
    DirectText(String),
    /// The text layer is empty or whitespace only.
    NeedsOcr,
}

/// Decide the strategy for a page from its text layer.
///
/// Direct text always wins when present: it is exact and costs nothing
/// compared to a 300 DPI raster plus recognition.
pub fn classify(text_layer: String) -> PageStrategy {
    if text_layer.trim().is_empty() {
        PageStrategy::NeedsOcr
    } else {
        PageStrategy::DirectText(text_layer)
    }
}

/// Where a page's contribution came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageMethod {
    /// Text layer
    Direct,
    /// Optical recognition of the rendered page
    Ocr,
    /// OCR ran but recovered nothing
    Empty,
    /// OCR was attempted and failed; the page was skipped
    OcrFailed,
    /// No text layer and no OCR engine to fall back on
    OcrUnavailable,
}

impl PageMethod {
    /// Whether the page contributed text to the result.
    pub fn has_text(&self) -> bool {
        matches!(self, PageMethod::Direct | PageMethod::Ocr)
    }
}

/// Provenance of a single page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageReport {
    /// Page number (1-indexed)
    pub number: u32,
    /// How the text was obtained
    pub method: PageMethod,
    /// Characters contributed (before the separating newline)
    pub chars: usize,
    /// Warning recorded for the page, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl PageReport {
    pub(crate) fn new(number: u32, method: PageMethod, chars: usize) -> Self {
        Self {
            number,
            method,
            chars,
            warning: None,
        }
    }

    pub(crate) fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }
}
