//! Extraction options and configuration.
//!
//! Everything the pipeline needs to know is carried in an [`ExtractOptions`]
//! value handed over at construction time; nothing is read from the
//! environment here.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default OCR language hint (Portuguese + English).
pub const DEFAULT_LANGUAGE_HINT: &str = "por+eng";

/// Default rasterization resolution.
pub const DEFAULT_RASTER_DPI: u32 = 300;

/// Options for extracting text from a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractOptions {
    /// Language hint passed to the OCR engine (e.g. "por+eng")
    pub ocr_language_hint: String,

    /// OCR recognition mode
    pub ocr_mode: OcrMode,

    /// Resolution used when a page has to be rasterized
    pub raster_dpi: u32,

    /// What to do when OCR of a page fails
    pub on_ocr_error: OcrErrorPolicy,

    /// Image enhancement applied before OCR
    pub enhance: EnhanceOptions,

    /// Which pages to process
    #[serde(skip)]
    pub pages: PageSelection,
}

impl ExtractOptions {
    /// Create new extract options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the OCR language hint.
    pub fn with_language_hint(mut self, hint: impl Into<String>) -> Self {
        self.ocr_language_hint = hint.into();
        self
    }

    /// Set the OCR mode.
    pub fn with_ocr_mode(mut self, mode: OcrMode) -> Self {
        self.ocr_mode = mode;
        self
    }

    /// Set the rasterization resolution. Zero is clamped to 1.
    pub fn with_raster_dpi(mut self, dpi: u32) -> Self {
        self.raster_dpi = dpi.max(1);
        self
    }

    /// Set the OCR error policy.
    pub fn with_ocr_error_policy(mut self, policy: OcrErrorPolicy) -> Self {
        self.on_ocr_error = policy;
        self
    }

    /// Abort the whole document on the first OCR failure.
    pub fn strict_ocr(mut self) -> Self {
        self.on_ocr_error = OcrErrorPolicy::AbortDocument;
        self
    }

    /// Set enhancement factors.
    pub fn with_enhance(mut self, enhance: EnhanceOptions) -> Self {
        self.enhance = enhance;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.pages = pages;
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            ocr_language_hint: DEFAULT_LANGUAGE_HINT.to_string(),
            ocr_mode: OcrMode::default(),
            raster_dpi: DEFAULT_RASTER_DPI,
            on_ocr_error: OcrErrorPolicy::default(),
            enhance: EnhanceOptions::default(),
            pages: PageSelection::All,
        }
    }
}

/// Behaviour when OCR of a single page fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrErrorPolicy {
    /// Log a warning and continue with the next page
    #[default]
    SkipPage,
    /// Fail the whole document
    AbortDocument,
}

impl OcrErrorPolicy {
    /// The configuration name of this policy.
    pub fn as_str(&self) -> &'static str {
        match self {
            OcrErrorPolicy::SkipPage => "skip_page",
            OcrErrorPolicy::AbortDocument => "abort_document",
        }
    }
}

impl fmt::Display for OcrErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OcrErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "skip_page" | "skip" => Ok(OcrErrorPolicy::SkipPage),
            "abort_document" | "abort" => Ok(OcrErrorPolicy::AbortDocument),
            other => Err(format!(
                "unknown OCR error policy '{}' (expected skip_page or abort_document)",
                other
            )),
        }
    }
}

/// OCR recognition mode: page segmentation plus engine variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrMode {
    /// Expected layout of the image
    pub segmentation: PageSegMode,
    /// Recognition engine variant
    pub engine: EngineMode,
}

impl Default for OcrMode {
    fn default() -> Self {
        Self {
            segmentation: PageSegMode::SingleBlock,
            engine: EngineMode::Default,
        }
    }
}

/// Page segmentation modes understood by tesseract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSegMode {
    /// Fully automatic page segmentation with orientation detection (1)
    AutoOsd,
    /// Fully automatic page segmentation, no orientation detection (3)
    Auto,
    /// A single column of text of variable sizes (4)
    SingleColumn,
    /// A single uniform block of text (6)
    #[default]
    SingleBlock,
    /// Sparse text in no particular order (11)
    SparseText,
}

impl PageSegMode {
    /// Numeric value passed as `--psm`.
    pub fn code(&self) -> u8 {
        match self {
            PageSegMode::AutoOsd => 1,
            PageSegMode::Auto => 3,
            PageSegMode::SingleColumn => 4,
            PageSegMode::SingleBlock => 6,
            PageSegMode::SparseText => 11,
        }
    }

    /// Look up a mode by its numeric value.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(PageSegMode::AutoOsd),
            3 => Some(PageSegMode::Auto),
            4 => Some(PageSegMode::SingleColumn),
            6 => Some(PageSegMode::SingleBlock),
            11 => Some(PageSegMode::SparseText),
            _ => None,
        }
    }
}

/// OCR engine variants understood by tesseract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineMode {
    /// Legacy engine only (0)
    Legacy,
    /// Neural net LSTM engine only (1)
    Lstm,
    /// Legacy + LSTM (2)
    LegacyLstm,
    /// Whatever is available, best first (3)
    #[default]
    Default,
}

impl EngineMode {
    /// Numeric value passed as `--oem`.
    pub fn code(&self) -> u8 {
        match self {
            EngineMode::Legacy => 0,
            EngineMode::Lstm => 1,
            EngineMode::LegacyLstm => 2,
            EngineMode::Default => 3,
        }
    }

    /// Look up an engine mode by its numeric value.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(EngineMode::Legacy),
            1 => Some(EngineMode::Lstm),
            2 => Some(EngineMode::LegacyLstm),
            3 => Some(EngineMode::Default),
            _ => None,
        }
    }
}

/// Enhancement factors. `1.0` leaves the property unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnhanceOptions {
    /// Contrast multiplier
    pub contrast: f32,
    /// Sharpness multiplier
    pub sharpness: f32,
}

impl Default for EnhanceOptions {
    fn default() -> Self {
        Self {
            contrast: 2.0,
            sharpness: 2.0,
        }
    }
}

/// Page selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// Every page
    #[default]
    All,
    /// A range of pages (inclusive, 1-indexed)
    Range(RangeInclusive<u32>),
    /// Several ranges (inclusive, 1-indexed), sorted and non-overlapping
    Ranges(Vec<RangeInclusive<u32>>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Ranges(ranges) => ranges.iter().any(|r| r.contains(&page)),
        }
    }

    /// Parse a page selection string (e.g., "1-10", "1,3,5,7-10").
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(PageSelection::All);
        }

        let invalid = || Error::InvalidPageRange(s.to_string());

        if !s.contains(',') {
            if let Some((start, end)) = s.split_once('-') {
                let start = parse_page_number(start).ok_or_else(invalid)?;
                let end = parse_page_number(end).ok_or_else(invalid)?;
                if start > end {
                    return Err(invalid());
                }
                return Ok(PageSelection::Range(start..=end));
            }
        }

        let mut ranges = Vec::new();
        for part in s.split(',') {
            let (start, end) = match part.split_once('-') {
                Some((a, b)) => (
                    parse_page_number(a).ok_or_else(invalid)?,
                    parse_page_number(b).ok_or_else(invalid)?,
                ),
                None => {
                    let p = parse_page_number(part).ok_or_else(invalid)?;
                    (p, p)
                }
            };
            if start > end {
                return Err(invalid());
            }
            ranges.push(start..=end);
        }

        Ok(PageSelection::Ranges(merge_ranges(ranges)))
    }
}

/// Sort ranges and merge the ones that overlap or touch.
fn merge_ranges(mut ranges: Vec<RangeInclusive<u32>>) -> Vec<RangeInclusive<u32>> {
    ranges.sort_unstable_by_key(|r| *r.start());
    let mut merged: Vec<RangeInclusive<u32>> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if *range.start() <= last.end().saturating_add(1) => {
                if range.end() > last.end() {
                    *last = *last.start()..=*range.end();
                }
            }
            _ => merged.push(range),
        }
    }
    merged
}

/// Pages are 1-based; zero is rejected.
fn parse_page_number(s: &str) -> Option<u32> {
    s.trim().parse::<u32>().ok().filter(|&p| p > 0)
}
