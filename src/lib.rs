//! # pagetext
//!
//! Text extraction from uploaded PDF documents, with per-page OCR fallback.
//!
//! Each page is read from its text layer first. Pages without one (scans,
//! photographed contracts) are rendered, enhanced and passed through OCR.
//! The page texts are joined in page order into a single blob ready to be
//! handed to a summarizer.
//!
//! ## Quick Start
//!
//! ```no_run
//! fn main() -> pagetext::Result<()> {
//!     let text = pagetext::extract_text("contract.pdf")?;
//!     println!("{}", text);
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! ```no_run
//! use pagetext::{Document, ExtractOptions, OcrErrorPolicy, Pipeline};
//!
//! let options = ExtractOptions::new()
//!     .with_language_hint("por+eng")
//!     .with_raster_dpi(300)
//!     .with_ocr_error_policy(OcrErrorPolicy::AbortDocument);
//!
//! let document = Document::open("scan.pdf")?;
//! let extraction = Pipeline::new(options).extract(&document)?;
//! for page in &extraction.pages {
//!     println!("page {}: {:?} ({} chars)", page.number, page.method, page.chars);
//! }
//! # Ok::<(), pagetext::Error>(())
//! ```
//!
//! ## External tools
//!
//! The bundled OCR engine and rasterizer drive the `tesseract` and
//! `pdftoppm` binaries. When either is missing, pages without a text layer
//! contribute nothing and extraction carries on with the text layer alone.

pub mod detect;
pub mod document;
pub mod enhance;
pub mod error;
pub mod ocr;
pub mod options;
pub mod page;
pub mod pipeline;
pub mod raster;
pub mod summary_pdf;

pub use detect::{detect_format_from_bytes, detect_format_from_path, is_pdf_bytes, PdfFormat};
pub use document::{Document, PageSource};
pub use enhance::enhance;
pub use error::{Error, Result};
pub use ocr::{OcrEngine, TesseractCli};
pub use options::{
    EngineMode, EnhanceOptions, ExtractOptions, OcrErrorPolicy, OcrMode, PageSegMode,
    PageSelection,
};
pub use page::{classify, PageMethod, PageReport, PageStrategy};
pub use pipeline::{Extraction, PageOutcome, Pipeline};
pub use raster::{Pdftoppm, Rasterizer};
pub use summary_pdf::{render_summary_pdf, SummaryPdf};

use std::io::Read;
use std::path::Path;

/// Extract the text of a PDF file with default options.
///
/// # Example
///
/// ```no_run
/// let text = pagetext::extract_text("document.pdf").unwrap();
/// println!("{}", text);
/// ```
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<String> {
    extract_file(path, ExtractOptions::default()).map(Extraction::into_text)
}

/// Extract a PDF file with custom options.
pub fn extract_file<P: AsRef<Path>>(path: P, options: ExtractOptions) -> Result<Extraction> {
    let document = Document::open(path)?;
    Pipeline::new(options).extract(&document)
}

/// Extract a PDF held in memory.
///
/// The bytes are staged in a temporary file for the duration of the call
/// and removed afterwards, whether extraction succeeds or not.
pub fn extract_bytes(data: &[u8], options: ExtractOptions) -> Result<Extraction> {
    let document = Document::from_bytes(data)?;
    Pipeline::new(options).extract(&document)
}

/// Extract a PDF from a reader.
pub fn extract_reader<R: Read>(reader: R, options: ExtractOptions) -> Result<Extraction> {
    let document = Document::from_reader(reader)?;
    Pipeline::new(options).extract(&document)
}

/// Extract a PDF file on tokio's blocking pool.
///
/// Pages are still processed one at a time; this only keeps the calling
/// runtime responsive.
#[cfg(feature = "async")]
pub async fn extract_file_async<P: AsRef<Path>>(
    path: P,
    options: ExtractOptions,
) -> Result<Extraction> {
    let path = path.as_ref().to_path_buf();
    tokio::task::spawn_blocking(move || extract_file(path, options))
        .await
        .map_err(|e| Error::Other(format!("extraction task failed: {}", e)))?
}
