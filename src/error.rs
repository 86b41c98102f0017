//! Error types for the pagetext library.

use std::io;
use thiserror::Error;

/// Result type alias for pagetext operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while ingesting a document.
///
/// Document-level variants propagate to the caller. Page-level variants
/// (`OcrUnavailable`, `OcrFailed`, `Raster`, `ImageDecode`) are normally
/// contained by the pipeline and only escape under the `abort_document`
/// policy.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// The container could not be opened or parsed (corrupt or truncated).
    #[error("Document is unreadable: {0}")]
    DocumentUnreadable(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// Invalid page range specification.
    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),

    /// The OCR engine or the rasterizer is missing or misconfigured.
    #[error("OCR unavailable: {0}")]
    OcrUnavailable(String),

    /// OCR of a specific page failed.
    #[error("OCR failed on page {page}: {message}")]
    OcrFailed {
        /// 1-based page number
        page: u32,
        /// Underlying failure
        message: String,
    },

    /// The OCR engine ran but reported an error.
    #[error("Recognition error: {0}")]
    Recognition(String),

    /// A page could not be rendered to an image.
    #[error("Rasterization error: {0}")]
    Raster(String),

    /// Raster bytes could not be decoded into an image.
    #[error("Image decoding error: {0}")]
    ImageDecode(String),

    /// Error extracting the text layer of a page.
    #[error("Text extraction error: {0}")]
    TextExtract(String),

    /// No page yielded any text.
    #[error("No text could be extracted from the document ({pages} pages processed)")]
    EmptyExtraction {
        /// Number of pages that were processed
        pages: usize,
    },

    /// Error while writing a PDF.
    #[error("Rendering error: {0}")]
    Render(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error is the caller's problem rather than an internal
    /// fault. Front ends map these to 400-class responses.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::EmptyExtraction { .. }
                | Error::UnknownFormat
                | Error::UnsupportedVersion(_)
                | Error::DocumentUnreadable(_)
                | Error::Encrypted
                | Error::InvalidPageRange(_)
        )
    }

    /// Whether this error means OCR cannot run at all in this environment.
    pub fn is_ocr_unavailable(&self) -> bool {
        matches!(self, Error::OcrUnavailable(_))
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::DocumentUnreadable(err.to_string()),
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::ImageDecode(err.to_string())
    }
}
