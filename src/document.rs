//! Opened PDF documents and the page-source abstraction the pipeline reads.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use lopdf::Document as LopdfDocument;
use tempfile::NamedTempFile;

use crate::detect::{detect_format_from_bytes, detect_format_from_path, PdfFormat};
use crate::error::{Error, Result};

/// Read access to the pages of a document.
///
/// The pipeline only needs the page order, the text layer of each page and
/// a file location the rasterizer can open. [`Document`] is the lopdf-backed
/// implementation.
pub trait PageSource {
    /// Page numbers in ascending order (1-based).
    fn page_numbers(&self) -> Vec<u32>;

    /// Structured text of a page. May be empty for scanned pages.
    fn page_text(&self, page: u32) -> Result<String>;

    /// Location of the container on disk.
    fn path(&self) -> &Path;
}

/// A PDF opened for a single extraction request.
///
/// Documents built from bytes or a reader are staged in an exclusive
/// temporary file that lives exactly as long as the `Document`.
pub struct Document {
    doc: LopdfDocument,
    path: PathBuf,
    format: PdfFormat,
    staged: Option<NamedTempFile>,
}

impl Document {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let format = sniff(detect_format_from_path(path))?;
        let doc = load(path, &format)?;
        Ok(Self {
            doc,
            path: path.to_path_buf(),
            format,
            staged: None,
        })
    }

    /// Open a PDF held in memory.
    ///
    /// The bytes are written to a temporary file first because page
    /// rasterization works on files.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let format = sniff(detect_format_from_bytes(data))?;

        let mut staged = tempfile::Builder::new()
            .prefix("pagetext-")
            .suffix(".pdf")
            .tempfile()?;
        staged.write_all(data)?;
        staged.flush()?;
        log::debug!(
            "Staged {} bytes at {}",
            data.len(),
            staged.path().display()
        );

        let path = staged.path().to_path_buf();
        let doc = load(&path, &format)?;
        Ok(Self {
            doc,
            path,
            format,
            staged: Some(staged),
        })
    }

    /// Open a PDF from a reader.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(&data)
    }

    /// Number of pages.
    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// Header information.
    pub fn format(&self) -> &PdfFormat {
        &self.format
    }

    /// Whether the document was opened from a staged temporary copy.
    pub fn is_staged(&self) -> bool {
        self.staged.is_some()
    }
}

impl PageSource for Document {
    fn page_numbers(&self) -> Vec<u32> {
        // BTreeMap keys are already ascending
        self.doc.get_pages().keys().copied().collect()
    }

    fn page_text(&self, page: u32) -> Result<String> {
        let count = self.page_count();
        if page == 0 || page > count {
            return Err(Error::PageOutOfRange(page, count));
        }
        self.doc
            .extract_text(&[page])
            .map_err(|e| Error::TextExtract(format!("Page {}: {}", page, e)))
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("path", &self.path)
            .field("format", &self.format)
            .field("pages", &self.page_count())
            .field("staged", &self.is_staged())
            .finish()
    }
}

fn load(path: &Path, format: &PdfFormat) -> Result<LopdfDocument> {
    if !format.has_eof_marker {
        log::warn!(
            "{} has no %%EOF marker; the upload may be truncated",
            path.display()
        );
    }

    let doc = LopdfDocument::load(path).map_err(|e| match e {
        lopdf::Error::Decryption(_) => Error::Encrypted,
        lopdf::Error::IO(io) if io.kind() == std::io::ErrorKind::NotFound => Error::Io(io),
        other => Error::DocumentUnreadable(other.to_string()),
    })?;

    if doc.get_pages().is_empty() {
        return Err(Error::DocumentUnreadable(
            "document has no page tree".to_string(),
        ));
    }

    log::debug!(
        "Opened {} ({}, {} pages)",
        path.display(),
        format,
        doc.get_pages().len()
    );
    Ok(doc)
}

/// A header that is not a PDF header means the upload is damaged or is not
/// a PDF at all; either way the document cannot be read.
fn sniff(detected: Result<PdfFormat>) -> Result<PdfFormat> {
    detected.map_err(|e| match e {
        Error::UnknownFormat => Error::DocumentUnreadable("missing %PDF- header".to_string()),
        Error::UnsupportedVersion(version) => {
            Error::DocumentUnreadable(format!("malformed PDF version '{}'", version))
        }
        other => other,
    })
}
