//! PDF header sniffing.
//!
//! Uploaded files arrive with whatever name the client chose, so the
//! container is checked by its magic bytes before lopdf is asked to parse
//! it. A rejected header surfaces as a document-level error before any page
//! is touched.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// PDF format information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfFormat {
    /// PDF version (e.g., "1.7", "2.0")
    pub version: String,
    /// Whether an `%%EOF` marker was found near the end of the data.
    /// Its absence usually means the upload was cut short.
    pub has_eof_marker: bool,
}

impl std::fmt::Display for PdfFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PDF {}", self.version)
    }
}

const PDF_MAGIC: &[u8] = b"%PDF-";
const VERSION_LEN: usize = 3; // "1.7"
const EOF_MARKER: &[u8] = b"%%EOF";
/// Writers may append whitespace or garbage after the final `%%EOF`.
const EOF_WINDOW: usize = 1024;

/// Detect the PDF format of a file on disk.
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<PdfFormat> {
    let mut file = File::open(path)?;
    let mut header = [0u8; 16];
    let read = read_up_to(&mut file, &mut header)?;

    let len = file.seek(SeekFrom::End(0))?;
    let window = len.min(EOF_WINDOW as u64);
    file.seek(SeekFrom::End(-(window as i64)))?;
    let mut tail = Vec::with_capacity(window as usize);
    file.read_to_end(&mut tail)?;

    let mut format = parse_header(&header[..read])?;
    format.has_eof_marker = contains(&tail, EOF_MARKER);
    Ok(format)
}

/// Detect the PDF format of an in-memory buffer.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<PdfFormat> {
    let mut format = parse_header(data)?;
    let tail_start = data.len().saturating_sub(EOF_WINDOW);
    format.has_eof_marker = contains(&data[tail_start..], EOF_MARKER);
    Ok(format)
}

/// Check if bytes start with a valid PDF header.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    parse_header(data).is_ok()
}

fn parse_header(data: &[u8]) -> Result<PdfFormat> {
    if data.len() < PDF_MAGIC.len() + VERSION_LEN || !data.starts_with(PDF_MAGIC) {
        return Err(Error::UnknownFormat);
    }

    let version_bytes = &data[PDF_MAGIC.len()..PDF_MAGIC.len() + VERSION_LEN];
    let version = String::from_utf8_lossy(version_bytes).to_string();
    if !is_valid_version(&version) {
        return Err(Error::UnsupportedVersion(version));
    }

    Ok(PdfFormat {
        version,
        has_eof_marker: false,
    })
}

fn is_valid_version(version: &str) -> bool {
    let bytes = version.as_bytes();
    bytes.len() == 3 && bytes[0].is_ascii_digit() && bytes[1] == b'.' && bytes[2].is_ascii_digit()
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}
