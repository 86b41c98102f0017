//! Page rasterization.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};

/// Renders a single page of a PDF on disk to encoded image bytes.
pub trait Rasterizer: Send + Sync {
    /// Whether the renderer can run in this environment.
    fn is_available(&self) -> bool {
        true
    }

    /// Render `page` (1-based) of `document` at `dpi`. Returns encoded
    /// image bytes (PNG for the bundled implementation).
    fn rasterize(&self, document: &Path, page: u32, dpi: u32) -> Result<Vec<u8>>;
}

/// Rasterizer backed by poppler's `pdftoppm`.
#[derive(Debug, Clone)]
pub struct Pdftoppm {
    program: PathBuf,
}

impl Pdftoppm {
    /// Use `pdftoppm` from `PATH`.
    pub fn new() -> Self {
        Self::with_program("pdftoppm")
    }

    /// Use a specific `pdftoppm` binary.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The binary this rasterizer invokes.
    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Default for Pdftoppm {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer for Pdftoppm {
    fn is_available(&self) -> bool {
        let found = Command::new(&self.program).arg("-v").output().is_ok();
        if !found {
            log::debug!(
                "{} not found - install poppler-utils for OCR support",
                self.program.display()
            );
        }
        found
    }

    fn rasterize(&self, document: &Path, page: u32, dpi: u32) -> Result<Vec<u8>> {
        let page = page.to_string();
        // Without an output root, -singlefile writes the image to stdout.
        let output = Command::new(&self.program)
            .arg("-png")
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-f")
            .arg(&page)
            .arg("-l")
            .arg(&page)
            .arg("-singlefile")
            .arg(document)
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::OcrUnavailable(format!("{} not found", self.program.display()))
                } else {
                    Error::Raster(format!("failed to run {}: {}", self.program.display(), e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Raster(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }
        if output.stdout.is_empty() {
            return Err(Error::Raster(format!("page {} produced no image", page)));
        }

        Ok(output.stdout)
    }
}
