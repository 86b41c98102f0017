//! Optical character recognition.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::{DynamicImage, ImageFormat};

use crate::error::{Error, Result};
use crate::options::OcrMode;

/// Something that turns an image into text.
///
/// Failures are per call: a failed page does not poison the engine for the
/// next one. `Error::OcrUnavailable` is reserved for "cannot run at all"
/// (missing binary, missing language data) so callers can stop trying.
pub trait OcrEngine: Send + Sync {
    /// Short name used in log records.
    fn name(&self) -> &str;

    /// Whether the engine can run in this environment.
    fn is_available(&self) -> bool {
        true
    }

    /// Recognize the text in `image`.
    fn recognize(&self, image: &DynamicImage, language: &str, mode: OcrMode) -> Result<String>;
}

/// OCR engine backed by the `tesseract` command-line tool.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    program: PathBuf,
}

impl TesseractCli {
    /// Use `tesseract` from `PATH`.
    pub fn new() -> Self {
        Self::with_program("tesseract")
    }

    /// Use a specific `tesseract` binary.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The binary this engine invokes.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments for one recognition call, after the input path.
    fn arguments(language: &str, mode: OcrMode) -> Vec<String> {
        vec![
            "stdout".to_string(),
            "-l".to_string(),
            language.to_string(),
            "--psm".to_string(),
            mode.segmentation.code().to_string(),
            "--oem".to_string(),
            mode.engine.code().to_string(),
        ]
    }
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrEngine for TesseractCli {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn is_available(&self) -> bool {
        let found = Command::new(&self.program)
            .arg("--version")
            .output()
            .is_ok();
        if !found {
            log::debug!(
                "{} not found - install tesseract-ocr for OCR support",
                self.program.display()
            );
        }
        found
    }

    fn recognize(&self, image: &DynamicImage, language: &str, mode: OcrMode) -> Result<String> {
        // The input file is removed when `input` drops, on every path.
        let input = tempfile::Builder::new()
            .prefix("pagetext-ocr-")
            .suffix(".png")
            .tempfile()?;
        image
            .save_with_format(input.path(), ImageFormat::Png)
            .map_err(|e| Error::Recognition(format!("cannot stage image: {}", e)))?;

        let output = Command::new(&self.program)
            .arg(input.path())
            .args(Self::arguments(language, mode))
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::OcrUnavailable(format!("{} not found", self.program.display()))
                } else {
                    Error::Recognition(format!(
                        "failed to run {}: {}",
                        self.program.display(),
                        e
                    ))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            if stderr.contains("Failed loading language") || stderr.contains("Error opening data file")
            {
                return Err(Error::OcrUnavailable(format!(
                    "language data for '{}' is not installed: {}",
                    language, stderr
                )));
            }
            return Err(Error::Recognition(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
