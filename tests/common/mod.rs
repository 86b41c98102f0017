//! Shared fixtures for integration tests.
//!
//! Rendering and recognition are faked: the fake rasterizer encodes the
//! page number into the width of a blank PNG, and the fake OCR engine maps
//! that width back to a scripted answer. Enhancement keeps dimensions, so
//! the mapping survives the real enhancement step in between.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, Stream};

use pagetext::{Error, OcrEngine, OcrMode, PageSource, Rasterizer, Result};

pub const WIDTH_PER_PAGE: u32 = 10;

/// In-memory page source.
pub struct MemoryPages {
    pub pages: Vec<String>,
    pub path: PathBuf,
    /// Pages whose text layer fails to decode.
    pub unreadable: Vec<u32>,
}

impl MemoryPages {
    pub fn new(pages: &[&str]) -> Self {
        Self {
            pages: pages.iter().map(|p| p.to_string()).collect(),
            path: PathBuf::from("memory.pdf"),
            unreadable: Vec::new(),
        }
    }

    pub fn with_unreadable(mut self, pages: &[u32]) -> Self {
        self.unreadable = pages.to_vec();
        self
    }
}

impl PageSource for MemoryPages {
    fn page_numbers(&self) -> Vec<u32> {
        (1..=self.pages.len() as u32).collect()
    }

    fn page_text(&self, page: u32) -> Result<String> {
        if self.unreadable.contains(&page) {
            return Err(Error::TextExtract(format!("Page {}: broken font dictionary", page)));
        }
        self.pages
            .get(page as usize - 1)
            .cloned()
            .ok_or(Error::PageOutOfRange(page, self.pages.len() as u32))
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Encode a page number as a PNG whose width identifies it.
pub fn page_png(page: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(page * WIDTH_PER_PAGE, 12, Rgb([250, 250, 250]));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut buf, ImageFormat::Png)
        .expect("encode png");
    buf.into_inner()
}

/// Rasterizer returning [`page_png`], or garbage bytes for selected pages.
#[derive(Default)]
pub struct FakeRasterizer {
    pub corrupt_pages: Vec<u32>,
    pub unavailable: bool,
    pub calls: Arc<AtomicUsize>,
}

impl Rasterizer for FakeRasterizer {
    fn is_available(&self) -> bool {
        !self.unavailable
    }

    fn rasterize(&self, _document: &Path, page: u32, dpi: u32) -> Result<Vec<u8>> {
        assert_eq!(dpi, 300, "pages are rendered at the configured DPI");
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.corrupt_pages.contains(&page) {
            return Ok(b"not an image".to_vec());
        }
        Ok(page_png(page))
    }
}

/// What the scripted engine answers for a page.
#[derive(Clone)]
pub enum Answer {
    Text(&'static str),
    Fail(&'static str),
    Unavailable,
}

/// OCR engine answering from a script keyed by page number.
#[derive(Default)]
pub struct ScriptedOcr {
    pub answers: HashMap<u32, Answer>,
    pub available: Option<bool>,
    pub calls: Arc<Mutex<Vec<u32>>>,
}

impl ScriptedOcr {
    pub fn new(answers: &[(u32, Answer)]) -> Self {
        Self {
            answers: answers.iter().cloned().collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<u32>>> {
        Arc::clone(&self.calls)
    }
}

impl OcrEngine for ScriptedOcr {
    fn name(&self) -> &str {
        "scripted"
    }

    fn is_available(&self) -> bool {
        self.available.unwrap_or(true)
    }

    fn recognize(&self, image: &DynamicImage, language: &str, mode: OcrMode) -> Result<String> {
        assert_eq!(language, "por+eng");
        assert_eq!(mode, OcrMode::default());
        assert!(
            matches!(image, DynamicImage::ImageLuma8(_)),
            "OCR receives the enhanced grayscale image"
        );

        let page = image.width() / WIDTH_PER_PAGE;
        self.calls.lock().unwrap().push(page);
        match self.answers.get(&page) {
            Some(Answer::Text(text)) => Ok(text.to_string()),
            Some(Answer::Fail(message)) => Err(Error::Recognition(message.to_string())),
            Some(Answer::Unavailable) => Err(Error::OcrUnavailable("engine vanished".into())),
            None => Ok(String::new()),
        }
    }
}

/// Build a PDF whose pages carry the given text layers. `None` produces a
/// page without any text operators, like a scan or a blank page.
pub fn build_pdf(pages: &[Option<&str>]) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let operations = match text {
            Some(text) => vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
            None => vec![],
        };
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("serialize pdf");
    bytes
}
