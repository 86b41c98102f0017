//! Render a summary back into a simple A4 PDF.
//!
//! This is a best-effort side output: callers run it after extraction and
//! summarization have succeeded, and a failure here must not change what
//! they report.

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document as LopdfDocument, Object, ObjectId, Stream};

use crate::error::{Error, Result};

/// Default document title.
pub const DEFAULT_TITLE: &str = "Resumo Documento";

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: f32 = 56.0;
const TITLE_SIZE: i64 = 18;
const BODY_SIZE: i64 = 11;
const LEADING: f32 = 15.0;
/// Roughly what fits between the margins at 11pt Helvetica.
const WRAP_COLUMNS: usize = 92;
/// Title colour (#006855).
const TITLE_RGB: [f32; 3] = [0.0, 0.408, 0.333];

/// Layout settings for the summary PDF.
#[derive(Debug, Clone)]
pub struct SummaryPdf {
    title: String,
}

impl SummaryPdf {
    /// Create a renderer with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    /// Build the PDF in memory.
    pub fn build(&self, summary: &str) -> Result<LopdfDocument> {
        let lines = wrap_lines(summary, WRAP_COLUMNS);
        let body_lines_per_page = ((PAGE_HEIGHT as f32 - 2.0 * MARGIN) / LEADING) as usize;
        // The title takes the space of three body lines on the first page.
        let first_page_lines = body_lines_per_page.saturating_sub(3).max(1);

        let mut chunks: Vec<&[String]> = Vec::new();
        let (first, mut rest) = lines.split_at(first_page_lines.min(lines.len()));
        chunks.push(first);
        while !rest.is_empty() {
            let (chunk, tail) = rest.split_at(body_lines_per_page.min(rest.len()));
            chunks.push(chunk);
            rest = tail;
        }

        let mut doc = LopdfDocument::with_version("1.5");
        let pages_id = doc.new_object_id();
        let body_font = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let title_font = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => body_font,
                "F2" => title_font,
            },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(chunks.len());
        for (index, chunk) in chunks.iter().enumerate() {
            let title = if index == 0 { Some(self.title.as_str()) } else { None };
            let content = page_content(title, chunk);
            let encoded = content
                .encode()
                .map_err(|e| Error::Render(format!("content stream: {}", e)))?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let page_count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = self.info_dictionary(&mut doc);
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);
        doc.compress();

        Ok(doc)
    }

    /// Build the PDF and write it to `path`.
    pub fn write<P: AsRef<Path>>(&self, summary: &str, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut doc = self.build(summary)?;
        doc.save(path)?;
        log::info!("Summary PDF written to {}", path.display());
        Ok(())
    }

    fn info_dictionary(&self, doc: &mut LopdfDocument) -> ObjectId {
        let created = chrono::Utc::now().format("D:%Y%m%d%H%M%SZ").to_string();
        doc.add_object(dictionary! {
            "Title" => Object::string_literal(to_win_ansi(&self.title)),
            "Producer" => Object::string_literal(concat!("pagetext ", env!("CARGO_PKG_VERSION"))),
            "CreationDate" => Object::string_literal(created),
        })
    }
}

impl Default for SummaryPdf {
    fn default() -> Self {
        Self::new(DEFAULT_TITLE)
    }
}

/// Write `summary` as a PDF titled `title` to `path`.
pub fn render_summary_pdf<P: AsRef<Path>>(summary: &str, title: &str, path: P) -> Result<()> {
    SummaryPdf::new(title).write(summary, path)
}

fn page_content(title: Option<&str>, lines: &[String]) -> Content {
    let mut operations = Vec::new();
    let mut top = PAGE_HEIGHT as f32 - MARGIN;

    if let Some(title) = title {
        let [r, g, b] = TITLE_RGB;
        operations.push(Operation::new("rg", vec![r.into(), g.into(), b.into()]));
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec!["F2".into(), TITLE_SIZE.into()]));
        operations.push(Operation::new("Td", vec![MARGIN.into(), top.into()]));
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(to_win_ansi(title))],
        ));
        operations.push(Operation::new("ET", vec![]));
        operations.push(Operation::new("rg", vec![0.into(), 0.into(), 0.into()]));
        top -= 3.0 * LEADING;
    }

    operations.push(Operation::new("BT", vec![]));
    operations.push(Operation::new("Tf", vec!["F1".into(), BODY_SIZE.into()]));
    operations.push(Operation::new("TL", vec![LEADING.into()]));
    operations.push(Operation::new("Td", vec![MARGIN.into(), top.into()]));
    for line in lines {
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(to_win_ansi(line))],
        ));
        operations.push(Operation::new("T*", vec![]));
    }
    operations.push(Operation::new("ET", vec![]));

    Content { operations }
}

/// Greedy word wrap. Paragraph breaks are kept as blank lines and words
/// longer than a line are split.
pub fn wrap_lines(text: &str, columns: usize) -> Vec<String> {
    let columns = columns.max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > columns {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let rest = word.split_off(columns);
                lines.push(word.into_iter().collect());
                word = rest;
            }

            let current_len = current.chars().count();
            if current_len > 0 && current_len + 1 + word.len() > columns {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.extend(word);
        }
        lines.push(current);
    }

    lines
}

/// Encode text for the standard fonts' WinAnsi encoding. Latin-1 covers
/// Portuguese; anything else becomes '?'.
fn to_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\t' => b' ',
            c if (c as u32) < 0x20 => b' ',
            c if (c as u32) <= 0xFF => c as u32 as u8,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{20AC}' => 0x80,
            _ => b'?',
        })
        .collect()
}
