// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Test fixtures — small generated PDFs and images, inspection helpers, and a
// deterministic renderer. Available to other crates via the `test-util` feature.

use std::sync::atomic::{AtomicUsize, Ordering};

use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, StringFormat, Stream};
use pagewerk_core::error::{PagewerkError, Result};
use pagewerk_core::types::PageIndex;

use crate::model::SourceDocument;
use crate::pdf::codec::{LoadedPdf, number, page_rotation};
use crate::render::PageRenderer;

/// A PDF with `pages` pages labelled "Page 1" .. "Page n".
pub fn sample_pdf(pages: usize) -> Vec<u8> {
    let labels: Vec<String> = (1..=pages).map(|n| format!("Page {n}")).collect();
    let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
    build_pdf(&labels, None)
}

/// A PDF whose pages carry the given labels, in order.
pub fn labelled_pdf(labels: &[&str]) -> Vec<u8> {
    build_pdf(labels, None)
}

/// Like [`sample_pdf`], with `/Rotate` set on the page tree root so every
/// page inherits it.
pub fn sample_pdf_with_inherited_rotation(pages: usize, degrees: i64) -> Vec<u8> {
    let labels: Vec<String> = (1..=pages).map(|n| format!("Page {n}")).collect();
    let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
    build_pdf(&labels, Some(degrees))
}

/// Media box and resources live on the `/Pages` node, so copies must
/// materialise inherited attributes.
fn build_pdf(labels: &[&str], inherited_rotation: Option<i64>) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
        ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
    ]));
    let resources_id = doc.add_object(Dictionary::from_iter(vec![(
        "Font",
        Object::Dictionary(Dictionary::from_iter(vec![("F1", Object::Reference(font_id))])),
    )]));

    let mut page_ids = Vec::new();
    for label in labels {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(12)]),
                Operation::new("Td", vec![Object::Integer(100), Object::Integer(700)]),
                Operation::new(
                    "Tj",
                    vec![Object::String(label.as_bytes().to_vec(), StringFormat::Literal)],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let encoded = content.encode().expect("encode fixture content");
        let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));

        let page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
        ]);
        page_ids.push(doc.add_object(page));
    }

    let mut pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(page_ids.len() as i64)),
        (
            "Kids",
            Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        ),
        (
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ]),
        ),
        ("Resources", Object::Reference(resources_id)),
    ]);
    if let Some(degrees) = inherited_rotation {
        pages.set("Rotate", Object::Integer(degrees));
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("save fixture PDF");
    buffer
}

/// A `width` x `height` PNG with a horizontal gradient.
pub fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, _| {
        let shade = (x * 255 / width.max(1)) as u8;
        Rgb([shade, 128, 255 - shade])
    });
    let mut buffer = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut buffer), ImageFormat::Png)
        .expect("encode fixture PNG");
    buffer
}

/// PNG signature followed by garbage: sniffs as an image, fails to decode.
pub fn broken_png() -> Vec<u8> {
    let mut bytes = sample_png(4, 4);
    bytes.truncate(24);
    bytes
}

/// One shown string and the text-matrix origin it was drawn at.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: f32,
    pub y: f32,
    /// Baseline direction, the `a b` entries of the text matrix.
    pub heading: [f32; 2],
}

/// Every `Tj` string per page, with the position set by the last `Tm` or
/// `Td` before it.
pub fn page_text_runs(bytes: &[u8]) -> Vec<Vec<TextRun>> {
    let loaded = LoadedPdf::load(bytes).expect("load PDF under test");
    PageIndex::all(loaded.page_count())
        .map(|index| {
            let page_id = loaded.page_id(index).expect("page id");
            let content = loaded
                .document()
                .get_and_decode_page_content(page_id)
                .expect("decode page content");

            let (mut x, mut y) = (0.0, 0.0);
            let mut heading = [1.0, 0.0];
            let mut runs = Vec::new();
            for op in content.operations {
                match op.operator.as_str() {
                    "Tm" if op.operands.len() == 6 => {
                        x = number(&op.operands[4]).unwrap_or(0.0);
                        y = number(&op.operands[5]).unwrap_or(0.0);
                        heading = [
                            number(&op.operands[0]).unwrap_or(1.0),
                            number(&op.operands[1]).unwrap_or(0.0),
                        ];
                    }
                    "Td" if op.operands.len() == 2 => {
                        x = number(&op.operands[0]).unwrap_or(0.0);
                        y = number(&op.operands[1]).unwrap_or(0.0);
                    }
                    "Tj" => {
                        if let Some(Object::String(text, _)) = op.operands.first() {
                            runs.push(TextRun {
                                text: String::from_utf8_lossy(text).into_owned(),
                                x,
                                y,
                                heading,
                            });
                        }
                    }
                    _ => {}
                }
            }
            runs
        })
        .collect()
}

/// The first string drawn on each page.
pub fn page_labels(bytes: &[u8]) -> Vec<String> {
    page_text_runs(bytes)
        .into_iter()
        .map(|runs| runs.into_iter().next().map(|run| run.text).unwrap_or_default())
        .collect()
}

/// Effective `/Rotate` of each page.
pub fn page_rotations(bytes: &[u8]) -> Vec<i64> {
    let loaded = LoadedPdf::load(bytes).expect("load PDF under test");
    PageIndex::all(loaded.page_count())
        .map(|index| {
            let page_id = loaded.page_id(index).expect("page id");
            page_rotation(loaded.document(), page_id)
        })
        .collect()
}

/// Renders each page as a solid tile whose shade encodes the page index.
#[derive(Debug, Default)]
pub struct FakeRenderer {
    fail_at: Option<PageIndex>,
    renders: AtomicUsize,
}

impl FakeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A renderer that fails on `index`.
    pub fn failing_at(index: PageIndex) -> Self {
        Self {
            fail_at: Some(index),
            renders: AtomicUsize::new(0),
        }
    }

    /// Number of pages rendered so far.
    pub fn render_count(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}

impl PageRenderer for FakeRenderer {
    fn render_page(
        &self,
        document: &SourceDocument,
        index: PageIndex,
        scale: f32,
    ) -> Result<RgbaImage> {
        if Some(index) == self.fail_at || !document.contains(index) {
            return Err(PagewerkError::RenderFailure(format!(
                "cannot render page {}",
                index.ordinal()
            )));
        }
        self.renders.fetch_add(1, Ordering::SeqCst);

        let width = ((60.0 * scale).round() as u32).max(1);
        let height = ((80.0 * scale).round() as u32).max(1);
        let shade = (index.0 * 40 % 256) as u8;
        Ok(RgbaImage::from_pixel(width, height, Rgba([shade, shade, shade, 255])))
    }
}
