// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text stamping — watermarks and page numbers drawn over existing pages.
//
// Stamps use the standard Helvetica font with WinAnsi encoding, so no font
// program is embedded. The original page content is wrapped in `q ... Q` so
// its graphics state cannot leak into the stamp.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use pagewerk_core::error::{PagewerkError, Result};
use pagewerk_core::types::{
    HorizontalAlignment, PageIndex, PaginationStyle, Rgb, TransformationResult, VerticalPosition,
    WatermarkStyle,
};
use tracing::{debug, info, instrument};

use crate::model::SourceDocument;
use crate::pdf::codec::{LoadedPdf, PageAssembler, media_box, page_rotation, resolve};

/// Resource names used for the stamp's font and graphics state. Chosen so
/// they do not collide with names typical producers emit.
const FONT_RESOURCE: &str = "PwFnt";
const GSTATE_RESOURCE: &str = "PwGs";

/// Helvetica cap height, in thousandths of the font size.
const CAP_HEIGHT: f32 = 718.0;

/// Glyph widths for WinAnsi codes 32..=126, from the Helvetica AFM.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

/// Width used for WinAnsi codes outside the ASCII table.
const DEFAULT_WIDTH: u16 = 556;

/// Draw `text` once on every page, centred on the page as displayed.
#[instrument(skip(document, style), fields(pages = document.page_count()))]
pub fn watermark(
    document: &SourceDocument,
    text: &str,
    style: &WatermarkStyle,
) -> Result<TransformationResult> {
    document.ensure_paged()?;
    if text.trim().is_empty() {
        return Err(PagewerkError::InvalidInput(
            "watermark text must not be blank".to_string(),
        ));
    }
    style.validate()?;

    let encoded = encode_win_ansi(text.trim());
    let width = text_width(&encoded, style.font_size);
    let height = CAP_HEIGHT / 1000.0 * style.font_size;
    let (sin, cos) = style.rotation_degrees.to_radians().sin_cos();

    let ink = Ink {
        font_size: style.font_size,
        color: style.color,
        opacity: Some(style.opacity),
    };
    let bytes = stamp_pages(document, &ink, |_, [llx, lly, urx, ury]| {
        let (cx, cy) = ((llx + urx) / 2.0, (lly + ury) / 2.0);
        // Rotate the text's own centre onto the page centre.
        let x = cx - (cos * width / 2.0 - sin * height / 2.0);
        let y = cy - (sin * width / 2.0 + cos * height / 2.0);
        Placement {
            text: encoded.clone(),
            matrix: [cos, sin, -sin, cos, x, y],
        }
    })?;

    info!(width, "Watermark applied");
    Ok(TransformationResult::pdf(
        bytes,
        format!("{}_watermarked.pdf", document.stem()),
    ))
}

/// Draw `"{n} / {total}"` on every page, `margin` points in from the edges
/// of the page as displayed.
#[instrument(skip(document, style), fields(pages = document.page_count()))]
pub fn paginate(
    document: &SourceDocument,
    style: &PaginationStyle,
    margin: f32,
) -> Result<TransformationResult> {
    document.ensure_paged()?;
    style.validate()?;
    if !(margin >= 0.0) {
        return Err(PagewerkError::InvalidInput(format!(
            "page number margin must not be negative, got {margin}"
        )));
    }

    let total = document.page_count();
    let cap_height = CAP_HEIGHT / 1000.0 * style.font_size;
    let ink = Ink {
        font_size: style.font_size,
        color: style.color,
        opacity: None,
    };
    let bytes = stamp_pages(document, &ink, |index, [llx, lly, urx, ury]| {
        let text = encode_win_ansi(&format!("{} / {total}", index.ordinal()));
        let width = text_width(&text, style.font_size);
        let x = match style.horizontal {
            HorizontalAlignment::Left => llx + margin,
            HorizontalAlignment::Center => llx + (urx - llx - width) / 2.0,
            HorizontalAlignment::Right => urx - margin - width,
        };
        let y = match style.vertical {
            VerticalPosition::Bottom => lly + margin,
            VerticalPosition::Top => ury - margin - cap_height,
        };
        Placement {
            text,
            matrix: [1.0, 0.0, 0.0, 1.0, x, y],
        }
    })?;

    info!(total, "Page numbers applied");
    Ok(TransformationResult::pdf(
        bytes,
        format!("{}_numbered.pdf", document.stem()),
    ))
}

/// Encode `text` as WinAnsi bytes, replacing unmappable characters with `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' | '\u{a0}'..='\u{ff}' => c as u8,
            '€' => 0x80,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            _ => b'?',
        })
        .collect()
}

/// Advance width of WinAnsi-encoded Helvetica text, in points.
pub fn text_width(encoded: &[u8], font_size: f32) -> f32 {
    let units: u32 = encoded
        .iter()
        .map(|&code| match code {
            32..=126 => u32::from(HELVETICA_WIDTHS[usize::from(code - 32)]),
            _ => u32::from(DEFAULT_WIDTH),
        })
        .sum();
    units as f32 * font_size / 1000.0
}

struct Ink {
    font_size: f32,
    color: Rgb,
    opacity: Option<f32>,
}

struct Placement {
    text: Vec<u8>,
    /// Text matrix `[a b c d e f]` in displayed-page coordinates.
    matrix: [f32; 6],
}

/// Maps displayed-page coordinates (origin at the lower-left corner the
/// viewer shows) back to user space, undoing the page's clockwise `/Rotate`.
fn display_frame(media_box: [f32; 4], rotation: i64) -> ([f32; 4], [f32; 6]) {
    let [llx, lly, urx, ury] = media_box;
    let (width, height) = (urx - llx, ury - lly);
    match rotation {
        90 => ([0.0, 0.0, height, width], [0.0, 1.0, -1.0, 0.0, urx, lly]),
        180 => ([0.0, 0.0, width, height], [-1.0, 0.0, 0.0, -1.0, urx, ury]),
        270 => ([0.0, 0.0, height, width], [0.0, -1.0, 1.0, 0.0, llx, ury]),
        _ => ([0.0, 0.0, width, height], [1.0, 0.0, 0.0, 1.0, llx, lly]),
    }
}

/// `first` followed by `then`, in PDF row-vector order.
fn concat(first: [f32; 6], then: [f32; 6]) -> [f32; 6] {
    let [a1, b1, c1, d1, e1, f1] = first;
    let [a2, b2, c2, d2, e2, f2] = then;
    [
        a1 * a2 + b1 * c2,
        a1 * b2 + b1 * d2,
        c1 * a2 + d1 * c2,
        c1 * b2 + d1 * d2,
        e1 * a2 + f1 * c2 + e2,
        e1 * b2 + f1 * d2 + f2,
    ]
}

/// Copy every page and overlay the text chosen by `place` for it.
fn stamp_pages<F>(document: &SourceDocument, ink: &Ink, mut place: F) -> Result<Vec<u8>>
where
    F: FnMut(PageIndex, [f32; 4]) -> Placement,
{
    let loaded = LoadedPdf::load(document.bytes())?;
    let all: Vec<PageIndex> = PageIndex::all(loaded.page_count()).collect();
    let mut assembler = PageAssembler::new();
    assembler.append(&loaded, &all)?;

    let page_ids = assembler.page_ids().to_vec();
    let target = assembler.document_mut();

    let font_id = target.add_object(helvetica());
    let gstate_id = ink.opacity.map(|opacity| {
        target.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"ExtGState".to_vec())),
            ("ca", Object::Real(opacity as _)),
            ("CA", Object::Real(opacity as _)),
        ]))
    });
    let save_id = target.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));

    for (position, &page_id) in page_ids.iter().enumerate() {
        let index = PageIndex(position);
        let (displayed, to_user) =
            display_frame(media_box(target, page_id), page_rotation(target, page_id));
        let mut placement = place(index, displayed);
        placement.matrix = concat(placement.matrix, to_user);

        let resources = stamp_resources(target, page_id, font_id, gstate_id);
        let mut contents = vec![Object::Reference(save_id)];
        contents.extend(existing_contents(target, page_id));
        let overlay = overlay_content(ink, &placement, gstate_id.is_some())?;
        contents.push(Object::Reference(
            target.add_object(Stream::new(Dictionary::new(), overlay)),
        ));

        let page = target
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|err| PagewerkError::Codec(format!("cannot update page {index}: {err}")))?;
        page.set("Resources", Object::Dictionary(resources));
        page.set("Contents", Object::Array(contents));
        debug!(page = %index.ordinal(), "Page stamped");
    }

    assembler.finish()
}

fn helvetica() -> Dictionary {
    Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
        ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
    ])
}

/// The page's resources as a direct dictionary with the stamp's font (and
/// graphics state) added. Resource dictionaries shared between pages are
/// copied rather than edited in place.
fn stamp_resources(
    document: &Document,
    page_id: ObjectId,
    font_id: ObjectId,
    gstate_id: Option<ObjectId>,
) -> Dictionary {
    let mut resources = direct_dictionary(
        document,
        document
            .get_dictionary(page_id)
            .ok()
            .and_then(|page| page.get(b"Resources").ok()),
    );

    let mut fonts = direct_dictionary(document, resources.get(b"Font").ok());
    fonts.set(FONT_RESOURCE, Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));

    if let Some(gstate_id) = gstate_id {
        let mut states = direct_dictionary(document, resources.get(b"ExtGState").ok());
        states.set(GSTATE_RESOURCE, Object::Reference(gstate_id));
        resources.set("ExtGState", Object::Dictionary(states));
    }
    resources
}

fn direct_dictionary(document: &Document, object: Option<&Object>) -> Dictionary {
    object
        .and_then(|obj| resolve(document, obj))
        .and_then(|obj| obj.as_dict().ok())
        .cloned()
        .unwrap_or_default()
}

fn existing_contents(document: &Document, page_id: ObjectId) -> Vec<Object> {
    let contents = document
        .get_dictionary(page_id)
        .ok()
        .and_then(|page| page.get(b"Contents").ok());
    match contents {
        Some(Object::Array(items)) => items.clone(),
        Some(reference @ Object::Reference(_)) => vec![reference.clone()],
        _ => Vec::new(),
    }
}

/// Closes the `q` opened before the original content, then draws the stamp
/// in its own saved state.
fn overlay_content(ink: &Ink, placement: &Placement, with_gstate: bool) -> Result<Vec<u8>> {
    let real = |value: f32| Object::Real(value as _);

    let mut operations = vec![Operation::new("Q", vec![]), Operation::new("q", vec![])];
    if with_gstate {
        operations.push(Operation::new(
            "gs",
            vec![Object::Name(GSTATE_RESOURCE.as_bytes().to_vec())],
        ));
    }
    operations.extend([
        Operation::new(
            "rg",
            vec![real(ink.color.r), real(ink.color.g), real(ink.color.b)],
        ),
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![
                Object::Name(FONT_RESOURCE.as_bytes().to_vec()),
                real(ink.font_size),
            ],
        ),
        Operation::new("Tm", placement.matrix.iter().copied().map(real).collect()),
        Operation::new(
            "Tj",
            vec![Object::String(placement.text.clone(), StringFormat::Literal)],
        ),
        Operation::new("ET", vec![]),
        Operation::new("Q", vec![]),
    ]);

    Content { operations }
        .encode()
        .map_err(|err| PagewerkError::Codec(format!("failed to encode stamp: {err}")))
}
