// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — build a new document from raster images using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use pagewerk_core::error::{PagewerkError, Result};
use pagewerk_core::types::{
    DocumentKind, ImageLayout, PaperSize, TransformationResult, pt_to_mm,
};
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument, warn};

use crate::model::SourceDocument;

/// At 72 DPI one image pixel maps to one point.
const NATIVE_DPI: f32 = 72.0;

/// Result of converting a batch of images: the document plus the images that
/// had to be skipped.
#[derive(Debug)]
pub struct ImageBatchOutcome {
    pub result: TransformationResult,
    /// One `PartialItemFailure` per skipped image, in input order.
    pub failures: Vec<PagewerkError>,
}

/// One page per image, in the order given.
///
/// Images that cannot be decoded are skipped and reported in
/// [`ImageBatchOutcome::failures`]; the batch fails only if no image at all
/// could be placed.
#[instrument(skip(images), fields(images = images.len()))]
pub fn images_to_document(
    images: &[SourceDocument],
    layout: ImageLayout,
    paper: PaperSize,
) -> Result<ImageBatchOutcome> {
    if images.is_empty() {
        return Err(PagewerkError::InvalidInput(
            "no images to convert".to_string(),
        ));
    }

    let mut doc = PdfDocument::new("Pagewerk Images");
    let mut pages: Vec<PdfPage> = Vec::with_capacity(images.len());
    let mut failures = Vec::new();

    for (index, source) in images.iter().enumerate() {
        let raw = match decode(source) {
            Ok(raw) => raw,
            Err(reason) => {
                warn!(index, name = source.name(), %reason, "Skipping image");
                failures.push(PagewerkError::PartialItemFailure { index, reason });
                continue;
            }
        };

        let (img_w, img_h) = (raw.width as f32, raw.height as f32);
        let xobject_id = doc.add_image(&raw);
        let (page_w, page_h, scale) = match layout {
            ImageLayout::FitToImage => (img_w, img_h, 1.0),
            ImageLayout::StandardPortrait | ImageLayout::StandardLandscape => {
                let landscape = layout == ImageLayout::StandardLandscape;
                let (page_w, page_h) = paper.dimensions_pt(landscape);
                // Largest uniform scale that fits the paper.
                let scale = (page_w / img_w).min(page_h / img_h);
                (page_w, page_h, scale)
            }
        };

        // Centre the image on the page.
        let x_offset = (page_w - img_w * scale) / 2.0;
        let y_offset = (page_h - img_h * scale) / 2.0;

        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(x_offset)),
                translate_y: Some(Pt(y_offset)),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(NATIVE_DPI),
                rotate: None,
            },
        }];
        pages.push(PdfPage::new(Mm(pt_to_mm(page_w)), Mm(pt_to_mm(page_h)), ops));
        debug!(index, page_w, page_h, scale, "Image placed on page");
    }

    if pages.is_empty() {
        return Err(PagewerkError::InvalidInput(format!(
            "none of the {} images could be read",
            images.len()
        )));
    }

    let placed = pages.len();
    doc.with_pages(pages);

    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    let output = doc.save(&PdfSaveOptions::default(), &mut warnings);

    info!(placed, skipped = failures.len(), "Images converted to document");
    Ok(ImageBatchOutcome {
        result: TransformationResult::pdf(output, "images.pdf"),
        failures,
    })
}

/// Decode an image source into RGB8 pixels for printpdf.
fn decode(source: &SourceDocument) -> std::result::Result<RawImage, String> {
    if source.kind() != DocumentKind::SingleImage {
        return Err(format!("{} is not an image", source.name()));
    }
    let dynamic_image = ::image::load_from_memory(source.bytes())
        .map_err(|err| format!("failed to decode image: {err}"))?;

    let width = dynamic_image.width() as usize;
    let height = dynamic_image.height() as usize;
    Ok(RawImage {
        pixels: RawImageData::U8(dynamic_image.to_rgb8().into_raw()),
        width,
        height,
        data_format: RawImageFormat::RGB8,
        tag: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{broken_png, sample_pdf, sample_png};
    use crate::pdf::codec::{LoadedPdf, media_box, number};
    use pagewerk_core::types::PageIndex;

    fn image(name: &str, bytes: Vec<u8>) -> SourceDocument {
        SourceDocument::from_image_bytes(name, bytes).expect("ingest image")
    }

    fn page_sizes(bytes: &[u8]) -> Vec<(f32, f32)> {
        let loaded = LoadedPdf::load(bytes).expect("load");
        PageIndex::all(loaded.page_count())
            .map(|index| {
                let [llx, lly, urx, ury] =
                    media_box(loaded.document(), loaded.page_id(index).expect("page"));
                (urx - llx, ury - lly)
            })
            .collect()
    }

    /// Combined `cm` transform on the first page: `[a b c d e f]` mapping the
    /// image's unit square onto the page.
    fn image_placement(bytes: &[u8]) -> [f32; 6] {
        let loaded = LoadedPdf::load(bytes).expect("load");
        let page_id = loaded.page_id(PageIndex(0)).expect("page");
        let content = loaded
            .document()
            .get_and_decode_page_content(page_id)
            .expect("decode content");

        let mut ctm = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        for op in content.operations.iter().filter(|op| op.operator == "cm") {
            let m: Vec<f32> = op.operands.iter().filter_map(number).collect();
            let &[a, b, c, d, e, f] = m.as_slice() else {
                panic!("cm takes six operands, got {:?}", op.operands);
            };
            let [a2, b2, c2, d2, e2, f2] = ctm;
            ctm = [
                a * a2 + b * c2,
                a * b2 + b * d2,
                c * a2 + d * c2,
                c * b2 + d * d2,
                e * a2 + f * c2 + e2,
                e * b2 + f * d2 + f2,
            ];
        }
        ctm
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1.0
    }

    fn assert_placement(image: (f32, f32), page: (f32, f32), ctm: [f32; 6]) {
        let scale = (page.0 / image.0).min(page.1 / image.1);
        let (w, h) = (image.0 * scale, image.1 * scale);
        assert!(close(ctm[0], w) && close(ctm[3], h), "scale in {ctm:?}");
        assert!(close(ctm[1], 0.0) && close(ctm[2], 0.0), "skew in {ctm:?}");
        assert!(close(ctm[4], (page.0 - w) / 2.0), "x offset in {ctm:?}");
        assert!(close(ctm[5], (page.1 - h) / 2.0), "y offset in {ctm:?}");
    }

    #[test]
    fn fit_to_image_uses_pixel_size() {
        let images = [image("a.png", sample_png(200, 100)), image("b.png", sample_png(50, 80))];
        let outcome =
            images_to_document(&images, ImageLayout::FitToImage, PaperSize::A4).expect("convert");

        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.result.suggested_name, "images.pdf");
        let sizes = page_sizes(outcome.result.as_bytes());
        assert_eq!(sizes.len(), 2);
        assert!(close(sizes[0].0, 200.0) && close(sizes[0].1, 100.0));
        assert!(close(sizes[1].0, 50.0) && close(sizes[1].1, 80.0));
    }

    #[test]
    fn standard_layouts_use_paper_orientation() {
        let images = [image("a.png", sample_png(30, 30))];
        let portrait = images_to_document(&images, ImageLayout::StandardPortrait, PaperSize::A4)
            .expect("portrait");
        let landscape = images_to_document(&images, ImageLayout::StandardLandscape, PaperSize::A4)
            .expect("landscape");

        let (w, h) = page_sizes(portrait.result.as_bytes())[0];
        assert!(close(w, 595.3) && close(h, 841.9));
        let (w, h) = page_sizes(landscape.result.as_bytes())[0];
        assert!(close(w, 841.9) && close(h, 595.3));
    }

    #[test]
    fn square_image_fills_portrait_width_and_centres_vertically() {
        let images = [image("a.png", sample_png(30, 30))];
        let outcome = images_to_document(&images, ImageLayout::StandardPortrait, PaperSize::A4)
            .expect("portrait");
        let ctm = image_placement(outcome.result.as_bytes());

        assert_placement((30.0, 30.0), (595.28, 841.89), ctm);
        assert!(close(ctm[0], 595.28) && close(ctm[5], 123.3));
    }

    #[test]
    fn square_image_fills_landscape_height_and_centres_horizontally() {
        let images = [image("a.png", sample_png(30, 30))];
        let outcome = images_to_document(&images, ImageLayout::StandardLandscape, PaperSize::A4)
            .expect("landscape");
        let ctm = image_placement(outcome.result.as_bytes());

        assert_placement((30.0, 30.0), (841.89, 595.28), ctm);
        assert!(close(ctm[4], 123.3) && close(ctm[5], 0.0));
    }

    #[test]
    fn tall_image_is_limited_by_page_height() {
        let images = [image("tall.png", sample_png(20, 80))];
        let outcome = images_to_document(&images, ImageLayout::StandardPortrait, PaperSize::A4)
            .expect("portrait");
        let ctm = image_placement(outcome.result.as_bytes());

        assert_placement((20.0, 80.0), (595.28, 841.89), ctm);
        assert!(close(ctm[3], 841.89) && close(ctm[4], 192.4));
    }

    #[test]
    fn undecodable_image_is_skipped_and_reported() {
        let images = [
            image("ok.png", sample_png(10, 10)),
            image("bad.png", broken_png()),
            image("ok2.png", sample_png(10, 20)),
        ];
        let outcome =
            images_to_document(&images, ImageLayout::FitToImage, PaperSize::A4).expect("convert");

        assert_eq!(page_sizes(outcome.result.as_bytes()).len(), 2);
        assert_eq!(outcome.failures.len(), 1);
        assert!(matches!(
            outcome.failures[0],
            PagewerkError::PartialItemFailure { index: 1, .. }
        ));
    }

    #[test]
    fn all_images_failing_is_an_error() {
        let images = [image("bad.png", broken_png())];
        let err = images_to_document(&images, ImageLayout::FitToImage, PaperSize::A4)
            .expect_err("nothing placed");
        assert!(matches!(err, PagewerkError::InvalidInput(_)));

        let err = images_to_document(&[], ImageLayout::FitToImage, PaperSize::A4)
            .expect_err("empty batch");
        assert!(matches!(err, PagewerkError::InvalidInput(_)));
    }

    #[test]
    fn paged_documents_are_not_images() {
        let pdf = SourceDocument::from_pdf_bytes("a.pdf", sample_pdf(1)).expect("pdf");
        let images = [pdf, image("ok.png", sample_png(10, 10))];
        let outcome =
            images_to_document(&images, ImageLayout::FitToImage, PaperSize::A4).expect("convert");
        assert_eq!(outcome.failures.len(), 1);
    }
}
