// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rasterize — render every page and package the images into a ZIP archive.

use std::io::{Cursor, Write};

use pagewerk_core::EngineConfig;
use pagewerk_core::error::{PagewerkError, Result};
use pagewerk_core::types::{ProgressEvent, RasterFormat, TransformationResult};
use tracing::{debug, info, instrument};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::image::ImageProcessor;
use crate::model::SourceDocument;
use crate::render::{PageRenderer, PageStream};

/// How pages are rendered and encoded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterOptions {
    pub format: RasterFormat,
    pub scale: f32,
    /// Only used for JPEG output.
    pub jpeg_quality: u8,
}

impl RasterOptions {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            format: config.raster_format,
            scale: config.raster_scale,
            jpeg_quality: config.jpeg_quality,
        }
    }
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// An encoded page image and its archive entry name.
#[derive(Debug, Clone)]
pub struct RasterEntry {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Stream of encoded pages. Each bitmap is dropped as soon as it is encoded.
pub fn raster_stream<'a>(
    document: &'a SourceDocument,
    renderer: &'a dyn PageRenderer,
    options: RasterOptions,
) -> Result<PageStream<'a, RasterEntry>> {
    document.ensure_paged()?;
    Ok(PageStream::new(document, move |index| {
        let bitmap = renderer.render_page(document, index, options.scale)?;
        let bytes = ImageProcessor::from_rgba(bitmap).encode(options.format, options.jpeg_quality)?;
        Ok(RasterEntry {
            name: format!("page_{}.{}", index.ordinal(), options.format.extension()),
            bytes,
        })
    }))
}

/// Render every page and return a ZIP archive with one image per page.
///
/// The archive is only returned once every page succeeded; a failure part way
/// through discards what was written so far.
#[instrument(skip(document, renderer, on_progress), fields(pages = document.page_count()))]
pub fn rasterize<'a>(
    document: &'a SourceDocument,
    renderer: &'a dyn PageRenderer,
    options: RasterOptions,
    on_progress: impl FnMut(ProgressEvent) + 'a,
) -> Result<TransformationResult> {
    let stream = raster_stream(document, renderer, options)?.on_progress(on_progress);

    let mut archive = ZipWriter::new(Cursor::new(Vec::new()));
    let entry_options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for item in stream {
        let entry = item?.value;
        archive
            .start_file(entry.name.as_str(), entry_options)
            .map_err(|err| PagewerkError::Archive(format!("cannot add {}: {err}", entry.name)))?;
        archive.write_all(&entry.bytes)?;
        debug!(entry = %entry.name, bytes = entry.bytes.len(), "Archive entry written");
    }

    let bytes = archive
        .finish()
        .map_err(|err| PagewerkError::Archive(format!("cannot finish archive: {err}")))?
        .into_inner();

    info!(archive_bytes = bytes.len(), "Pages rasterized");
    Ok(TransformationResult::archive(
        bytes,
        format!("{}_images.zip", document.stem()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{FakeRenderer, sample_pdf};
    use pagewerk_core::types::{PageIndex, Payload};
    use zip::ZipArchive;

    fn entry_names(bytes: &[u8]) -> Vec<String> {
        let archive = ZipArchive::new(Cursor::new(bytes.to_vec())).expect("open archive");
        archive.file_names().map(str::to_string).collect()
    }

    #[test]
    fn png_archive_has_one_entry_per_page() {
        let document = SourceDocument::from_pdf_bytes("report.pdf", sample_pdf(3)).expect("ingest");
        let mut events = Vec::new();
        let result = rasterize(&document, &FakeRenderer::new(), RasterOptions::default(), |e| {
            events.push(e.current)
        })
        .expect("rasterize");

        assert!(matches!(result.payload, Payload::Archive(_)));
        assert_eq!(result.suggested_name, "report_images.zip");
        let mut names = entry_names(result.as_bytes());
        names.sort();
        assert_eq!(names, vec!["page_1.png", "page_2.png", "page_3.png"]);
        assert_eq!(events, vec![1, 2, 3]);
    }

    #[test]
    fn jpeg_entries_use_jpg_extension() {
        let document = SourceDocument::from_pdf_bytes("a.pdf", sample_pdf(2)).expect("ingest");
        let options = RasterOptions {
            format: RasterFormat::Jpeg,
            scale: 1.0,
            jpeg_quality: 80,
        };
        let result = rasterize(&document, &FakeRenderer::new(), options, |_| {}).expect("rasterize");

        let mut archive = ZipArchive::new(Cursor::new(result.as_bytes().to_vec())).expect("open");
        let mut entry = archive.by_name("page_2.jpg").expect("entry");
        let mut head = [0u8; 2];
        std::io::Read::read_exact(&mut entry, &mut head).expect("read");
        assert_eq!(head, [0xFF, 0xD8]);
    }

    #[test]
    fn failure_mid_way_returns_no_archive() {
        let document = SourceDocument::from_pdf_bytes("a.pdf", sample_pdf(3)).expect("ingest");
        let renderer = FakeRenderer::failing_at(PageIndex(1));
        let err = rasterize(&document, &renderer, RasterOptions::default(), |_| {})
            .expect_err("render failure");
        assert!(matches!(err, PagewerkError::RenderFailure(_)));
    }
}
