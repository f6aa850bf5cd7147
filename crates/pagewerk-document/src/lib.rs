// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagewerk-document — Page transformations for the Pagewerk engine.
//
// Provides the source document model, structural PDF operations (merge, split,
// reorder, delete, rotate), text stamping (watermarks, page numbers), image to
// document conversion, and streaming page work (thumbnails, rasterizing, text
// extraction) with progress reporting.

pub mod image;
pub mod model;
pub mod pdf;
pub mod render;

#[cfg(any(test, feature = "test-util"))]
pub mod fixtures;

// Re-export the primary items so callers can use `pagewerk_document::merge` etc.
pub use model::SourceDocument;
pub use pdf::{
    ImageBatchOutcome, delete_pages, images_to_document, merge, paginate, reorder, rotate, split,
    split_to_singles, watermark,
};
pub use render::{
    PageArtifact, PageRenderer, PageStream, RasterOptions, Thumbnail, extract_text, rasterize,
    thumbnails,
};

#[cfg(feature = "pdfium")]
pub use render::pdfium::PdfiumRenderer;
