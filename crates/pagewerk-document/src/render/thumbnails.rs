// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Thumbnails — small renders of every page, for page grids.

use image::RgbaImage;
use pagewerk_core::error::Result;
use pagewerk_core::types::{PageIndex, ProgressEvent};
use tracing::{info, instrument};

use crate::model::SourceDocument;
use crate::render::{PageRenderer, PageStream};

/// A rendered preview of one page, keyed by its original index.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub index: PageIndex,
    pub image: RgbaImage,
}

/// Stream of thumbnails, one per page, in page order.
pub fn thumbnail_stream<'a>(
    document: &'a SourceDocument,
    renderer: &'a dyn PageRenderer,
    scale: f32,
) -> Result<PageStream<'a, Thumbnail>> {
    document.ensure_paged()?;
    Ok(PageStream::new(document, move |index| {
        let image = renderer.render_page(document, index, scale)?;
        Ok(Thumbnail { index, image })
    }))
}

/// Render every page at `scale`. Any page failing aborts the whole sequence.
#[instrument(skip(document, renderer, on_progress), fields(pages = document.page_count()))]
pub fn thumbnails<'a>(
    document: &'a SourceDocument,
    renderer: &'a dyn PageRenderer,
    scale: f32,
    on_progress: impl FnMut(ProgressEvent) + 'a,
) -> Result<Vec<Thumbnail>> {
    let thumbs = thumbnail_stream(document, renderer, scale)?
        .on_progress(on_progress)
        .map(|item| item.map(|artifact| artifact.value))
        .collect::<Result<Vec<_>>>()?;

    info!(count = thumbs.len(), "Thumbnails rendered");
    Ok(thumbs)
}
