// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Streaming render operations — page-by-page work with progress reporting.
//
// Every streaming operation is a `PageStream`: an iterator that does one page
// of work per `next()`, reports progress after each completed page, and stops
// for good after the first error. Dropping the stream cancels the operation.

pub mod rasterize;
pub mod text;
pub mod thumbnails;

#[cfg(feature = "pdfium")]
pub mod pdfium;

use std::iter::FusedIterator;

use image::RgbaImage;
use pagewerk_core::error::Result;
use pagewerk_core::types::{PageIndex, ProgressEvent};
use tracing::{debug, warn};

use crate::model::SourceDocument;

pub use rasterize::{RasterOptions, rasterize};
pub use text::extract_text;
pub use thumbnails::{Thumbnail, thumbnails};

/// Turns one page of a document into pixels.
///
/// Implementations keep no per-document state between calls; the caller owns
/// the returned bitmap and releases it before the next page is rendered.
pub trait PageRenderer {
    fn render_page(
        &self,
        document: &SourceDocument,
        index: PageIndex,
        scale: f32,
    ) -> Result<RgbaImage>;
}

/// One completed unit of work from a [`PageStream`].
#[derive(Debug, Clone)]
pub struct PageArtifact<T> {
    pub index: PageIndex,
    pub progress: ProgressEvent,
    pub value: T,
}

type Step<'a, T> = Box<dyn FnMut(PageIndex) -> Result<T> + 'a>;
type ProgressFn<'a> = Box<dyn FnMut(ProgressEvent) + 'a>;

/// Lazy, finite, non-restartable page sequence.
pub struct PageStream<'a, T> {
    next: usize,
    total: usize,
    step: Step<'a, T>,
    on_progress: Option<ProgressFn<'a>>,
    finished: bool,
}

impl<'a, T> PageStream<'a, T> {
    /// A stream over every page of `document`, running `step` on each.
    pub fn new(
        document: &SourceDocument,
        step: impl FnMut(PageIndex) -> Result<T> + 'a,
    ) -> Self {
        Self {
            next: 0,
            total: document.page_count(),
            step: Box::new(step),
            on_progress: None,
            finished: false,
        }
    }

    /// Call `callback` once per completed page, in page order.
    pub fn on_progress(mut self, callback: impl FnMut(ProgressEvent) + 'a) -> Self {
        self.on_progress = Some(Box::new(callback));
        self
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

impl<T> Iterator for PageStream<'_, T> {
    type Item = Result<PageArtifact<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished || self.next >= self.total {
            self.finished = true;
            return None;
        }

        let index = PageIndex(self.next);
        self.next += 1;

        match (self.step)(index) {
            Ok(value) => {
                let progress = ProgressEvent {
                    current: index.0 + 1,
                    total: self.total,
                };
                if let Some(callback) = self.on_progress.as_mut() {
                    callback(progress);
                }
                debug!(current = progress.current, total = progress.total, "Page processed");
                Some(Ok(PageArtifact {
                    index,
                    progress,
                    value,
                }))
            }
            Err(err) => {
                warn!(page = %index.ordinal(), %err, "Page stream aborted");
                self.finished = true;
                Some(Err(err))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished {
            (0, Some(0))
        } else {
            (0, Some(self.total - self.next))
        }
    }
}

impl<T> FusedIterator for PageStream<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{FakeRenderer, sample_pdf};
    use pagewerk_core::PagewerkError;

    fn doc(pages: usize) -> SourceDocument {
        SourceDocument::from_pdf_bytes("sample.pdf", sample_pdf(pages)).expect("ingest")
    }

    #[test]
    fn progress_is_strictly_increasing() {
        let document = doc(3);
        let mut events = Vec::new();
        let items: Vec<_> = PageStream::new(&document, |index| Ok(index.0))
            .on_progress(|event| events.push(event))
            .collect::<Result<_>>()
            .expect("stream");

        assert_eq!(items.len(), 3);
        let currents: Vec<usize> = events.iter().map(|e| e.current).collect();
        assert_eq!(currents, vec![1, 2, 3]);
        assert!(events.iter().all(|e| e.total == 3));
        assert!(events[2].is_last());
    }

    #[test]
    fn stream_fuses_after_first_error() {
        let document = doc(3);
        let renderer = FakeRenderer::failing_at(PageIndex(1));
        let mut events = 0;
        let mut stream = PageStream::new(&document, |index| {
            renderer.render_page(&document, index, 1.0)
        })
        .on_progress(|_| events += 1);

        assert!(matches!(stream.next(), Some(Ok(_))));
        assert!(matches!(stream.next(), Some(Err(PagewerkError::RenderFailure(_)))));
        assert!(stream.next().is_none());
        assert!(stream.next().is_none());
        drop(stream);
        assert_eq!(events, 1);
    }

    #[test]
    fn dropping_the_stream_stops_work() {
        let document = doc(5);
        let renderer = FakeRenderer::new();
        let mut stream = PageStream::new(&document, |index| {
            renderer.render_page(&document, index, 1.0)
        });

        let first = stream.next().expect("item").expect("render");
        assert_eq!(first.index, PageIndex(0));
        drop(stream);
        assert_eq!(renderer.render_count(), 1);
    }
}
