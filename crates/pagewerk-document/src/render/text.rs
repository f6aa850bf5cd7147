// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text extraction — page text in reading order, one delimited section per page.

use pagewerk_core::error::{PagewerkError, Result};
use pagewerk_core::types::{ProgressEvent, TransformationResult};
use tracing::{info, instrument};

use crate::model::SourceDocument;
use crate::pdf::codec::LoadedPdf;
use crate::render::PageStream;

/// Heading line written before each page's text.
pub fn page_delimiter(ordinal: u32) -> String {
    format!("--- Page {ordinal} ---")
}

/// Stream of per-page text, in page order.
pub fn text_stream<'a>(document: &SourceDocument) -> Result<PageStream<'a, String>> {
    document.ensure_paged()?;
    let loaded = LoadedPdf::load(document.bytes())?;
    Ok(PageStream::new(document, move |index| {
        let ordinal = index.ordinal();
        loaded
            .document()
            .extract_text(&[ordinal.0])
            .map_err(|err| {
                PagewerkError::CorruptDocument(format!("cannot read text of page {ordinal}: {err}"))
            })
    }))
}

/// Extract all text. Each page is preceded by `--- Page n ---`; pages are
/// separated by a blank line.
#[instrument(skip(document, on_progress), fields(pages = document.page_count()))]
pub fn extract_text<'a>(
    document: &SourceDocument,
    on_progress: impl FnMut(ProgressEvent) + 'a,
) -> Result<TransformationResult> {
    let sections = text_stream(document)?
        .on_progress(on_progress)
        .map(|item| {
            item.map(|artifact| {
                format!(
                    "{}\n{}",
                    page_delimiter(artifact.index.ordinal().0),
                    artifact.value.trim_end()
                )
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut text = sections.join("\n\n");
    text.push('\n');

    info!(chars = text.len(), "Text extracted");
    Ok(TransformationResult::text(
        text,
        format!("{}.txt", document.stem()),
    ))
}
