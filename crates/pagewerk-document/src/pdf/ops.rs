// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Structural page operations — merge, split, reorder, delete, and rotate.
//
// Each operation checks its preconditions against the cached page count
// before the codec is touched, then assembles a brand-new document.

use std::collections::BTreeSet;

use lopdf::Object;
use pagewerk_core::PageRange;
use pagewerk_core::error::{PagewerkError, Result};
use pagewerk_core::types::{PageIndex, TransformationResult};
use tracing::{debug, info, instrument};

use crate::model::SourceDocument;
use crate::pdf::codec::{LoadedPdf, PageAssembler, page_rotation};

/// Concatenate the pages of every document, in the order given.
#[instrument(skip_all, fields(documents = documents.len()))]
pub fn merge(documents: &[SourceDocument]) -> Result<TransformationResult> {
    if documents.len() < 2 {
        return Err(PagewerkError::OperationPrecondition(format!(
            "merging needs at least two documents, got {}",
            documents.len()
        )));
    }
    for document in documents {
        document.ensure_paged()?;
    }

    let total: usize = documents.iter().map(SourceDocument::page_count).sum();
    info!(total_pages = total, "Merging documents");

    let mut assembler = PageAssembler::new();
    for document in documents {
        let loaded = LoadedPdf::load(document.bytes())?;
        let all: Vec<PageIndex> = PageIndex::all(loaded.page_count()).collect();
        assembler.append(&loaded, &all)?;
    }

    Ok(TransformationResult::pdf(assembler.finish()?, "merged.pdf"))
}

/// Extract the pages named by `range` into a new document.
///
/// Ordinals outside the document are ignored; an empty selection after that
/// filtering is an error.
#[instrument(skip_all, fields(range = %range))]
pub fn split(document: &SourceDocument, range: &PageRange) -> Result<TransformationResult> {
    document.ensure_paged()?;
    let indices = range.resolve(document.page_count());
    if indices.is_empty() {
        return Err(PagewerkError::InvalidInput(format!(
            "range {:?} selects no pages of a {}-page document",
            range.to_string(),
            document.page_count()
        )));
    }

    info!(selected = indices.len(), "Splitting document");
    let bytes = extract(document, &indices)?;
    let name = format!("{}_pages_{}.pdf", document.stem(), range);
    Ok(TransformationResult::pdf(bytes, name))
}

/// One single-page document per page, in page order.
#[instrument(skip_all, fields(pages = document.page_count()))]
pub fn split_to_singles(document: &SourceDocument) -> Result<Vec<TransformationResult>> {
    document.ensure_paged()?;
    let loaded = LoadedPdf::load(document.bytes())?;

    let mut outputs = Vec::with_capacity(loaded.page_count());
    for index in PageIndex::all(loaded.page_count()) {
        let mut assembler = PageAssembler::new();
        assembler.append(&loaded, &[index])?;
        let name = format!("{}_page_{}.pdf", document.stem(), index.ordinal());
        outputs.push(TransformationResult::pdf(assembler.finish()?, name));
    }

    info!(outputs = outputs.len(), "Document split into single pages");
    Ok(outputs)
}

/// Rebuild the document with its pages in `arrangement` order.
///
/// `arrangement` must be a permutation of every page index.
#[instrument(skip_all, fields(pages = document.page_count()))]
pub fn reorder(document: &SourceDocument, arrangement: &[PageIndex]) -> Result<TransformationResult> {
    document.ensure_paged()?;
    validate_permutation(arrangement, document.page_count())?;

    let bytes = extract(document, arrangement)?;
    debug!(?arrangement, "Pages reordered");
    Ok(TransformationResult::pdf(
        bytes,
        format!("{}_reordered.pdf", document.stem()),
    ))
}

/// Remove the pages in `indices`, keeping the rest in their original order.
#[instrument(skip_all, fields(pages = document.page_count(), selected = indices.len()))]
pub fn delete_pages(
    document: &SourceDocument,
    indices: &BTreeSet<PageIndex>,
) -> Result<TransformationResult> {
    document.ensure_paged()?;
    if indices.is_empty() {
        return Err(PagewerkError::OperationPrecondition(
            "no pages selected for deletion".to_string(),
        ));
    }

    let keep: Vec<PageIndex> = PageIndex::all(document.page_count())
        .filter(|index| !indices.contains(index))
        .collect();
    if keep.is_empty() {
        return Err(PagewerkError::OperationPrecondition(
            "cannot delete every page; at least one must remain".to_string(),
        ));
    }
    if keep.len() == document.page_count() {
        return Err(PagewerkError::OperationPrecondition(
            "no pages selected for deletion within the document".to_string(),
        ));
    }

    info!(remaining = keep.len(), "Deleting pages");
    let bytes = extract(document, &keep)?;
    Ok(TransformationResult::pdf(
        bytes,
        format!("{}_trimmed.pdf", document.stem()),
    ))
}

/// Add `delta_degrees` to the rotation of the targeted pages (all pages when
/// `targets` is `None`). Rotation accumulates across calls.
#[instrument(skip(document, targets), fields(pages = document.page_count()))]
pub fn rotate(
    document: &SourceDocument,
    delta_degrees: i32,
    targets: Option<&BTreeSet<PageIndex>>,
) -> Result<TransformationResult> {
    document.ensure_paged()?;
    if delta_degrees % 90 != 0 {
        return Err(PagewerkError::InvalidInput(format!(
            "rotation must be a multiple of 90, got {delta_degrees}"
        )));
    }

    let selected: BTreeSet<PageIndex> = match targets {
        Some(targets) => {
            let in_bounds: BTreeSet<PageIndex> = targets
                .iter()
                .copied()
                .filter(|index| document.contains(*index))
                .collect();
            if in_bounds.is_empty() {
                return Err(PagewerkError::InvalidInput(
                    "none of the pages to rotate exist in the document".to_string(),
                ));
            }
            in_bounds
        }
        None => PageIndex::all(document.page_count()).collect(),
    };

    let loaded = LoadedPdf::load(document.bytes())?;
    let all: Vec<PageIndex> = PageIndex::all(loaded.page_count()).collect();
    let mut assembler = PageAssembler::new();
    assembler.append(&loaded, &all)?;

    let page_ids = assembler.page_ids().to_vec();
    let target = assembler.document_mut();
    for index in &selected {
        let page_id = page_ids[index.0];
        let existing = page_rotation(target, page_id);
        let rotation = (existing + i64::from(delta_degrees)).rem_euclid(360);

        let page = target
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|err| PagewerkError::Codec(format!("cannot update page {index}: {err}")))?;
        page.set("Rotate", Object::Integer(rotation));
        debug!(page = %index.ordinal(), existing, rotation, "Page rotated");
    }

    info!(rotated = selected.len(), delta_degrees, "Rotation applied");
    Ok(TransformationResult::pdf(
        assembler.finish()?,
        format!("{}_rotated.pdf", document.stem()),
    ))
}

/// Check that `arrangement` names every page exactly once.
pub fn validate_permutation(arrangement: &[PageIndex], page_count: usize) -> Result<()> {
    if arrangement.len() != page_count {
        return Err(PagewerkError::InvalidInput(format!(
            "arrangement has {} entries for a {page_count}-page document",
            arrangement.len()
        )));
    }
    let mut seen = vec![false; page_count];
    for index in arrangement {
        match seen.get_mut(index.0) {
            Some(slot) if !*slot => *slot = true,
            Some(_) => {
                return Err(PagewerkError::InvalidInput(format!(
                    "page index {index} appears twice in the arrangement"
                )));
            }
            None => {
                return Err(PagewerkError::InvalidInput(format!(
                    "page index {index} is out of range"
                )));
            }
        }
    }
    Ok(())
}

fn extract(document: &SourceDocument, indices: &[PageIndex]) -> Result<Vec<u8>> {
    let loaded = LoadedPdf::load(document.bytes())?;
    let mut assembler = PageAssembler::new();
    assembler.append(&loaded, indices)?;
    assembler.finish()
}
