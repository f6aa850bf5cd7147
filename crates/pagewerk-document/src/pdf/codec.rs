// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Codec adapter — loading PDFs and assembling new ones from copied pages
// using the `lopdf` crate.
//
// Every transformation builds a fresh document: pages are deep-copied out of
// the source, so the source's security handler and page tree shape never
// leak into the output.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object, ObjectId};
use pagewerk_core::error::{PagewerkError, Result};
use pagewerk_core::types::PageIndex;
use tracing::{debug, warn};

/// Page attributes that may be inherited from an ancestor `/Pages` node.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against malformed, cyclic page trees.
const MAX_TREE_DEPTH: usize = 64;

/// US Letter, used when neither the page nor its ancestors carry a media box.
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// A parsed source document with its pages in reading order.
pub struct LoadedPdf {
    document: Document,
    page_ids: Vec<ObjectId>,
}

impl LoadedPdf {
    /// Parse PDF bytes. Documents carrying edit restrictions load normally.
    pub fn load(bytes: &[u8]) -> Result<Self> {
        let document = Document::load_mem(bytes).map_err(|err| {
            PagewerkError::CorruptDocument(format!("failed to parse PDF: {err}"))
        })?;

        // `get_pages` is keyed by 1-based page number, so values come out in order.
        let page_ids: Vec<ObjectId> = document.get_pages().into_values().collect();

        Ok(Self { document, page_ids })
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    pub fn page_id(&self, index: PageIndex) -> Option<ObjectId> {
        self.page_ids.get(index.0).copied()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

/// Builds a new document by appending copies of source pages.
pub struct PageAssembler {
    target: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
}

impl Default for PageAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl PageAssembler {
    pub fn new() -> Self {
        let mut target = Document::with_version("1.5");
        let pages_id = target.new_object_id();
        Self {
            target,
            pages_id,
            kids: Vec::new(),
        }
    }

    /// Append the pages at `indices` of `source`, in the given order.
    ///
    /// Indices must be distinct and in bounds. Objects shared between the
    /// copied pages (fonts, images) are copied once.
    pub fn append(&mut self, source: &LoadedPdf, indices: &[PageIndex]) -> Result<()> {
        let mut copied: HashMap<ObjectId, ObjectId> = HashMap::new();

        // Reserve ids for every selected page first, so references between
        // them (links, annotations) resolve to the copies.
        let mut plan = Vec::with_capacity(indices.len());
        for &index in indices {
            let source_id = source.page_id(index).ok_or_else(|| {
                PagewerkError::InvalidInput(format!(
                    "page index {index} out of range (document has {} pages)",
                    source.page_count()
                ))
            })?;
            let target_id = self.target.new_object_id();
            if copied.insert(source_id, target_id).is_some() {
                return Err(PagewerkError::InvalidInput(format!(
                    "page index {index} selected twice"
                )));
            }
            plan.push((source_id, target_id));
        }

        for (source_id, target_id) in plan {
            self.copy_page(&source.document, source_id, target_id, &mut copied)?;
            self.kids.push(target_id);
        }

        debug!(appended = indices.len(), total = self.kids.len(), "pages appended");
        Ok(())
    }

    /// Object ids of the assembled pages, in order.
    pub fn page_ids(&self) -> &[ObjectId] {
        &self.kids
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.target
    }

    /// Close the page tree and serialise.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let kids: Vec<Object> = self.kids.iter().map(|id| Object::Reference(*id)).collect();
        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set("Count", Object::Integer(kids.len() as i64));
        pages.set("Kids", Object::Array(kids));
        self.target
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(self.pages_id));
        let catalog_id = self.target.add_object(catalog);
        self.target.trailer.set("Root", Object::Reference(catalog_id));

        let mut output = Vec::new();
        self.target.save_to(&mut output).map_err(|err| {
            PagewerkError::Codec(format!("failed to serialise document: {err}"))
        })?;

        debug!(pages = self.kids.len(), output_bytes = output.len(), "document assembled");
        Ok(output)
    }

    fn copy_page(
        &mut self,
        source: &Document,
        source_id: ObjectId,
        target_id: ObjectId,
        copied: &mut HashMap<ObjectId, ObjectId>,
    ) -> Result<()> {
        let page = source.get_dictionary(source_id).map_err(|err| {
            PagewerkError::CorruptDocument(format!("cannot read page {source_id:?}: {err}"))
        })?;

        let mut new_page = Dictionary::new();
        for (key, value) in page.iter() {
            // /Parent is re-pointed at the new page tree below.
            if key == b"Parent" {
                continue;
            }
            let value = deep_copy(source, &mut self.target, value, copied);
            new_page.set(key.clone(), value);
        }

        // Materialise inherited attributes; the new tree has no ancestors to
        // inherit them from.
        for key in INHERITABLE_KEYS {
            if new_page.has(key) {
                continue;
            }
            if let Some(value) = inherited_attribute(source, source_id, key) {
                let value = deep_copy(source, &mut self.target, value, copied);
                new_page.set(key.to_vec(), value);
            }
        }
        if !new_page.has(b"MediaBox") {
            new_page.set(
                "MediaBox",
                Object::Array(DEFAULT_MEDIA_BOX.iter().map(|v| Object::Real(*v as _)).collect()),
            );
        }

        new_page.set("Parent", Object::Reference(self.pages_id));
        self.target
            .objects
            .insert(target_id, Object::Dictionary(new_page));
        Ok(())
    }
}

/// Look up `key` on a page, walking `/Parent` links when the page itself
/// does not carry it.
pub fn inherited_attribute<'a>(
    document: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut current = document.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = current.get(key) {
            return Some(value);
        }
        let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
        current = document.get_dictionary(parent).ok()?;
    }
    None
}

/// Follow a single indirect reference, if `object` is one.
pub fn resolve<'a>(document: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => document.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Integer or real operand as `f32`.
pub fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value as f32),
        _ => None,
    }
}

/// Page rectangle `[llx lly urx ury]` of a page in `document`.
pub fn media_box(document: &Document, page_id: ObjectId) -> [f32; 4] {
    let values: Option<Vec<f32>> = inherited_attribute(document, page_id, b"MediaBox")
        .and_then(|obj| resolve(document, obj))
        .and_then(|obj| obj.as_array().ok())
        .map(|array| {
            array
                .iter()
                .filter_map(|item| resolve(document, item).and_then(number))
                .collect()
        });

    match values.as_deref() {
        Some(&[a, b, c, d]) => [a.min(c), b.min(d), a.max(c), b.max(d)],
        _ => DEFAULT_MEDIA_BOX,
    }
}

/// Current `/Rotate` of a page, normalised to `0..360`.
pub fn page_rotation(document: &Document, page_id: ObjectId) -> i64 {
    inherited_attribute(document, page_id, b"Rotate")
        .and_then(|obj| resolve(document, obj))
        .and_then(number)
        .map(|degrees| (degrees.round() as i64).rem_euclid(360))
        .unwrap_or(0)
}

/// Deep-copy an object from `source` into `target`, copying each referenced
/// object at most once.
///
/// References to page objects outside the copied selection become `null`,
/// so links to dropped pages do not drag those pages along.
fn deep_copy(
    source: &Document,
    target: &mut Document,
    object: &Object,
    copied: &mut HashMap<ObjectId, ObjectId>,
) -> Object {
    match object {
        Object::Reference(ref_id) => {
            if let Some(new_id) = copied.get(ref_id) {
                return Object::Reference(*new_id);
            }
            let referenced = match source.get_object(*ref_id) {
                Ok(referenced) => referenced,
                Err(err) => {
                    warn!(?ref_id, %err, "cannot resolve reference, using null");
                    return Object::Null;
                }
            };
            if is_page(referenced) {
                return Object::Null;
            }

            let new_id = target.new_object_id();
            copied.insert(*ref_id, new_id);
            let cloned = deep_copy(source, target, referenced, copied);
            target.objects.insert(new_id, cloned);
            Object::Reference(new_id)
        }
        Object::Dictionary(dict) => Object::Dictionary(copy_dictionary(source, target, dict, copied)),
        Object::Array(items) => Object::Array(
            items
                .iter()
                .map(|item| deep_copy(source, target, item, copied))
                .collect(),
        ),
        Object::Stream(stream) => {
            let mut cloned = stream.clone();
            cloned.dict = copy_dictionary(source, target, &stream.dict, copied);
            Object::Stream(cloned)
        }
        other => other.clone(),
    }
}

fn copy_dictionary(
    source: &Document,
    target: &mut Document,
    dict: &Dictionary,
    copied: &mut HashMap<ObjectId, ObjectId>,
) -> Dictionary {
    let mut new_dict = Dictionary::new();
    for (key, value) in dict.iter() {
        // Links up the source page tree are not carried over. Other parents
        // (form fields, popup owners) are copied like any reference.
        if key == b"Parent" && is_page_tree_node(source, value) {
            continue;
        }
        new_dict.set(key.clone(), deep_copy(source, target, value, copied));
    }
    new_dict
}

fn is_page_tree_node(document: &Document, object: &Object) -> bool {
    resolve(document, object)
        .and_then(|obj| obj.as_dict().ok())
        .and_then(|dict| dict.get(b"Type").ok())
        .and_then(|t| t.as_name().ok())
        .is_some_and(|name| name == b"Pages" || name == b"Page")
}

fn is_page(object: &Object) -> bool {
    match object {
        Object::Dictionary(dict) => dict
            .get(b"Type")
            .and_then(|t| t.as_name())
            .map(|name| name == b"Page")
            .unwrap_or(false),
        _ => false,
    }
}
