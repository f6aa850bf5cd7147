// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Source documents — immutable handles to ingested PDF or image bytes.

use std::sync::Arc;

use pagewerk_core::error::{PagewerkError, Result};
use pagewerk_core::types::{DocumentKind, PageIndex, name_stem};
use tracing::{debug, instrument};

use crate::pdf::codec::LoadedPdf;

/// How far into a file the `%PDF-` marker may appear.
const PDF_HEADER_SEARCH_WINDOW: usize = 1024;

/// Immutable document content plus its derived page addressing.
///
/// Cloning is cheap: the bytes are shared. Nothing in the engine mutates a
/// `SourceDocument`; every transformation produces new bytes.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    name: String,
    bytes: Arc<[u8]>,
    page_count: usize,
    kind: DocumentKind,
}

impl SourceDocument {
    /// Ingest PDF bytes, counting pages through the codec.
    #[instrument(skip_all, fields(bytes_len = bytes.len()))]
    pub fn from_pdf_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let loaded = LoadedPdf::load(&bytes)?;
        let page_count = loaded.page_count();
        if page_count == 0 {
            return Err(PagewerkError::CorruptDocument(
                "document has no pages".to_string(),
            ));
        }

        debug!(page_count, "PDF ingested");
        Ok(Self {
            name: name.into(),
            bytes: bytes.into(),
            page_count,
            kind: DocumentKind::Paged,
        })
    }

    /// Ingest a raster image as a one-page document.
    ///
    /// Only the format is sniffed here; pixel data is decoded when the image
    /// is actually placed on a page.
    #[instrument(skip_all, fields(bytes_len = bytes.len()))]
    pub fn from_image_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let format = image::guess_format(&bytes)
            .map_err(|err| PagewerkError::Image(format!("unrecognised image format: {err}")))?;

        debug!(?format, "image ingested");
        Ok(Self {
            name: name.into(),
            bytes: bytes.into(),
            page_count: 1,
            kind: DocumentKind::SingleImage,
        })
    }

    /// Ingest bytes of either kind, choosing by content.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        if looks_like_pdf(&bytes) {
            Self::from_pdf_bytes(name, bytes)
        } else {
            Self::from_image_bytes(name, bytes)
        }
    }

    /// Read and ingest a file from disk.
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "document".into());
        Self::from_bytes(name, bytes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// File stem used to derive output names.
    pub fn stem(&self) -> &str {
        name_stem(&self.name)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn contains(&self, index: PageIndex) -> bool {
        index.0 < self.page_count
    }

    /// Reject single-image documents for page-container operations.
    pub fn ensure_paged(&self) -> Result<()> {
        match self.kind {
            DocumentKind::Paged => Ok(()),
            DocumentKind::SingleImage => Err(PagewerkError::InvalidInput(format!(
                "{} is an image, not a paged document",
                self.name
            ))),
        }
    }
}

fn looks_like_pdf(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(PDF_HEADER_SEARCH_WINDOW)];
    window.windows(5).any(|w| w == b"%PDF-")
}
