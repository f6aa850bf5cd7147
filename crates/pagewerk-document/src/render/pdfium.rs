// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDFium renderer — rasterizes pages through the PDFium shared library.
//
// Only compiled with the "pdfium" feature. The library is looked up next to
// the executable's working directory first, then on the system library path.

use image::RgbaImage;
use pagewerk_core::error::{PagewerkError, Result};
use pagewerk_core::types::PageIndex;
use pdfium_render::prelude::*;
use tracing::{debug, info, instrument};

use crate::model::SourceDocument;
use crate::render::PageRenderer;

/// Renders pages with PDFium. Each call opens the document afresh, so no
/// state is shared between pages.
pub struct PdfiumRenderer {
    pdfium: Pdfium,
}

impl PdfiumRenderer {
    /// Bind to the PDFium library.
    pub fn new() -> Result<Self> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|err| {
                PagewerkError::RenderFailure(format!("failed to load the PDFium library: {err}"))
            })?;
        info!("PDFium renderer initialised");
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }
}

impl PageRenderer for PdfiumRenderer {
    #[instrument(skip(self, document), fields(page = %index.ordinal()))]
    fn render_page(
        &self,
        document: &SourceDocument,
        index: PageIndex,
        scale: f32,
    ) -> Result<RgbaImage> {
        let render_err = |err: PdfiumError| {
            PagewerkError::RenderFailure(format!("page {}: {err}", index.ordinal()))
        };

        let pdf = self
            .pdfium
            .load_pdf_from_byte_slice(document.bytes(), None)
            .map_err(render_err)?;
        let page_number = u16::try_from(index.0).map_err(|_| {
            PagewerkError::RenderFailure(format!("page {} is beyond PDFium's range", index.ordinal()))
        })?;
        let page = pdf.pages().get(page_number).map_err(render_err)?;

        let config = PdfRenderConfig::new().scale_page_by_factor(scale);
        let bitmap = page.render_with_config(&config).map_err(render_err)?;

        let (width, height) = (bitmap.width() as u32, bitmap.height() as u32);
        debug!(width, height, "Page rendered");
        RgbaImage::from_raw(width, height, bitmap.as_rgba_bytes()).ok_or_else(|| {
            PagewerkError::RenderFailure(format!(
                "page {} produced a malformed bitmap",
                index.ordinal()
            ))
        })
    }
}
