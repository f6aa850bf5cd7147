// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Pagewerk transformation engine.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PagewerkError, Result};

/// Unique identifier for a document held in a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What kind of content a source document carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentKind {
    /// A page container (PDF) with one or more pages.
    Paged,
    /// A single raster image, treated as a one-page document.
    SingleImage,
}

// -- Page addressing ----------------------------------------------------------

/// 1-based page number, as shown to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PageOrdinal(pub u32);

/// 0-based page offset, as used internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PageIndex(pub usize);

impl PageOrdinal {
    /// The matching index, or `None` for the out-of-model ordinal 0.
    pub fn to_index(self) -> Option<PageIndex> {
        (self.0 as usize).checked_sub(1).map(PageIndex)
    }
}

impl PageIndex {
    pub fn ordinal(self) -> PageOrdinal {
        PageOrdinal(self.0 as u32 + 1)
    }

    /// All indices of a document with `page_count` pages, in order.
    pub fn all(page_count: usize) -> impl Iterator<Item = PageIndex> {
        (0..page_count).map(PageIndex)
    }
}

impl std::fmt::Display for PageOrdinal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for PageIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// -- Paper ---------------------------------------------------------------------

/// Standard paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height), portrait orientation.
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A3 => (297, 420),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }

    /// Dimensions in points for the requested orientation.
    pub fn dimensions_pt(&self, landscape: bool) -> (f32, f32) {
        let (w_mm, h_mm) = self.dimensions_mm();
        let w = mm_to_pt(w_mm as f32);
        let h = mm_to_pt(h_mm as f32);
        let (short, long) = if w <= h { (w, h) } else { (h, w) };
        if landscape { (long, short) } else { (short, long) }
    }
}

/// Convert millimetres to PDF points (1/72 inch).
pub fn mm_to_pt(mm: f32) -> f32 {
    mm * 72.0 / 25.4
}

/// Convert PDF points to millimetres.
pub fn pt_to_mm(pt: f32) -> f32 {
    pt * 25.4 / 72.0
}

/// How raster images are laid out when converted to pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageLayout {
    /// Page size equals the image's pixel size (1 px = 1 pt).
    FitToImage,
    /// Standard paper, portrait; image scaled to fit and centred.
    StandardPortrait,
    /// Standard paper, landscape; image scaled to fit and centred.
    StandardLandscape,
}

// -- Styles ----------------------------------------------------------------------

/// An RGB colour with channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0.0, g: 0.0, b: 0.0 };
    pub const GREY: Rgb = Rgb { r: 0.5, g: 0.5, b: 0.5 };

    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(value: &str) -> Result<Self> {
        let hex = value.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(PagewerkError::InvalidInput(format!(
                "colour must be #rrggbb, got {value:?}"
            )));
        }
        let channel = |range: std::ops::Range<usize>| -> Result<f32> {
            u8::from_str_radix(&hex[range], 16)
                .map(|v| v as f32 / 255.0)
                .map_err(|_| PagewerkError::InvalidInput(format!("invalid colour {value:?}")))
        };
        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    fn in_unit_range(&self) -> bool {
        [self.r, self.g, self.b]
            .iter()
            .all(|c| (0.0..=1.0).contains(c))
    }
}

/// Appearance of a watermark stamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkStyle {
    /// Font size in points.
    pub font_size: f32,
    /// Fill opacity in `[0, 1]`.
    pub opacity: f32,
    /// Counter-clockwise rotation of the text, in degrees.
    pub rotation_degrees: f32,
    pub color: Rgb,
}

impl Default for WatermarkStyle {
    fn default() -> Self {
        Self {
            font_size: 48.0,
            opacity: 0.3,
            rotation_degrees: 45.0,
            color: Rgb::GREY,
        }
    }
}

impl WatermarkStyle {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(PagewerkError::InvalidInput(format!(
                "watermark opacity must be within [0, 1], got {}",
                self.opacity
            )));
        }
        if !(self.font_size > 0.0) {
            return Err(PagewerkError::InvalidInput(format!(
                "watermark font size must be positive, got {}",
                self.font_size
            )));
        }
        if !self.color.in_unit_range() {
            return Err(PagewerkError::InvalidInput(
                "watermark colour channels must be within [0, 1]".into(),
            ));
        }
        Ok(())
    }
}

/// Vertical placement of page numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerticalPosition {
    Top,
    Bottom,
}

/// Horizontal placement of page numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HorizontalAlignment {
    Left,
    Center,
    Right,
}

/// Appearance and placement of `"{n} / {total}"` page labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationStyle {
    pub vertical: VerticalPosition,
    pub horizontal: HorizontalAlignment,
    pub font_size: f32,
    pub color: Rgb,
}

impl Default for PaginationStyle {
    fn default() -> Self {
        Self {
            vertical: VerticalPosition::Bottom,
            horizontal: HorizontalAlignment::Center,
            font_size: 12.0,
            color: Rgb::BLACK,
        }
    }
}

impl PaginationStyle {
    pub fn validate(&self) -> Result<()> {
        if !(self.font_size > 0.0) {
            return Err(PagewerkError::InvalidInput(format!(
                "page number font size must be positive, got {}",
                self.font_size
            )));
        }
        if !self.color.in_unit_range() {
            return Err(PagewerkError::InvalidInput(
                "page number colour channels must be within [0, 1]".into(),
            ));
        }
        Ok(())
    }
}

/// Image encoding used for rasterized pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RasterFormat {
    Png,
    Jpeg,
}

impl RasterFormat {
    /// File extension used for archive entries.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

/// Which interactive grid a session drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionMode {
    Reorder,
    Delete,
}

// -- Progress and results --------------------------------------------------------

/// Emitted once per page processed by a streaming operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// 1-based number of the page just completed.
    pub current: usize,
    pub total: usize,
}

impl ProgressEvent {
    pub fn is_last(&self) -> bool {
        self.current == self.total
    }
}

/// Output content of a transformation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Pdf(Vec<u8>),
    Archive(Vec<u8>),
    Text(String),
}

/// A finished transformation, owned entirely by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformationResult {
    pub payload: Payload,
    pub suggested_name: String,
}

impl TransformationResult {
    pub fn pdf(bytes: Vec<u8>, suggested_name: impl Into<String>) -> Self {
        Self {
            payload: Payload::Pdf(bytes),
            suggested_name: suggested_name.into(),
        }
    }

    pub fn archive(bytes: Vec<u8>, suggested_name: impl Into<String>) -> Self {
        Self {
            payload: Payload::Archive(bytes),
            suggested_name: suggested_name.into(),
        }
    }

    pub fn text(text: String, suggested_name: impl Into<String>) -> Self {
        Self {
            payload: Payload::Text(text),
            suggested_name: suggested_name.into(),
        }
    }

    /// Raw bytes of the payload (UTF-8 for text).
    pub fn as_bytes(&self) -> &[u8] {
        match &self.payload {
            Payload::Pdf(bytes) | Payload::Archive(bytes) => bytes,
            Payload::Text(text) => text.as_bytes(),
        }
    }

    /// Consume the result and return the PDF bytes, if this is a PDF.
    pub fn into_pdf(self) -> Option<Vec<u8>> {
        match self.payload {
            Payload::Pdf(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// File stem used to derive output names (`report.pdf` -> `report`).
pub fn name_stem(name: &str) -> &str {
    let file = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match file.rfind('.') {
        Some(0) | None => file,
        Some(dot) => &file[..dot],
    }
}
