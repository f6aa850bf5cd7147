// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{PagewerkError, Result};
use crate::types::{ImageLayout, PaginationStyle, PaperSize, RasterFormat, WatermarkStyle};

/// Well-known file name for persisted settings inside the data directory.
pub const CONFIG_FILE: &str = "config.json";

/// Persistent engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Render scale for session thumbnails (1.0 = 72 dpi).
    pub thumbnail_scale: f32,
    /// Render scale for rasterize-to-archive exports.
    pub raster_scale: f32,
    /// Default image encoding for rasterized pages.
    pub raster_format: RasterFormat,
    /// JPEG quality (1-100) when `raster_format` is JPEG.
    pub jpeg_quality: u8,
    /// Distance in points between a page edge and its page-number label.
    pub pagination_margin: f32,
    /// Paper used by the standard image layouts.
    pub paper_size: PaperSize,
    /// Default layout for image-to-document conversion.
    pub image_layout: ImageLayout,
    pub watermark: WatermarkStyle,
    pub pagination: PaginationStyle,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            thumbnail_scale: 0.3,
            raster_scale: 2.0,
            raster_format: RasterFormat::Png,
            jpeg_quality: 90,
            pagination_margin: 30.0,
            paper_size: PaperSize::A4,
            image_layout: ImageLayout::StandardPortrait,
            watermark: WatermarkStyle::default(),
            pagination: PaginationStyle::default(),
        }
    }
}

impl EngineConfig {
    /// Check that every setting is within its usable range.
    pub fn validate(&self) -> Result<()> {
        for (name, scale) in [
            ("thumbnail_scale", self.thumbnail_scale),
            ("raster_scale", self.raster_scale),
        ] {
            if !(scale > 0.0 && scale <= 10.0) {
                return Err(PagewerkError::Config(format!(
                    "{name} must be within (0, 10], got {scale}"
                )));
            }
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(PagewerkError::Config(format!(
                "jpeg_quality must be within 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        if !(self.pagination_margin >= 0.0) {
            return Err(PagewerkError::Config(format!(
                "pagination_margin must not be negative, got {}",
                self.pagination_margin
            )));
        }
        self.watermark
            .validate()
            .and_then(|_| self.pagination.validate())
            .map_err(|err| PagewerkError::Config(err.to_string()))
    }

    /// Read a config file. Missing keys take their default values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        debug!(path = %path.as_ref().display(), "configuration loaded");
        Ok(config)
    }

    /// Read `config.json` from `data_dir`, or fall back to defaults when the
    /// file does not exist.
    pub fn load_or_default(data_dir: impl AsRef<Path>) -> Result<Self> {
        let path = data_dir.as_ref().join(CONFIG_FILE);
        if !path.exists() {
            debug!(path = %path.display(), "no configuration file, using defaults");
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    /// Write the configuration as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.validate()?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        info!(path = %path.as_ref().display(), "configuration saved");
        Ok(())
    }
}
