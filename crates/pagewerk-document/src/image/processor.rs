// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — encodes rendered page bitmaps into archive-ready bytes
// using the `image` crate.

use image::{DynamicImage, ImageFormat, RgbaImage};
use pagewerk_core::error::{PagewerkError, Result};
use pagewerk_core::types::RasterFormat;
use tracing::{debug, instrument};

/// Owns a single rendered page while it is being encoded.
///
/// Rendering, encoding, and release happen one page at a time, so a processor
/// is created per page and dropped as soon as its bytes exist.
pub struct ImageProcessor {
    image: DynamicImage,
}

impl ImageProcessor {
    /// Wrap a bitmap produced by a renderer.
    pub fn from_rgba(image: RgbaImage) -> Self {
        Self {
            image: DynamicImage::ImageRgba8(image),
        }
    }

    /// Decode raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data)
            .map_err(|err| PagewerkError::Image(format!("failed to decode image: {err}")))?;
        debug!(width = img.width(), height = img.height(), "Image decoded from bytes");
        Ok(Self { image: img })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Encode in the requested raster format. `jpeg_quality` is ignored for PNG.
    pub fn encode(&self, format: RasterFormat, jpeg_quality: u8) -> Result<Vec<u8>> {
        match format {
            RasterFormat::Png => self.to_png_bytes(),
            RasterFormat::Jpeg => self.to_jpeg_bytes(jpeg_quality),
        }
    }

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| PagewerkError::Image(format!("PNG encoding failed: {err}")))?;
        Ok(buffer)
    }

    /// Encode as JPEG with the given quality (1-100). Alpha is discarded.
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
        rgb.write_with_encoder(encoder)
            .map_err(|err| PagewerkError::Image(format!("JPEG encoding failed: {err}")))?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn tile() -> ImageProcessor {
        ImageProcessor::from_rgba(RgbaImage::from_pixel(12, 8, Rgba([10, 20, 30, 255])))
    }

    #[test]
    fn png_output_decodes_back() {
        let bytes = tile().encode(RasterFormat::Png, 90).expect("png");
        assert_eq!(image::guess_format(&bytes).expect("format"), ImageFormat::Png);

        let decoded = ImageProcessor::from_bytes(&bytes).expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (12, 8));
    }

    #[test]
    fn jpeg_output_has_jpeg_signature() {
        let bytes = tile().encode(RasterFormat::Jpeg, 75).expect("jpeg");
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(ImageProcessor::from_bytes(b"not an image").is_err());
    }
}
