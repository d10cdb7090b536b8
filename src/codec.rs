//! # Image Codec Module
//!
//! Confine verso le librerie di imaging: decode del raster sorgente e encode WebP.
//! La conversione non implementa codec propri, li delega a:
//! - `image`: decode di JPEG/PNG/BMP/TIFF (palette già espansa in RGBA)
//! - `webp` (libwebp): encode lossy con controllo qualità
//!
//! La `ConversionPolicy` lavora solo tramite il trait `ImageCodec`, così i test
//! e backend alternativi possono sostituire l'implementazione.

use crate::error::ConvertError;
use image::{DynamicImage, RgbImage};
use std::path::Path;

/// Decode/encode capability used by the conversion policy
pub trait ImageCodec: Send + Sync {
    /// Decode an image file of any supported raster format
    fn decode(&self, path: &Path) -> Result<DynamicImage, ConvertError>;

    /// Encode an opaque RGB image at `quality` (1-100)
    fn encode(&self, image: &RgbImage, quality: u8) -> Result<Vec<u8>, ConvertError>;

    /// Extension of the encoded files, without dot
    fn extension(&self) -> &'static str;
}

/// libwebp encoder, `method` 6 trades CPU for smaller files
#[derive(Debug, Clone, Copy)]
pub struct WebpCodec {
    method: i32,
}

impl WebpCodec {
    pub fn new() -> Self {
        Self { method: 6 }
    }
}

impl Default for WebpCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageCodec for WebpCodec {
    fn decode(&self, path: &Path) -> Result<DynamicImage, ConvertError> {
        // Il formato viene dedotto dal contenuto, non dall'estensione
        image::io::Reader::open(path)
            .map_err(|e| ConvertError::Decode(e.to_string()))?
            .with_guessed_format()
            .map_err(|e| ConvertError::Decode(e.to_string()))?
            .decode()
            .map_err(|e| ConvertError::Decode(e.to_string()))
    }

    fn encode(&self, image: &RgbImage, quality: u8) -> Result<Vec<u8>, ConvertError> {
        let (width, height) = image.dimensions();
        let encoder = webp::Encoder::from_rgb(image.as_raw(), width, height);

        let mut config = webp::WebPConfig::new()
            .map_err(|_| ConvertError::Encode("failed to initialise libwebp config".to_string()))?;
        config.lossless = 0;
        config.quality = f32::from(quality.clamp(1, 100));
        config.method = self.method;

        let memory = encoder
            .encode_advanced(&config)
            .map_err(|e| ConvertError::Encode(format!("{:?}", e)))?;
        Ok(memory.to_vec())
    }

    fn extension(&self) -> &'static str {
        "webp"
    }
}
