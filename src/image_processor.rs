//! # Image Processing Module
//!
//! Questo modulo contiene la `ConversionPolicy`: la logica che trasforma un
//! singolo file raster in WebP.
//!
//! ## Pipeline di conversione
//!
//! 1. **Dimensione sorgente**: file illeggibile → `Decode`, file vuoto → `InvalidInput`
//! 2. **Decode**: tramite `ImageCodec`, qualsiasi errore → `Decode`
//! 3. **Normalizzazione colore**: immagini con alpha (inclusa la palette con
//!    trasparenza, già espansa dal decoder) vengono composte su sfondo bianco
//!    usando l'alpha come maschera; gli altri modelli colore vengono convertiti
//!    direttamente in RGB 8-bit
//! 4. **Resize**: opzionale, solo riduzione, aspect ratio preservato, Lanczos3
//! 5. **Encode + scrittura**: file temporaneo nella directory di destinazione,
//!    poi rename atomico sul path finale
//! 6. **Misura**: byte originali vs byte su disco dell'output
//!
//! ## Isolamento errori
//!
//! `convert()` non restituisce mai `Err`: ogni errore diventa un
//! `ConversionOutcome::Failure` con la sua `FailureKind`, così un file rotto
//! non può interrompere il batch.
//!
//! ## Perché il bianco
//!
//! WebP lossy senza alpha scarterebbe il canale lasciando il colore dei pixel
//! trasparenti, tipicamente nero: i bordi trasparenti diventerebbero neri.

use crate::{
    codec::{ImageCodec, WebpCodec},
    config::ResizeBounds,
    error::ConvertError,
    optimizer::batch_scheduler::Converter,
    types::{ConversionRequest, ConversionResult},
};
use image::{imageops::FilterType, DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

/// Per-file conversion policy: normalize, resize, encode, measure
#[derive(Debug, Clone, Default)]
pub struct ConversionPolicy<C: ImageCodec = WebpCodec> {
    codec: C,
}

impl ConversionPolicy<WebpCodec> {
    pub fn new() -> Self {
        Self { codec: WebpCodec::new() }
    }
}

impl<C: ImageCodec> ConversionPolicy<C> {
    pub fn with_codec(codec: C) -> Self {
        Self { codec }
    }

    /// Extension of the files this policy writes
    pub fn output_extension(&self) -> &'static str {
        self.codec.extension()
    }

    /// Convert one file. Never fails: errors become a `Failure` outcome.
    pub fn convert(&self, request: &ConversionRequest) -> ConversionResult {
        match self.try_convert(request) {
            Ok((original_bytes, new_bytes)) => {
                let result = ConversionResult::success(request, original_bytes, new_bytes);
                debug!(
                    "Converted {} -> {} ({} -> {} bytes)",
                    request.input_path().display(),
                    request.output_path().display(),
                    original_bytes,
                    new_bytes
                );
                result
            }
            Err(e) => {
                warn!("Conversion failed for {}: {}", request.input_path().display(), e);
                ConversionResult::failure(request, &e)
            }
        }
    }

    fn try_convert(&self, request: &ConversionRequest) -> Result<(u64, u64), ConvertError> {
        let input_path = request.input_path();

        let original_bytes = std::fs::metadata(input_path)
            .map_err(|e| {
                ConvertError::Decode(format!("cannot read {}: {}", input_path.display(), e))
            })?
            .len();

        // Input degenere: niente decode, niente divisione per zero
        if original_bytes == 0 {
            return Err(ConvertError::InvalidInput(format!(
                "{} is empty (0 bytes)",
                input_path.display()
            )));
        }

        let decoded = self.codec.decode(input_path)?;
        let mut rgb = normalize_color(decoded);

        if let Some(bounds) = request.resize() {
            rgb = resize_to_fit(rgb, bounds);
        }

        let encoded = self.codec.encode(&rgb, request.quality())?;
        write_output(request.output_path(), &encoded)?;

        let new_bytes = std::fs::metadata(request.output_path())?.len();
        Ok((original_bytes, new_bytes))
    }
}

impl<C: ImageCodec + 'static> Converter for ConversionPolicy<C> {
    fn convert(&self, request: &ConversionRequest) -> ConversionResult {
        ConversionPolicy::convert(self, request)
    }
}

/// Flatten any color model into opaque 8-bit RGB
pub fn normalize_color(image: DynamicImage) -> RgbImage {
    if image.color().has_alpha() {
        composite_on_white(&image.to_rgba8())
    } else {
        match image {
            DynamicImage::ImageRgb8(rgb) => rgb,
            other => other.to_rgb8(),
        }
    }
}

/// Alpha-composite onto an opaque white background of the same size
pub fn composite_on_white(rgba: &RgbaImage) -> RgbImage {
    let (width, height) = rgba.dimensions();
    RgbImage::from_fn(width, height, |x, y| {
        let Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
        Rgb([blend_white(r, a), blend_white(g, a), blend_white(b, a)])
    })
}

fn blend_white(channel: u8, alpha: u8) -> u8 {
    let (c, a) = (u32::from(channel), u32::from(alpha));
    ((c * a + 255 * (255 - a) + 127) / 255) as u8
}

/// Target size that fits `width x height` within `bounds`, preserving aspect
/// ratio. Never upscales.
pub fn fit_within(width: u32, height: u32, bounds: ResizeBounds) -> (u32, u32) {
    if width <= bounds.max_width && height <= bounds.max_height {
        return (width, height);
    }

    let scale = f64::min(
        f64::from(bounds.max_width) / f64::from(width),
        f64::from(bounds.max_height) / f64::from(height),
    );

    let new_width = ((f64::from(width) * scale).round() as u32).clamp(1, bounds.max_width);
    let new_height = ((f64::from(height) * scale).round() as u32).clamp(1, bounds.max_height);
    (new_width, new_height)
}

/// Shrink with Lanczos3 when the image exceeds `bounds`
pub fn resize_to_fit(image: RgbImage, bounds: ResizeBounds) -> RgbImage {
    let (width, height) = image.dimensions();
    let (new_width, new_height) = fit_within(width, height, bounds);

    if (new_width, new_height) == (width, height) {
        return image;
    }

    debug!("Resizing {}x{} -> {}x{}", width, height, new_width, new_height);
    image::imageops::resize(&image, new_width, new_height, FilterType::Lanczos3)
}

/// Write through a temp file in the destination directory, then rename.
/// A failed write never leaves a partial output behind.
fn write_output(output_path: &Path, bytes: &[u8]) -> Result<(), ConvertError> {
    let parent = match output_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
    temp_file.write_all(bytes)?;
    temp_file.flush()?;
    temp_file.persist(output_path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::types::ConversionOutcome;
    use image::{GrayAlphaImage, GrayImage, Luma, LumaA};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn request(input: PathBuf, output: PathBuf, resize: Option<ResizeBounds>) -> ConversionRequest {
        ConversionRequest::new(input, output, resize, 80)
    }

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 5 % 256) as u8, ((x + y) % 256) as u8])
        })
    }

    /// Decode WebP bytes into (width, height, channels, pixels)
    fn decode_webp(path: &Path) -> (u32, u32, usize, Vec<u8>) {
        let bytes = std::fs::read(path).unwrap();
        let decoded = webp::Decoder::new(&bytes).decode().unwrap();
        let channels = if decoded.is_alpha() { 4 } else { 3 };
        (decoded.width(), decoded.height(), channels, decoded.to_vec())
    }

    #[test]
    fn test_converts_jpeg_and_measures_sizes() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("photo.jpg");
        gradient(64, 48).save(&input).unwrap();
        let output = temp_dir.path().join("out/nested/photo.webp");

        let result = ConversionPolicy::new().convert(&request(input.clone(), output.clone(), None));

        assert_eq!(result.file_name, "photo.jpg");
        match result.outcome {
            ConversionOutcome::Success { original_bytes, new_bytes, compression_ratio } => {
                assert_eq!(original_bytes, std::fs::metadata(&input).unwrap().len());
                assert_eq!(new_bytes, std::fs::metadata(&output).unwrap().len());
                let expected = (1.0 - new_bytes as f64 / original_bytes as f64) * 100.0;
                assert!((compression_ratio - expected).abs() < 1e-9);
            }
            other => panic!("expected success, got {:?}", other),
        }
        assert!(output.exists());
    }

    #[test]
    fn test_zero_byte_input_is_invalid_input() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("empty.png");
        std::fs::write(&input, b"").unwrap();
        let output = temp_dir.path().join("empty.webp");

        let result = ConversionPolicy::new().convert(&request(input, output.clone(), None));

        match result.outcome {
            ConversionOutcome::Failure { kind, .. } => assert_eq!(kind, FailureKind::InvalidInput),
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(!output.exists());
    }

    #[test]
    fn test_corrupt_input_is_decode_error() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("corrupt.jpg");
        std::fs::write(&input, b"\xFF\xD8\xFF garbage that is not a jpeg").unwrap();

        let result = ConversionPolicy::new()
            .convert(&request(input, temp_dir.path().join("corrupt.webp"), None));

        match result.outcome {
            ConversionOutcome::Failure { kind, message } => {
                assert_eq!(kind, FailureKind::Decode);
                assert!(!message.is_empty());
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_input_is_decode_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = ConversionPolicy::new().convert(&request(
            temp_dir.path().join("gone.png"),
            temp_dir.path().join("gone.webp"),
            None,
        ));
        assert!(matches!(
            result.outcome,
            ConversionOutcome::Failure { kind: FailureKind::Decode, .. }
        ));
    }

    #[test]
    fn test_transparent_pixels_become_white() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("logo.png");
        // Metà sinistra trasparente con colore nero, metà destra rosso opaco
        let rgba = RgbaImage::from_fn(32, 32, |x, _| {
            if x < 16 { Rgba([0, 0, 0, 0]) } else { Rgba([220, 20, 20, 255]) }
        });
        rgba.save(&input).unwrap();
        let output = temp_dir.path().join("logo.webp");

        let result = ConversionPolicy::new().convert(&request(input, output.clone(), None));
        assert!(result.is_success(), "{:?}", result);

        let (width, _, channels, pixels) = decode_webp(&output);
        let idx = ((16 * width + 4) as usize) * channels;
        let (r, g, b) = (pixels[idx], pixels[idx + 1], pixels[idx + 2]);
        assert!(
            r > 200 && g > 200 && b > 200,
            "transparent area rendered as ({}, {}, {})",
            r,
            g,
            b
        );
    }

    /// PNG indicizzato 2x1: indice 0 rosso trasparente (tRNS), indice 1 blu opaco
    fn write_indexed_png(path: &Path) {
        let file = std::fs::File::create(path).unwrap();
        let mut encoder = png::Encoder::new(std::io::BufWriter::new(file), 2, 1);
        encoder.set_color(png::ColorType::Indexed);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_palette(vec![255, 0, 0, 0, 0, 255]);
        encoder.set_trns(vec![0u8, 255]);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(&[0, 1]).unwrap();
    }

    #[test]
    fn test_palette_transparency_becomes_white() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("indexed.png");
        write_indexed_png(&input);

        let decoded = WebpCodec::new().decode(&input).unwrap();
        assert!(decoded.color().has_alpha(), "palette decoded as {:?}", decoded.color());

        let rgb = normalize_color(decoded);
        assert_eq!(*rgb.get_pixel(0, 0), Rgb([255, 255, 255]));
        assert_eq!(*rgb.get_pixel(1, 0), Rgb([0, 0, 255]));
    }

    #[test]
    fn test_composite_blends_partial_alpha() {
        let rgba = RgbaImage::from_fn(3, 1, |x, _| match x {
            0 => Rgba([0, 0, 0, 0]),
            1 => Rgba([0, 0, 0, 128]),
            _ => Rgba([10, 20, 30, 255]),
        });
        let rgb = composite_on_white(&rgba);

        assert_eq!(*rgb.get_pixel(0, 0), Rgb([255, 255, 255]));
        assert_eq!(*rgb.get_pixel(1, 0), Rgb([127, 127, 127]));
        assert_eq!(*rgb.get_pixel(2, 0), Rgb([10, 20, 30]));
    }

    #[test]
    fn test_normalize_color_models() {
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(2, 2, Luma([90])));
        assert_eq!(*normalize_color(gray).get_pixel(0, 0), Rgb([90, 90, 90]));

        let gray_alpha =
            DynamicImage::ImageLumaA8(GrayAlphaImage::from_pixel(2, 2, LumaA([0, 0])));
        assert_eq!(*normalize_color(gray_alpha).get_pixel(1, 1), Rgb([255, 255, 255]));

        let rgb = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([1, 2, 3])));
        assert_eq!(*normalize_color(rgb).get_pixel(0, 1), Rgb([1, 2, 3]));
    }

    #[test]
    fn test_fit_within_bounds() {
        let bounds = ResizeBounds::new(800, 800);
        assert_eq!(fit_within(4000, 3000, bounds), (800, 600));
        assert_eq!(fit_within(3000, 4000, bounds), (600, 800));
        assert_eq!(fit_within(400, 300, bounds), (400, 300));
        assert_eq!(fit_within(800, 800, bounds), (800, 800));
        // Immagini estremamente strette non scendono sotto 1px
        assert_eq!(fit_within(10000, 1, ResizeBounds::new(100, 100)), (100, 1));
    }

    #[test]
    fn test_resize_shrinks_but_never_upscales() {
        let temp_dir = TempDir::new().unwrap();
        let bounds = ResizeBounds::new(80, 80);

        let large = temp_dir.path().join("large.png");
        gradient(400, 300).save(&large).unwrap();
        let large_out = temp_dir.path().join("large.webp");
        assert!(ConversionPolicy::new()
            .convert(&request(large, large_out.clone(), Some(bounds)))
            .is_success());
        let (w, h, _, _) = decode_webp(&large_out);
        assert_eq!((w, h), (80, 60));

        let small = temp_dir.path().join("small.png");
        gradient(40, 30).save(&small).unwrap();
        let small_out = temp_dir.path().join("small.webp");
        assert!(ConversionPolicy::new()
            .convert(&request(small, small_out.clone(), Some(bounds)))
            .is_success());
        let (w, h, _, _) = decode_webp(&small_out);
        assert_eq!((w, h), (40, 30));
    }

    struct FailingEncoder;

    impl ImageCodec for FailingEncoder {
        fn decode(&self, path: &Path) -> Result<DynamicImage, ConvertError> {
            WebpCodec::new().decode(path)
        }

        fn encode(&self, _image: &RgbImage, _quality: u8) -> Result<Vec<u8>, ConvertError> {
            Err(ConvertError::Encode("encoder exploded".to_string()))
        }

        fn extension(&self) -> &'static str {
            "webp"
        }
    }

    #[test]
    fn test_encode_failure_is_other_and_leaves_no_output() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("ok.png");
        gradient(8, 8).save(&input).unwrap();
        let output = temp_dir.path().join("ok.webp");

        let result = ConversionPolicy::with_codec(FailingEncoder)
            .convert(&request(input, output.clone(), None));

        match result.outcome {
            ConversionOutcome::Failure { kind, message } => {
                assert_eq!(kind, FailureKind::Other);
                assert!(message.contains("encoder exploded"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(!output.exists());
    }
}
