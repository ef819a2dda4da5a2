//! Cover image compression.
//!
//! Decodes an uploaded image, shrinks it so the longest side fits
//! `max_size`, and re-encodes it. The transform is lossy and one-way; only
//! the re-encoded bytes are kept.

use crate::error::Result;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// Output encoding for compressed images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MimeType {
    /// `image/jpeg`, lossy, honours `quality`.
    #[default]
    Jpeg,
    /// `image/png`, lossless, ignores `quality`.
    Png,
}

impl MimeType {
    /// The MIME type string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    /// Conventional file extension.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }
}

/// Compression settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressOptions {
    /// Longest side of the output, in pixels.
    pub max_size: u32,
    /// Encoder quality in `0.0..=1.0`.
    pub quality: f32,
    /// Output encoding.
    pub mime_type: MimeType,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self { max_size: 1280, quality: 0.8, mime_type: MimeType::Jpeg }
    }
}

/// `min(1, max_size / max(width, height))`.
#[must_use]
pub fn scale_factor(width: u32, height: u32, max_size: u32) -> f64 {
    let long_side = width.max(height);
    if long_side == 0 {
        return 1.0;
    }
    (f64::from(max_size) / f64::from(long_side)).min(1.0)
}

/// Output dimensions for an image of `width` x `height`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn target_dimensions(width: u32, height: u32, max_size: u32) -> (u32, u32) {
    let scale = scale_factor(width, height, max_size);
    if scale >= 1.0 {
        return (width, height);
    }
    let scaled = |side: u32| ((f64::from(side) * scale).round() as u32).max(1);
    (scaled(width), scaled(height))
}

/// Map a `0.0..=1.0` quality to the JPEG encoder's `1..=100`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn jpeg_quality(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Decode `input`, resize it to fit `options.max_size` and re-encode it.
///
/// # Errors
///
/// Returns [`crate::error::Error::Image`] if the input cannot be decoded or
/// the output cannot be encoded.
pub fn compress(input: &[u8], options: &CompressOptions) -> Result<Vec<u8>> {
    let decoded = image::load_from_memory(input)?;
    let (width, height) = target_dimensions(decoded.width(), decoded.height(), options.max_size);
    let resized = if (width, height) == (decoded.width(), decoded.height()) {
        decoded
    } else {
        decoded.resize_exact(width, height, FilterType::Triangle)
    };

    let mut out = Vec::new();
    match options.mime_type {
        MimeType::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());
            let encoder = JpegEncoder::new_with_quality(&mut out, jpeg_quality(options.quality));
            rgb.write_with_encoder(encoder)?;
        }
        MimeType::Png => {
            resized.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)?;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 40, 40]));
        let mut out = Vec::new();
        DynamicImage::ImageRgb8(img).write_to(&mut Cursor::new(&mut out), ImageFormat::Png).unwrap();
        out
    }

    #[test]
    fn test_scale_factor() {
        assert!((scale_factor(3200, 1600, 1600) - 0.5).abs() < f64::EPSILON);
        assert!((scale_factor(100, 50, 1600) - 1.0).abs() < f64::EPSILON);
        assert!((scale_factor(0, 0, 1600) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_target_dimensions_round_and_never_upscale() {
        assert_eq!(target_dimensions(3000, 2000, 1600), (1600, 1067));
        assert_eq!(target_dimensions(2000, 3000, 1600), (1067, 1600));
        assert_eq!(target_dimensions(800, 600, 1600), (800, 600));
        assert_eq!(target_dimensions(5000, 1, 100), (100, 1));
    }

    #[test]
    fn test_jpeg_quality_mapping() {
        assert_eq!(jpeg_quality(0.85), 85);
        assert_eq!(jpeg_quality(0.0), 1);
        assert_eq!(jpeg_quality(2.0), 100);
    }

    #[test]
    fn test_compress_large_png_to_jpeg() {
        let input = png_bytes(400, 200);
        let opts = CompressOptions { max_size: 100, quality: 0.8, mime_type: MimeType::Jpeg };

        let out = compress(&input, &opts).unwrap();

        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (100, 50));
    }

    #[test]
    fn test_compress_small_image_keeps_size() {
        let input = png_bytes(40, 30);
        let out = compress(&input, &CompressOptions::default()).unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 30));
    }

    #[test]
    fn test_compress_to_png_keeps_alpha() {
        let img = RgbaImage::from_pixel(64, 64, Rgba([0, 0, 255, 128]));
        let mut input = Vec::new();
        DynamicImage::ImageRgba8(img).write_to(&mut Cursor::new(&mut input), ImageFormat::Png).unwrap();

        let opts = CompressOptions { max_size: 32, quality: 0.5, mime_type: MimeType::Png };
        let out = compress(&input, &opts).unwrap();

        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 32));
        assert!(decoded.color().has_alpha());
    }

    #[test]
    fn test_compress_rejects_garbage() {
        let err = compress(b"definitely not an image", &CompressOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Image(_)));
    }

    #[test]
    fn test_mime_type_strings() {
        assert_eq!(MimeType::Jpeg.as_str(), "image/jpeg");
        assert_eq!(MimeType::Png.extension(), "png");
        assert_eq!(serde_yaml::to_string(&MimeType::Png).unwrap().trim(), "png");
    }
}
