//! Resize and re-encode an uploaded photo so it fits a byte budget.
//!
//! The output is always JPEG. When the first encode is over budget the quality
//! is stepped down until the image fits or the quality floor is reached, so the
//! number of encodes is bounded by `(quality - floor) / step + 1`.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ImageError, RgbImage};
use thiserror::Error;

use super::data_url::to_data_url;

pub const ACCEPTED_MIME_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// Hard cap on the raw upload, checked before any decoding.
pub const MAX_INPUT_BYTES: usize = 10 * 1024 * 1024;

/// Quality is handled in whole percent to keep the back-off exact.
const QUALITY_FLOOR_PERCENT: u8 = 50;
const QUALITY_STEP_PERCENT: u8 = 10;

pub const OUTPUT_MIME: &str = "image/jpeg";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizeOptions {
    pub max_width: u32,
    pub max_height: u32,
    /// JPEG quality in `0.0..=1.0`.
    pub quality: f32,
    pub max_size_kb: u32,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            max_width: 1024,
            max_height: 1024,
            quality: 0.85,
            max_size_kb: 1024,
        }
    }
}

#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("Formato de arquivo inválido ({0}). Use JPEG, PNG ou WebP.")]
    InvalidFormat(String),
    #[error("Arquivo muito grande: {size} bytes (máximo {max} bytes).")]
    TooLarge { size: usize, max: usize },
    #[error("failed to read image: {0}")]
    Read(String),
    #[error("failed to decode image: {0}")]
    Decode(String),
    #[error("failed to encode image: {0}")]
    Encode(String),
}

impl OptimizeError {
    /// Whether the caller sent something unusable, as opposed to an encoder fault.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, OptimizeError::Encode(_))
    }
}

#[derive(Debug, Clone)]
pub struct OptimizedImage {
    pub bytes: Bytes,
    pub width: u32,
    pub height: u32,
    pub quality: f32,
}

impl OptimizedImage {
    pub fn size_kb(&self) -> f64 {
        self.bytes.len() as f64 / 1024.0
    }

    pub fn mime(&self) -> &'static str {
        OUTPUT_MIME
    }

    pub fn to_data_url(&self) -> String {
        to_data_url(OUTPUT_MIME, &self.bytes)
    }
}

/// Fast-fail checks on the declared type and raw size.
pub fn validate(mime: &str, size: usize) -> Result<(), OptimizeError> {
    let mime = mime.trim().to_ascii_lowercase();
    if !ACCEPTED_MIME_TYPES.contains(&mime.as_str()) {
        return Err(OptimizeError::InvalidFormat(mime));
    }
    if size > MAX_INPUT_BYTES {
        return Err(OptimizeError::TooLarge {
            size,
            max: MAX_INPUT_BYTES,
        });
    }
    Ok(())
}

/// Dimensions that fit `source` inside `max` with the aspect ratio preserved.
///
/// Images already inside the box are returned unchanged; images are never upscaled.
pub fn fit_within(source: (u32, u32), max: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = (max.0.max(1), max.1.max(1));
    if src_w <= max_w && src_h <= max_h {
        return source;
    }

    let scale = (max_w as f64 / src_w as f64).min(max_h as f64 / src_h as f64);
    let w = ((src_w as f64 * scale).round() as u32).clamp(1, max_w);
    let h = ((src_h as f64 * scale).round() as u32).clamp(1, max_h);
    (w, h)
}

pub fn optimize(
    raw: &[u8],
    mime: &str,
    opts: &OptimizeOptions,
) -> Result<OptimizedImage, OptimizeError> {
    validate(mime, raw.len())?;

    let decoded = image::load_from_memory(raw).map_err(map_load_error)?;
    let source = (decoded.width(), decoded.height());
    let (width, height) = fit_within(source, (opts.max_width, opts.max_height));
    let resized = if (width, height) == source {
        decoded
    } else {
        decoded.resize_exact(width, height, FilterType::Lanczos3)
    };
    let rgb = resized.to_rgb8();

    let budget_kb = opts.max_size_kb as f64;
    let mut quality = quality_percent(opts.quality);
    loop {
        let encoded = encode_jpeg(&rgb, quality)?;
        let size_kb = encoded.len() as f64 / 1024.0;
        if size_kb <= budget_kb || quality <= QUALITY_FLOOR_PERCENT {
            tracing::debug!(width, height, quality, size_kb, "image optimized");
            return Ok(OptimizedImage {
                bytes: Bytes::from(encoded),
                width,
                height,
                quality: f32::from(quality) / 100.0,
            });
        }
        quality = quality
            .saturating_sub(QUALITY_STEP_PERCENT)
            .max(QUALITY_FLOOR_PERCENT);
    }
}

fn quality_percent(quality: f32) -> u8 {
    if quality.is_nan() {
        return QUALITY_FLOOR_PERCENT;
    }
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

fn encode_jpeg(rgb: &RgbImage, quality: u8) -> Result<Vec<u8>, OptimizeError> {
    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode_image(rgb)
        .map_err(|e| OptimizeError::Encode(e.to_string()))?;
    Ok(out.into_inner())
}

fn map_load_error(e: ImageError) -> OptimizeError {
    match e {
        ImageError::IoError(io) => OptimizeError::Read(io.to_string()),
        other => OptimizeError::Decode(other.to_string()),
    }
}
