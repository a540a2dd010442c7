// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Data-URL and raster decoding for incoming detection frames

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat};
use thiserror::Error;

/// Default cap on decoded image size (16MB)
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 16 * 1024 * 1024;

/// Errors raised while turning a request payload into pixels
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image data URL has no ',' separator before the payload")]
    MissingSeparator,

    #[error("Image data is too large: {0} bytes (max: {1} bytes)")]
    TooLarge(usize, usize),

    #[error("Invalid base64 encoding: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),

    #[error("Image data is empty")]
    EmptyData,
}

/// Image information extracted during loading
#[derive(Debug, Clone)]
pub struct ImageInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Detected format
    pub format: ImageFormat,
    /// Size of the raw encoded bytes
    pub size_bytes: usize,
}

/// Return the payload part of a `"<header>,<payload>"` data URL.
///
/// Like the browser-facing contract, only the segment after the first comma
/// is used; anything after a second comma is ignored.
pub fn split_data_url(data_url: &str) -> Result<&str, ImageError> {
    data_url
        .split(',')
        .nth(1)
        .ok_or(ImageError::MissingSeparator)
}

/// Decode a `data:image/...;base64,<payload>` string into an image
///
/// # Example
/// ```ignore
/// let (image, info) = decode_data_url_image("data:image/png;base64,iVBORw0KGgo...", 1 << 20)?;
/// println!("Image size: {}x{}", info.width, info.height);
/// ```
pub fn decode_data_url_image(
    data_url: &str,
    max_bytes: usize,
) -> Result<(DynamicImage, ImageInfo), ImageError> {
    let payload = split_data_url(data_url)?;
    decode_base64_image(payload, max_bytes)
}

/// Decode a bare base64-encoded image
pub fn decode_base64_image(
    base64_str: &str,
    max_bytes: usize,
) -> Result<(DynamicImage, ImageInfo), ImageError> {
    if base64_str.is_empty() {
        return Err(ImageError::EmptyData);
    }

    // Reject before allocating when the encoded form alone is over the limit
    let decoded_estimate = base64_str.len() / 4 * 3;
    if decoded_estimate > max_bytes + 3 {
        return Err(ImageError::TooLarge(decoded_estimate, max_bytes));
    }

    let bytes = STANDARD.decode(base64_str)?;
    decode_image_bytes(&bytes, max_bytes)
}

/// Decode raw encoded image bytes
pub fn decode_image_bytes(
    bytes: &[u8],
    max_bytes: usize,
) -> Result<(DynamicImage, ImageInfo), ImageError> {
    if bytes.len() > max_bytes {
        return Err(ImageError::TooLarge(bytes.len(), max_bytes));
    }

    if bytes.is_empty() {
        return Err(ImageError::EmptyData);
    }

    let format = detect_format(bytes)?;

    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| ImageError::DecodeFailed(e.to_string()))?;

    let info = ImageInfo {
        width: img.width(),
        height: img.height(),
        format,
        size_bytes: bytes.len(),
    };

    Ok((img, info))
}

/// Detect image format from magic bytes
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, ImageError> {
    if bytes.len() < 4 {
        return Err(ImageError::UnsupportedFormat);
    }

    match bytes {
        // PNG: 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => Ok(ImageFormat::Png),

        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Ok(ImageFormat::Jpeg),

        // WebP: RIFF .... WEBP
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Ok(ImageFormat::WebP),

        // GIF87a / GIF89a
        [0x47, 0x49, 0x46, 0x38, x, ..] if *x == 0x37 || *x == 0x39 => Ok(ImageFormat::Gif),

        // BMP: BM
        [0x42, 0x4D, ..] => Ok(ImageFormat::Bmp),

        // TIFF, either byte order
        [0x49, 0x49, 0x2A, 0x00, ..] | [0x4D, 0x4D, 0x00, 0x2A, ..] => Ok(ImageFormat::Tiff),

        _ => Err(ImageError::UnsupportedFormat),
    }
}
