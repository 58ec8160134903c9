// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image loading for detection requests
//!
//! Uploads arrive either as base64 in a JSON body or as raw bytes in a
//! multipart field. Both paths sniff the format from magic bytes rather
//! than trusting a client-supplied extension.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat};
use thiserror::Error;

/// Maximum accepted image size (20MB covers full-resolution CT slices)
pub const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

/// Errors raised while loading an uploaded image
#[derive(Debug, Error)]
pub enum ImageInputError {
    #[error("image data is too large: {0} bytes (max: {1} bytes)")]
    TooLarge(usize, usize),

    #[error("invalid base64 encoding: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("unsupported image format (expected PNG, JPEG, WebP, BMP or TIFF)")]
    UnsupportedFormat,

    #[error("failed to decode image: {0}")]
    DecodeFailed(String),

    #[error("image data is empty")]
    EmptyData,
}

/// Metadata recorded while decoding an upload
#[derive(Debug, Clone)]
pub struct ImageInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Detected format
    pub format: ImageFormat,
    /// Size in bytes before decoding
    pub size_bytes: usize,
}

/// Decode a base64-encoded image from a JSON request body
pub fn decode_base64_image(base64_str: &str) -> Result<(DynamicImage, ImageInfo), ImageInputError> {
    if base64_str.is_empty() {
        return Err(ImageInputError::EmptyData);
    }

    let bytes = STANDARD.decode(base64_str)?;
    decode_image_bytes(&bytes)
}

/// Decode raw image bytes from a multipart upload
pub fn decode_image_bytes(bytes: &[u8]) -> Result<(DynamicImage, ImageInfo), ImageInputError> {
    if bytes.is_empty() {
        return Err(ImageInputError::EmptyData);
    }

    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ImageInputError::TooLarge(bytes.len(), MAX_IMAGE_BYTES));
    }

    let format = detect_format(bytes)?;

    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| ImageInputError::DecodeFailed(e.to_string()))?;

    let info = ImageInfo {
        width: img.width(),
        height: img.height(),
        format,
        size_bytes: bytes.len(),
    };

    Ok((img, info))
}

/// Detect image format from magic bytes
///
/// GIF is deliberately not accepted: scan exports are stills, and animated
/// inputs would silently detect on the first frame only.
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, ImageInputError> {
    if bytes.len() < 4 {
        return Err(ImageInputError::UnsupportedFormat);
    }

    match bytes {
        // PNG: 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => Ok(ImageFormat::Png),

        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Ok(ImageFormat::Jpeg),

        // WebP: RIFF .... WEBP
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Ok(ImageFormat::WebP),

        // BMP: BM
        [0x42, 0x4D, ..] => Ok(ImageFormat::Bmp),

        // TIFF: II (little-endian) or MM (big-endian)
        [0x49, 0x49, 0x2A, 0x00, ..] | [0x4D, 0x4D, 0x00, 0x2A, ..] => Ok(ImageFormat::Tiff),

        _ => Err(ImageInputError::UnsupportedFormat),
    }
}
