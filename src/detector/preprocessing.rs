// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing for the YOLOv8 detector
//!
//! The checkpoint expects a 640x640 NCHW tensor with pixel values scaled
//! to [0, 1]. Input images are letterboxed: scaled with aspect ratio
//! preserved, then padded to square with the YOLO gray value (114).

use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use ndarray::Array4;

/// Pad color used by the ultralytics letterbox convention
const PAD_VALUE: u8 = 114;

/// Geometry of a letterbox operation, kept so detections can be mapped
/// back to source-image coordinates.
#[derive(Debug, Clone, Copy)]
pub struct LetterboxInfo {
    /// Scale factor applied to the source image
    pub scale: f32,
    /// Horizontal padding on the left edge
    pub pad_x: u32,
    /// Vertical padding on the top edge
    pub pad_y: u32,
    /// Source image width
    pub source_width: u32,
    /// Source image height
    pub source_height: u32,
}

impl LetterboxInfo {
    pub fn new(image: &DynamicImage, target_size: u32) -> Self {
        let (src_w, src_h) = image.dimensions();

        if src_w == 0 || src_h == 0 {
            return Self {
                scale: 1.0,
                pad_x: 0,
                pad_y: 0,
                source_width: src_w,
                source_height: src_h,
            };
        }

        let scale = (target_size as f32 / src_w as f32).min(target_size as f32 / src_h as f32);
        let new_w = ((src_w as f32 * scale).round() as u32).max(1);
        let new_h = ((src_h as f32 * scale).round() as u32).max(1);

        Self {
            scale,
            pad_x: (target_size - new_w) / 2,
            pad_y: (target_size - new_h) / 2,
            source_width: src_w,
            source_height: src_h,
        }
    }

    /// Map a coordinate from letterbox space back to the source image
    pub fn to_source(&self, x: f32, y: f32) -> (f32, f32) {
        let src_x = (x - self.pad_x as f32) / self.scale;
        let src_y = (y - self.pad_y as f32) / self.scale;
        (src_x, src_y)
    }
}

/// Resize with aspect ratio preservation and pad to a square
pub fn letterbox(image: &DynamicImage, target_size: u32) -> DynamicImage {
    let (src_w, src_h) = image.dimensions();

    if src_w == 0 || src_h == 0 {
        return DynamicImage::ImageRgb8(RgbImage::from_pixel(
            target_size,
            target_size,
            Rgb([PAD_VALUE; 3]),
        ));
    }

    let info = LetterboxInfo::new(image, target_size);
    let new_w = ((src_w as f32 * info.scale).round() as u32).max(1);
    let new_h = ((src_h as f32 * info.scale).round() as u32).max(1);

    let resized = image.resize_exact(new_w, new_h, image::imageops::FilterType::Triangle);
    let rgb = resized.to_rgb8();

    let mut output = RgbImage::from_pixel(target_size, target_size, Rgb([PAD_VALUE; 3]));
    for y in 0..new_h {
        for x in 0..new_w {
            output.put_pixel(x + info.pad_x, y + info.pad_y, *rgb.get_pixel(x, y));
        }
    }

    DynamicImage::ImageRgb8(output)
}

/// Letterbox an image and convert it to a normalized NCHW tensor
/// of shape [1, 3, target_size, target_size]
pub fn image_to_tensor(image: &DynamicImage, target_size: u32) -> Array4<f32> {
    let boxed = letterbox(image, target_size);
    let rgb = boxed.to_rgb8();
    let size = target_size as usize;

    let mut tensor = Array4::zeros((1, 3, size, size));
    for y in 0..size {
        for x in 0..size {
            let pixel = rgb.get_pixel(x as u32, y as u32);
            for c in 0..3 {
                tensor[[0, c, y, x]] = pixel[c] as f32 / 255.0;
            }
        }
    }

    tensor
}
