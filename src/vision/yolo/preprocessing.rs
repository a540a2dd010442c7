// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Letterbox preprocessing for YOLO-style detectors

use image::{imageops::FilterType, DynamicImage, GenericImageView, Rgb, RgbImage};
use ndarray::Array4;

/// Default square input size for YOLOv8 exports
pub const DEFAULT_INPUT_SIZE: u32 = 640;

/// Padding color used by the Ultralytics letterbox
pub const PAD_VALUE: u8 = 114;

/// Scale and offsets applied by [`letterbox`]
///
/// Used to map boxes predicted in model space back to the source image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterboxInfo {
    /// Scale factor applied to both axes
    pub scale: f32,
    /// Horizontal padding on the left
    pub pad_x: f32,
    /// Vertical padding on the top
    pub pad_y: f32,
    /// Source image width
    pub original_width: u32,
    /// Source image height
    pub original_height: u32,
}

impl LetterboxInfo {
    /// Calculate the letterbox transform for an image of the given size
    pub fn new(width: u32, height: u32, target_size: u32) -> Self {
        if width == 0 || height == 0 {
            return Self {
                scale: 1.0,
                pad_x: 0.0,
                pad_y: 0.0,
                original_width: width,
                original_height: height,
            };
        }

        let scale = (target_size as f32 / width as f32).min(target_size as f32 / height as f32);
        let (new_w, new_h) = scaled_dims(width, height, scale);

        Self {
            scale,
            pad_x: ((target_size - new_w) / 2) as f32,
            pad_y: ((target_size - new_h) / 2) as f32,
            original_width: width,
            original_height: height,
        }
    }

    /// Map an `[x1, y1, x2, y2]` box from model space to source image space,
    /// clipped to the image bounds
    pub fn map_box(&self, bbox: [f32; 4]) -> [f32; 4] {
        let max_x = self.original_width as f32;
        let max_y = self.original_height as f32;
        let unpad_x = |x: f32| ((x - self.pad_x) / self.scale).clamp(0.0, max_x);
        let unpad_y = |y: f32| ((y - self.pad_y) / self.scale).clamp(0.0, max_y);

        [
            unpad_x(bbox[0]),
            unpad_y(bbox[1]),
            unpad_x(bbox[2]),
            unpad_y(bbox[3]),
        ]
    }
}

fn scaled_dims(width: u32, height: u32, scale: f32) -> (u32, u32) {
    let new_w = ((width as f32 * scale).round() as u32).max(1);
    let new_h = ((height as f32 * scale).round() as u32).max(1);
    (new_w, new_h)
}

/// Resize preserving aspect ratio and pad to `target_size` x `target_size`
///
/// The resized image is centred on a gray (114) canvas.
pub fn letterbox(image: &DynamicImage, target_size: u32) -> (RgbImage, LetterboxInfo) {
    let (orig_w, orig_h) = image.dimensions();
    let info = LetterboxInfo::new(orig_w, orig_h, target_size);

    let mut output = RgbImage::from_pixel(
        target_size,
        target_size,
        Rgb([PAD_VALUE, PAD_VALUE, PAD_VALUE]),
    );

    if orig_w == 0 || orig_h == 0 {
        return (output, info);
    }

    let (new_w, new_h) = scaled_dims(orig_w, orig_h, info.scale);
    let resized = image
        .resize_exact(new_w, new_h, FilterType::Triangle)
        .to_rgb8();

    image::imageops::replace(
        &mut output,
        &resized,
        info.pad_x as i64,
        info.pad_y as i64,
    );

    (output, info)
}

/// Preprocess an image into a `[1, 3, S, S]` tensor scaled to `[0, 1]`
pub fn preprocess(image: &DynamicImage, target_size: u32) -> (Array4<f32>, LetterboxInfo) {
    let (canvas, info) = letterbox(image, target_size);
    let size = target_size as usize;

    let mut tensor = Array4::zeros((1, 3, size, size));
    for (x, y, pixel) in canvas.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
        }
    }

    (tensor, info)
}
