// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection engine interface
//!
//! The HTTP layer only knows this trait: given decoded pixels, return boxes
//! with class indices, plus the table that names those indices. The ONNX
//! implementation lives in [`crate::vision::yolo`].

use anyhow::Result;
use image::DynamicImage;

use super::labels::ClassLabels;

/// A single detection in original image pixel space
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    /// `[x1, y1, x2, y2]` with `x1 <= x2` and `y1 <= y2`
    pub bbox: [f32; 4],
    /// Score in `[0, 1]`
    pub confidence: f32,
    /// Index into the detector's [`ClassLabels`]
    pub class_id: usize,
}

/// A loaded object-detection model
///
/// Implementations are shared across request handlers, so `detect` takes
/// `&self` and any interior state must be synchronized by the implementor.
pub trait ObjectDetector: Send + Sync {
    /// Run detection on one image
    fn detect(&self, image: &DynamicImage) -> Result<Vec<RawDetection>>;

    /// Class-index to class-name table
    fn labels(&self) -> &ClassLabels;

    /// Human readable model name for logs and `/health`
    fn name(&self) -> &str {
        "object-detector"
    }
}
