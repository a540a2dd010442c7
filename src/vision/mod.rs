// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing: frame decoding and object detection
//!
//! This module provides:
//! - Data-URL / base64 image decoding
//! - The `ObjectDetector` seam used by the HTTP layer
//! - A YOLOv8 ONNX implementation running on CPU

pub mod detector;
pub mod image_utils;
pub mod labels;
pub mod yolo;

pub use detector::{ObjectDetector, RawDetection};
pub use image_utils::{
    decode_base64_image, decode_data_url_image, decode_image_bytes, detect_format,
    split_data_url, ImageError, ImageInfo, DEFAULT_MAX_IMAGE_BYTES,
};
pub use labels::ClassLabels;
pub use yolo::YoloDetector;
