// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLOv8 object detection via ONNX Runtime
//!
//! Components:
//! - `preprocessing` - letterbox resize and tensor layout
//! - `postprocess` - head decoding and non-max suppression
//! - `model` - session loading and the `ObjectDetector` implementation

pub mod model;
pub mod postprocess;
pub mod preprocessing;

pub use model::YoloDetector;
pub use postprocess::{Candidate, Thresholds};
pub use preprocessing::{LetterboxInfo, DEFAULT_INPUT_SIZE};
