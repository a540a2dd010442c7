// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detect response types

use serde::{Deserialize, Serialize};

/// One detected object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Detection {
    /// `[x1, y1, x2, y2]` in source image pixels
    pub bbox: [f32; 4],
    /// Score in `[0, 1]`
    pub confidence: f32,
    /// Class name from the model's label table
    #[serde(rename = "class")]
    pub class_name: String,
}

/// Envelope returned by POST /detect
///
/// Success: `{"success": true, "detections": [...]}`.
/// Failure: `{"success": false, "error": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detections: Option<Vec<Detection>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DetectResponse {
    pub fn success(detections: Vec<Detection>) -> Self {
        Self {
            success: true,
            detections: Some(detections),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            detections: None,
            error: Some(message.into()),
        }
    }
}
