// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detect request parsing and validation

use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;

/// Request for object detection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectRequest {
    /// Data URL of the form `"<header>,<base64-payload>"`
    #[serde(default)]
    pub image: Option<String>,
}

impl DetectRequest {
    /// Parse a raw request body
    ///
    /// The body is parsed here rather than by the `Json` extractor so that
    /// malformed JSON produces the same `{"success": false, ...}` envelope
    /// as every other failure.
    pub fn from_body(body: &[u8]) -> Result<Self, ApiError> {
        let request: Self = serde_json::from_slice(body)
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        request.validate()?;
        Ok(request)
    }

    /// Validate the detect request
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.image.is_none() {
            return Err(ApiError::ValidationError {
                field: "image".to_string(),
                message: "image is required".to_string(),
            });
        }
        Ok(())
    }

    /// The data URL; empty when absent (call `validate` first)
    pub fn image(&self) -> &str {
        self.image.as_deref().unwrap_or_default()
    }
}
