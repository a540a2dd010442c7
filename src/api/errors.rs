// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{extract::rejection::BytesRejection, http::StatusCode};
use std::fmt;

use crate::config::ErrorStatusPolicy;
use crate::vision::ImageError;

/// Failure kinds surfaced by the HTTP handlers
///
/// The first four are caused by client input; the rest are server faults.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Body is not valid JSON or has the wrong shape
    InvalidRequest(String),
    ValidationError {
        field: String,
        message: String,
    },
    /// Payload could not be turned into pixels
    InvalidImage(String),
    /// Body exceeded the configured limit
    PayloadTooLarge(String),
    /// The detection engine raised or returned something unusable
    InferenceFailed(String),
    InternalError(String),
}

impl ApiError {
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ApiError::InvalidRequest(_)
                | ApiError::ValidationError { .. }
                | ApiError::InvalidImage(_)
                | ApiError::PayloadTooLarge(_)
        )
    }

    /// Short machine-readable kind, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::InvalidRequest(_) => "invalid_request",
            ApiError::ValidationError { .. } => "validation_error",
            ApiError::InvalidImage(_) => "invalid_image",
            ApiError::PayloadTooLarge(_) => "payload_too_large",
            ApiError::InferenceFailed(_) => "inference_failed",
            ApiError::InternalError(_) => "internal_error",
        }
    }

    pub fn status_code(&self, policy: ErrorStatusPolicy) -> u16 {
        match policy {
            ErrorStatusPolicy::Legacy => 500,
            ErrorStatusPolicy::Strict if matches!(self, ApiError::PayloadTooLarge(_)) => 413,
            ErrorStatusPolicy::Strict if self.is_client_error() => 400,
            ErrorStatusPolicy::Strict => 500,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::ValidationError { field, message } => {
                write!(f, "Validation error for {}: {}", field, message)
            }
            ApiError::InvalidImage(msg) => write!(f, "Invalid image: {}", msg),
            ApiError::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            ApiError::InferenceFailed(msg) => write!(f, "Inference failed: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<ImageError> for ApiError {
    fn from(err: ImageError) -> Self {
        ApiError::InvalidImage(err.to_string())
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(rejection.body_text())
        } else {
            ApiError::InvalidRequest(rejection.body_text())
        }
    }
}
