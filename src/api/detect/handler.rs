// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detect endpoint handler

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    Json,
};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::request::DetectRequest;
use super::response::{DetectResponse, Detection};
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::vision::{decode_data_url_image, ObjectDetector, RawDetection};

/// POST /detect - Detect objects in a data-URL image
///
/// # Request
/// - `image`: `"<header>,<base64-payload>"` data URL (required)
///
/// # Response
/// - `success`: always present
/// - `detections`: `[{ "bbox": [x1, y1, x2, y2], "confidence": f, "class": s }]`
/// - `error`: failure message when `success` is false
///
/// # Errors
/// Status depends on the configured policy: `legacy` reports every failure
/// as 500; `strict` reports bad input as 400 (413 for an oversized body) and
/// engine faults as 500. Body read failures use the same JSON envelope.
///
/// The detection toggle is not consulted; detection always runs.
pub async fn detect_handler(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<DetectResponse>, (StatusCode, Json<DetectResponse>)> {
    let started = Instant::now();

    let result = match body {
        Ok(body) => run_detection(&state, &body).await,
        Err(rejection) => Err(ApiError::from(rejection)),
    };

    match result {
        Ok(detections) => {
            info!(
                "Detection complete: {} objects, {}ms",
                detections.len(),
                started.elapsed().as_millis()
            );
            Ok(Json(DetectResponse::success(detections)))
        }
        Err(e) => {
            if e.is_client_error() {
                warn!("Detect request rejected ({}): {}", e.kind(), e);
            } else {
                error!("Detect request failed ({}): {}", e.kind(), e);
            }

            let status = StatusCode::from_u16(e.status_code(state.error_status))
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            Err((status, Json(DetectResponse::failure(e.to_string()))))
        }
    }
}

/// Parse, decode and run inference; decoding and inference run on the
/// blocking pool
async fn run_detection(state: &AppState, body: &[u8]) -> Result<Vec<Detection>, ApiError> {
    let request = DetectRequest::from_body(body)?;

    let detector = state.detector.clone();
    let max_bytes = state.max_image_bytes;

    tokio::task::spawn_blocking(move || -> Result<Vec<Detection>, ApiError> {
        let (image, info) = decode_data_url_image(request.image(), max_bytes)?;
        debug!(
            "Decoded image: {}x{} {:?}, {} bytes",
            info.width, info.height, info.format, info.size_bytes
        );

        let image = image::DynamicImage::ImageRgb8(image.to_rgb8());
        let raw = detector
            .detect(&image)
            .map_err(|e| ApiError::InferenceFailed(format!("{:#}", e)))?;

        label_detections(detector.as_ref(), raw)
    })
    .await
    .map_err(|e| ApiError::InternalError(format!("Detection task failed: {}", e)))?
}

/// Map engine class indices to names
pub fn label_detections(
    detector: &dyn ObjectDetector,
    raw: Vec<RawDetection>,
) -> Result<Vec<Detection>, ApiError> {
    let labels = detector.labels();

    raw.into_iter()
        .map(|d| {
            let class_name = labels.get(d.class_id).ok_or_else(|| {
                ApiError::InferenceFailed(format!(
                    "class index {} outside label table of {} classes",
                    d.class_id,
                    labels.len()
                ))
            })?;

            Ok(Detection {
                bbox: d.bbox,
                confidence: d.confidence,
                class_name: class_name.to_string(),
            })
        })
        .collect()
}
