// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Detect endpoint tests for POST /detect
//!
//! The detection engine is mocked, so these cover request parsing, image
//! decoding, label mapping, the response envelope and status policy.

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{Request, StatusCode},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use detect_node::{
    api::detect_handler,
    config::{ErrorStatusPolicy, ServerConfig},
    vision::RawDetection,
};
use serde_json::json;

use super::common::*;

fn strict_config() -> ServerConfig {
    ServerConfig {
        error_status: ErrorStatusPolicy::Strict,
        ..Default::default()
    }
}

fn image_body(image: &str) -> String {
    json!({ "image": image }).to_string()
}

// =============================================================================
// Success path
// =============================================================================

#[tokio::test]
async fn test_image_without_objects_returns_empty_detections() {
    let (router, _) = router_with(detector_returning(vec![]), &ServerConfig::default());

    let (status, body) = post_json(&router, "/detect", image_body(&png_data_url())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "detections": [] }));
}

#[tokio::test]
async fn test_detections_are_labelled() {
    let detector = detector_returning(vec![
        RawDetection {
            bbox: [10.0, 20.0, 110.0, 220.0],
            confidence: 0.91,
            class_id: 0,
        },
        RawDetection {
            bbox: [0.0, 0.0, 5.5, 6.5],
            confidence: 0.4,
            class_id: 1,
        },
    ]);
    let (router, _) = router_with(detector, &ServerConfig::default());

    let (status, body) = post_json(&router, "/detect", image_body(&png_data_url())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let detections = body["detections"].as_array().unwrap();
    assert_eq!(detections.len(), 2);

    assert_eq!(detections[0]["class"], "manggis");
    assert_eq!(detections[0]["bbox"], json!([10.0, 20.0, 110.0, 220.0]));
    assert!((detections[0]["confidence"].as_f64().unwrap() - 0.91).abs() < 1e-6);

    assert_eq!(detections[1]["class"], "daun");
    assert_eq!(detections[1]["bbox"], json!([0.0, 0.0, 5.5, 6.5]));
}

#[tokio::test]
async fn test_detection_fields_are_well_formed() {
    let detector = detector_returning(vec![RawDetection {
        bbox: [1.0, 2.0, 3.0, 4.0],
        confidence: 0.5,
        class_id: 0,
    }]);
    let (router, _) = router_with(detector, &ServerConfig::default());

    let (_, body) = post_json(&router, "/detect", image_body(&png_data_url())).await;

    let labels = test_labels();
    for detection in body["detections"].as_array().unwrap() {
        let confidence = detection["confidence"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&confidence));

        let bbox: Vec<f64> = detection["bbox"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_f64().unwrap())
            .collect();
        assert!(bbox[0] <= bbox[2] && bbox[1] <= bbox[3]);

        let class = detection["class"].as_str().unwrap();
        assert!(!class.is_empty());
        assert!(labels.names().iter().any(|n| n == class));
    }
}

#[tokio::test]
async fn test_detection_runs_while_flag_is_off() {
    let mut detector = MockDetector::new();
    detector.expect_labels().return_const(test_labels());
    detector.expect_detect().times(1).returning(|_| Ok(vec![]));
    let (router, state) = router_with(detector, &ServerConfig::default());

    assert!(!state.detection_enabled());
    let (status, body) = post_json(&router, "/detect", image_body(&png_data_url())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_engine_receives_decoded_pixels() {
    let mut detector = MockDetector::new();
    detector.expect_labels().return_const(test_labels());
    detector
        .expect_detect()
        .withf(|image| image.width() == 1 && image.height() == 1)
        .returning(|_| Ok(vec![]));
    let (router, _) = router_with(detector, &ServerConfig::default());

    let (status, _) = post_json(&router, "/detect", image_body(&png_data_url())).await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// Failure envelope (legacy policy: everything is 500)
// =============================================================================

#[tokio::test]
async fn test_missing_image_key_is_500() {
    let (router, _) = router_with(detector_not_called(), &ServerConfig::default());

    let (status, body) = post_json(&router, "/detect", r#"{"picture": "x"}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("image"));
    assert!(body.get("detections").is_none());
}

#[tokio::test]
async fn test_not_a_data_url_is_500() {
    let (router, _) = router_with(detector_not_called(), &ServerConfig::default());

    let (status, body) = post_json(&router, "/detect", image_body("not-a-data-url")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn test_malformed_base64_is_500() {
    let (router, _) = router_with(detector_not_called(), &ServerConfig::default());

    for payload in ["data:image/png;base64,!!!!", "data:image/png;base64,abc", "x,%%%"] {
        let (status, body) = post_json(&router, "/detect", image_body(payload)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "payload {}", payload);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("base64"));
    }
}

#[tokio::test]
async fn test_bytes_that_are_not_an_image_are_500() {
    let (router, _) = router_with(detector_not_called(), &ServerConfig::default());
    let payload = format!("data:image/png;base64,{}", STANDARD.encode(b"hello world"));

    let (status, body) = post_json(&router, "/detect", image_body(&payload)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("Invalid image"));
}

#[tokio::test]
async fn test_malformed_json_gets_json_envelope() {
    let (router, _) = router_with(detector_not_called(), &ServerConfig::default());

    let (status, body) = post_json(&router, "/detect", "{ this is not json").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("Invalid request"));
}

#[tokio::test]
async fn test_engine_failure_is_500() {
    let mut detector = MockDetector::new();
    detector.expect_labels().return_const(test_labels());
    detector
        .expect_detect()
        .returning(|_| Err(anyhow::anyhow!("input tensor rejected")));
    let (router, _) = router_with(detector, &ServerConfig::default());

    let (status, body) = post_json(&router, "/detect", image_body(&png_data_url())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("input tensor rejected"));
}

#[tokio::test]
async fn test_unknown_class_index_is_500_without_partial_results() {
    let detector = detector_returning(vec![
        RawDetection {
            bbox: [0.0, 0.0, 1.0, 1.0],
            confidence: 0.9,
            class_id: 0,
        },
        RawDetection {
            bbox: [0.0, 0.0, 1.0, 1.0],
            confidence: 0.8,
            class_id: 7,
        },
    ]);
    let (router, _) = router_with(detector, &strict_config());

    let (status, body) = post_json(&router, "/detect", image_body(&png_data_url())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(body.get("detections").is_none());
}

// =============================================================================
// Strict policy: client errors are 400
// =============================================================================

#[tokio::test]
async fn test_strict_missing_image_is_400() {
    let (router, _) = router_with(detector_not_called(), &strict_config());

    let (status, body) = post_json(&router, "/detect", "{}").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_strict_bad_payloads_are_400() {
    let (router, _) = router_with(detector_not_called(), &strict_config());

    for body in [
        "not json".to_string(),
        image_body("not-a-data-url"),
        image_body("data:image/png;base64,!!!!"),
        image_body("data:image/png;base64,"),
    ] {
        let (status, response) = post_json(&router, "/detect", body.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {}", body);
        assert_eq!(response["success"], false);
    }
}

#[tokio::test]
async fn test_strict_engine_failure_is_500() {
    let mut detector = MockDetector::new();
    detector.expect_labels().return_const(test_labels());
    detector
        .expect_detect()
        .returning(|_| Err(anyhow::anyhow!("session crashed")));
    let (router, _) = router_with(detector, &strict_config());

    let (status, _) = post_json(&router, "/detect", image_body(&png_data_url())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

// =============================================================================
// Transport
// =============================================================================

fn oversized_request() -> Request<Body> {
    let huge = format!("data:image/png;base64,{}", "A".repeat(200 * 1024));
    Request::builder()
        .method("POST")
        .uri("/detect")
        .header("content-type", "application/json")
        .body(Body::from(image_body(&huge)))
        .unwrap()
}

#[tokio::test]
async fn test_oversized_body_gets_json_envelope() {
    let config = ServerConfig {
        max_body_bytes: 1024,
        ..Default::default()
    };
    let (router, _) = router_with(detector_not_called(), &config);

    let (status, bytes) = send(&router, oversized_request()).await;
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("Payload too large"));
}

#[tokio::test]
async fn test_strict_oversized_body_is_413() {
    let config = ServerConfig {
        max_body_bytes: 1024,
        error_status: ErrorStatusPolicy::Strict,
        ..Default::default()
    };
    let (router, _) = router_with(detector_not_called(), &config);

    let (status, bytes) = send(&router, oversized_request()).await;
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_get_detect_not_allowed() {
    let (router, _) = router_with(detector_not_called(), &ServerConfig::default());

    let request = Request::builder().uri("/detect").body(Body::empty()).unwrap();
    let (status, _) = send(&router, request).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let (router, _) = router_with(detector_returning(vec![]), &ServerConfig::default());

    let request = Request::builder()
        .method("POST")
        .uri("/detect")
        .header("origin", "http://example.com")
        .header("content-type", "application/json")
        .body(Body::from(image_body(&png_data_url())))
        .unwrap();

    let response = tower::ServiceExt::oneshot(router, request).await.unwrap();
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}

// =============================================================================
// Handler called directly
// =============================================================================

#[tokio::test]
async fn test_handler_direct_failure() {
    let state = state_with(detector_not_called(), &ServerConfig::default());

    let result = detect_handler(State(state), Ok(Bytes::from_static(b"{}"))).await;

    let (status, response) = result.unwrap_err();
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!response.0.success);
    assert!(response.0.error.unwrap().contains("image is required"));
}

#[tokio::test]
async fn test_handler_direct_success() {
    let state = state_with(detector_returning(vec![]), &ServerConfig::default());
    let body = Bytes::from(image_body(&png_data_url()));

    let response = detect_handler(State(state), Ok(body)).await.unwrap();

    assert!(response.0.success);
    assert_eq!(response.0.detections, Some(vec![]));
}
