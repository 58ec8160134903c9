// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection endpoint error paths (no model loaded)

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tower::util::ServiceExt;

use stonescan_node::api::{build_router, ApiConfig, AppState, ErrorResponse};
use stonescan_node::cli::Cli;
use stonescan_node::config::ServerConfig;
use stonescan_node::detector::DetectorManager;

// 1x1 red PNG image (base64)
const TINY_PNG_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

fn state_without_model() -> AppState {
    let cli = Cli::try_parse_from(["stonescan-node"]).unwrap();
    let mut config = ServerConfig::from_cli(&cli);
    config.model_path = PathBuf::from("/nonexistent/best.onnx");

    AppState {
        config: Arc::new(ApiConfig::default()),
        detector_manager: Arc::new(DetectorManager::unavailable(&config)),
        started_at: chrono::Utc::now(),
    }
}

async fn post_detect(body: String) -> (StatusCode, ErrorResponse) {
    let app = build_router(state_without_model());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/detect")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let error: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
    (status, error)
}

#[tokio::test]
async fn test_detect_without_model_returns_503() {
    let body = format!(r#"{{"image": "{}"}}"#, TINY_PNG_BASE64);
    let (status, error) = post_detect(body).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(error.error_type, "detector_unavailable");
}

#[tokio::test]
async fn test_detect_missing_image_returns_400() {
    let (status, error) = post_detect("{}".to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error.error_type, "validation_error");
    let details = error.details.expect("details expected");
    assert_eq!(details["field"], serde_json::json!("image"));
}

#[tokio::test]
async fn test_detect_bad_threshold_returns_400() {
    let body = format!(
        r#"{{"image": "{}", "confidenceThreshold": 7.5}}"#,
        TINY_PNG_BASE64
    );
    let (status, error) = post_detect(body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error.error_type, "validation_error");
}

#[tokio::test]
async fn test_upload_without_model_returns_503() {
    let app = build_router(state_without_model());

    // Minimal multipart body with a single image field
    let boundary = "XBOUNDARYX";
    let body = format!(
        "--{b}\r\ncontent-disposition: form-data; name=\"image\"; filename=\"scan.png\"\r\ncontent-type: image/png\r\n\r\nfake\r\n--{b}--\r\n",
        b = boundary
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/detect/upload")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", boundary),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
