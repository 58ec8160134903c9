// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Status endpoint reporting

use axum::body::Body;
use axum::http::{Request, StatusCode};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tower::util::ServiceExt;

use stonescan_node::api::{build_router, ApiConfig, AppState, StatusResponse};
use stonescan_node::cli::Cli;
use stonescan_node::config::ServerConfig;
use stonescan_node::detector::DetectorManager;

fn state_without_model(debug: bool) -> AppState {
    let cli = Cli::try_parse_from(["stonescan-node"]).unwrap();
    let mut config = ServerConfig::from_cli(&cli);
    config.model_path = PathBuf::from("/nonexistent/best.onnx");

    AppState {
        config: Arc::new(ApiConfig {
            enable_error_details: debug,
            ..ApiConfig::default()
        }),
        detector_manager: Arc::new(DetectorManager::unavailable(&config)),
        started_at: chrono::Utc::now(),
    }
}

async fn get_status(debug: bool) -> StatusResponse {
    let app = build_router(state_without_model(debug));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_status_reports_model_unavailable() {
    let status = get_status(false).await;

    assert_eq!(status.service, "stonescan-node");
    assert!(!status.model.available);
    assert!(status.model.sha256.is_none());
    assert_eq!(status.model.labels, vec!["kidney-stone".to_string()]);
    assert_eq!(status.model.input_size, 640);
}

#[tokio::test]
async fn test_status_reflects_debug_mode() {
    let status = get_status(true).await;
    assert!(status.debug);

    let status = get_status(false).await;
    assert!(!status.debug);
}
