// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Health endpoint behavior with and without a loaded model

use axum::body::Body;
use axum::http::{Request, StatusCode};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tower::util::ServiceExt;

use stonescan_node::api::{build_router, ApiConfig, AppState, HealthResponse};
use stonescan_node::cli::Cli;
use stonescan_node::config::ServerConfig;
use stonescan_node::detector::DetectorManager;

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

#[tokio::test]
async fn test_health_returns_200_without_model() {
    let app = build_router(state_without_model());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let health: HealthResponse = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(health.status, "degraded");
    let issues = health.issues.expect("issue list expected");
    assert!(issues.iter().any(|i| i.contains("model not loaded")));
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let app = build_router(state_without_model());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
