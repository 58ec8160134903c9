// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP server assembly and lifecycle

use anyhow::Result;
use axum::{
    extract::{DefaultBodyLimit, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::detect::{detect_handler, detect_upload_handler};
use super::handlers::{HealthResponse, StatusResponse};
use crate::detector::DetectorManager;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Address the listener binds to
    pub listen_addr: String,
    /// Include failure details in 500 responses (debug mode)
    pub enable_error_details: bool,
    /// Maximum accepted request body
    pub max_body_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:5000".to_string(),
            enable_error_details: false,
            max_body_bytes: crate::config::MAX_UPLOAD_BYTES,
        }
    }
}

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub detector_manager: Arc<DetectorManager>,
    pub started_at: DateTime<Utc>,
}

/// Build the service router with all routes and layers
pub fn build_router(state: AppState) -> Router {
    // Base64 in JSON inflates uploads by a third; size the body cap to match
    let body_limit = state.config.max_body_bytes * 4 / 3 + 1024;

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/status", get(status_handler))
        .route("/api/detect", post(detect_handler))
        .route("/api/detect/upload", post(detect_upload_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the listener and serve until Ctrl-C.
///
/// This call blocks for the process lifetime; request concurrency is
/// handled by the tokio runtime.
pub async fn serve(config: ApiConfig, detector_manager: Arc<DetectorManager>) -> Result<()> {
    let addr = config.listen_addr.clone();
    let state = AppState {
        config: Arc::new(config),
        detector_manager,
        started_at: Utc::now(),
    };

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("API server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    // Degraded-but-serving still reports 200 with an issue list
    let issues = if state.detector_manager.is_available() {
        None
    } else {
        Some(vec!["detection model not loaded".to_string()])
    };

    axum::Json(HealthResponse {
        status: if issues.is_none() {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        issues,
    })
}

async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    axum::Json(StatusResponse {
        service: "stonescan-node".to_string(),
        version: crate::version::VERSION_NUMBER.to_string(),
        started_at: state.started_at,
        debug: state.config.enable_error_details,
        model: state.detector_manager.summary(),
    })
}
