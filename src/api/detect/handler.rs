// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection endpoint handlers

use axum::extract::State;
use axum::Json;
use axum_extra::extract::Multipart;
use image::DynamicImage;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::request::DetectRequest;
use super::response::{DetectResponse, DetectionResult, ImageMeta};
use crate::api::errors::ApiError;
use crate::api::server::AppState;
use crate::detector::image_input::{
    decode_base64_image, decode_image_bytes, ImageInfo, ImageInputError,
};
use crate::detector::{explain_detection, ExplanationLevel, StoneDetector};

/// POST /api/detect - Run kidney stone detection on a base64 image
///
/// # Request
/// - `image`: Base64-encoded image data (required)
/// - `explanation`: brief | detailed | comprehensive - defaults to "detailed"
/// - `confidenceThreshold`: per-request threshold override (optional)
///
/// # Errors
/// - 400 Bad Request: missing image, undecodable data, bad threshold
/// - 503 Service Unavailable: detection model not loaded
/// - 500 Internal Server Error: inference failed
pub async fn detect_handler(
    State(state): State<AppState>,
    Json(request): Json<DetectRequest>,
) -> Result<Json<DetectResponse>, ApiError> {
    request.validate().map_err(|e| {
        warn!("Detect validation failed: {}", e);
        e
    })?;

    let detector = require_detector(&state)?;

    // validate() guarantees the image field is present and non-empty
    let encoded = request.image.as_deref().unwrap_or_default();
    let (image, image_info) = decode_base64_image(encoded).map_err(map_image_error)?;

    debug!(
        "Decoded image: {}x{}, {} bytes",
        image_info.width, image_info.height, image_info.size_bytes
    );

    let response = run_detection(
        &state,
        detector,
        image,
        image_info,
        request.explanation,
        request.confidence_threshold,
    )?;
    Ok(Json(response))
}

/// POST /api/detect/upload - Run detection on a multipart file upload
///
/// Accepts an `image` file field plus optional `explanation` and
/// `confidenceThreshold` text fields with the same semantics as the
/// JSON endpoint.
pub async fn detect_upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<DetectResponse>, ApiError> {
    let detector = require_detector(&state)?;

    let mut image_bytes: Option<Vec<u8>> = None;
    let mut level = ExplanationLevel::default();
    let mut confidence_threshold: Option<f32> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidRequest(format!("malformed multipart body: {}", e)))?
    {
        match field.name() {
            Some("image") | Some("file") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::InvalidRequest(format!("failed to read upload: {}", e)))?;
                image_bytes = Some(bytes.to_vec());
            }
            Some("explanation") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::InvalidRequest(format!("failed to read field: {}", e)))?;
                level = parse_explanation_level(&text)?;
            }
            Some("confidenceThreshold") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::InvalidRequest(format!("failed to read field: {}", e)))?;
                let threshold: f32 = text.parse().map_err(|_| ApiError::ValidationError {
                    field: "confidenceThreshold".to_string(),
                    message: format!("expected a number, got '{}'", text),
                })?;
                if !(threshold > 0.0 && threshold <= 1.0) {
                    return Err(ApiError::ValidationError {
                        field: "confidenceThreshold".to_string(),
                        message: format!("confidenceThreshold must be in (0.0, 1.0], got {}", threshold),
                    });
                }
                confidence_threshold = Some(threshold);
            }
            _ => {} // Unknown fields are ignored
        }
    }

    let image_bytes = image_bytes.ok_or_else(|| ApiError::ValidationError {
        field: "image".to_string(),
        message: "image file field is required".to_string(),
    })?;

    let (image, image_info) = decode_image_bytes(&image_bytes).map_err(map_image_error)?;

    let response = run_detection(
        &state,
        detector,
        image,
        image_info,
        level,
        confidence_threshold,
    )?;
    Ok(Json(response))
}

/// Fetch the loaded detector or fail with 503
fn require_detector(state: &AppState) -> Result<Arc<StoneDetector>, ApiError> {
    state.detector_manager.detector().ok_or_else(|| {
        warn!("Detection requested but model is not loaded");
        ApiError::DetectorUnavailable("detection model not loaded".to_string())
    })
}

/// Shared inference + response assembly for both upload paths
fn run_detection(
    state: &AppState,
    detector: Arc<StoneDetector>,
    image: DynamicImage,
    image_info: ImageInfo,
    level: ExplanationLevel,
    confidence_threshold: Option<f32>,
) -> Result<DetectResponse, ApiError> {
    let request_id = Uuid::new_v4().to_string();
    let started = Instant::now();

    let detections = detector.detect(&image, confidence_threshold).map_err(|e| {
        warn!("Detection failed: {:#}", e);
        if state.config.enable_error_details {
            ApiError::InternalError(format!("detection failed: {:#}", e))
        } else {
            ApiError::InternalError("detection failed".to_string())
        }
    })?;

    let results: Vec<DetectionResult> = detections
        .iter()
        .map(|det| DetectionResult {
            label: det.label.clone(),
            confidence: det.confidence,
            bounding_box: det.bbox,
            explanation: explain_detection(det, image_info.width, image_info.height, level),
        })
        .collect();

    let processing_time_ms = started.elapsed().as_millis() as u64;
    info!(
        "Detection complete: {} findings in {}ms (request {})",
        results.len(),
        processing_time_ms,
        request_id
    );

    Ok(DetectResponse {
        request_id,
        count: results.len(),
        detections: results,
        image: ImageMeta {
            width: image_info.width,
            height: image_info.height,
            format: format_name(image_info.format),
            size_bytes: image_info.size_bytes,
        },
        processing_time_ms,
        model: state.detector_manager.summary().name,
    })
}

fn parse_explanation_level(text: &str) -> Result<ExplanationLevel, ApiError> {
    match text.to_lowercase().as_str() {
        "brief" => Ok(ExplanationLevel::Brief),
        "detailed" => Ok(ExplanationLevel::Detailed),
        "comprehensive" => Ok(ExplanationLevel::Comprehensive),
        other => Err(ApiError::ValidationError {
            field: "explanation".to_string(),
            message: format!(
                "unsupported level '{}', expected brief, detailed or comprehensive",
                other
            ),
        }),
    }
}

fn map_image_error(err: ImageInputError) -> ApiError {
    match err {
        ImageInputError::TooLarge(size, limit) => ApiError::PayloadTooLarge { size, limit },
        other => {
            warn!("Failed to decode image: {}", other);
            ApiError::InvalidRequest(format!("invalid image: {}", other))
        }
    }
}
