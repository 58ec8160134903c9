// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection response types

use serde::{Deserialize, Serialize};

use crate::detector::{BoundingBox, Explanation};

/// A reported finding with its explanation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    /// Class label of the finding
    pub label: String,
    /// Confidence score (0.0-1.0)
    pub confidence: f32,
    /// Location in source-image pixels
    pub bounding_box: BoundingBox,
    /// Explanation at the requested depth
    pub explanation: Explanation,
}

/// Source image metadata echoed back to the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMeta {
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub size_bytes: usize,
}

/// Response from POST /api/detect
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectResponse {
    /// Unique id for correlating logs with this request
    pub request_id: String,
    /// Findings ordered by confidence, highest first
    pub detections: Vec<DetectionResult>,
    /// Number of findings
    pub count: usize,
    /// Metadata of the analyzed image
    pub image: ImageMeta,
    /// End-to-end processing time in milliseconds
    pub processing_time_ms: u64,
    /// Model that produced the findings
    pub model: String,
}
