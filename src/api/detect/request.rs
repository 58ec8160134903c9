// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection request types and validation

use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::detector::image_input::MAX_IMAGE_BYTES;
use crate::detector::ExplanationLevel;

fn default_explanation() -> ExplanationLevel {
    ExplanationLevel::default()
}

/// Request for POST /api/detect
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectRequest {
    /// Base64-encoded image data
    #[serde(default)]
    pub image: Option<String>,

    /// Explanation depth: brief, detailed, comprehensive
    #[serde(default = "default_explanation")]
    pub explanation: ExplanationLevel,

    /// Per-request confidence threshold override (0.0-1.0 exclusive of 0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_threshold: Option<f32>,
}

impl DetectRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let image = match self.image.as_deref() {
            Some(image) if !image.is_empty() => image,
            _ => {
                return Err(ApiError::ValidationError {
                    field: "image".to_string(),
                    message: "image is required".to_string(),
                });
            }
        };

        // Base64 inflates by 4/3; bound the encoded form accordingly
        if image.len() > MAX_IMAGE_BYTES * 4 / 3 + 4 {
            return Err(ApiError::ValidationError {
                field: "image".to_string(),
                message: format!(
                    "image exceeds maximum decoded size of {} bytes",
                    MAX_IMAGE_BYTES
                ),
            });
        }

        if let Some(threshold) = self.confidence_threshold {
            if !(threshold > 0.0 && threshold <= 1.0) {
                return Err(ApiError::ValidationError {
                    field: "confidenceThreshold".to_string(),
                    message: format!(
                        "confidenceThreshold must be in (0.0, 1.0], got {}",
                        threshold
                    ),
                });
            }
        }

        Ok(())
    }
}
