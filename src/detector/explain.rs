// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Multi-level explanations for detections
//!
//! Each finding carries an explanation at a caller-selected depth:
//! `brief` gives the confidence band only, `detailed` adds size and
//! location, `comprehensive` adds a prose summary.

use serde::{Deserialize, Serialize};

use super::postprocessing::Detection;

/// Requested explanation depth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplanationLevel {
    Brief,
    Detailed,
    Comprehensive,
}

impl Default for ExplanationLevel {
    fn default() -> Self {
        ExplanationLevel::Detailed
    }
}

/// Coarse confidence banding for non-technical readers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBand {
    High,
    Moderate,
    Low,
}

impl ConfidenceBand {
    pub fn from_confidence(confidence: f32) -> Self {
        if confidence >= 0.75 {
            ConfidenceBand::High
        } else if confidence >= 0.5 {
            ConfidenceBand::Moderate
        } else {
            ConfidenceBand::Low
        }
    }
}

/// Explanation attached to a single detection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Explanation {
    /// Confidence band (always present)
    pub confidence_band: ConfidenceBand,
    /// Fraction of the image area covered by the finding (detailed+)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_area: Option<f32>,
    /// Coarse location within the image (detailed+)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Prose summary (comprehensive only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Build the explanation for a detection at the requested level.
///
/// `image_width`/`image_height` are the source-image dimensions the
/// detection coordinates refer to.
pub fn explain_detection(
    detection: &Detection,
    image_width: u32,
    image_height: u32,
    level: ExplanationLevel,
) -> Explanation {
    let band = ConfidenceBand::from_confidence(detection.confidence);

    if level == ExplanationLevel::Brief {
        return Explanation {
            confidence_band: band,
            relative_area: None,
            location: None,
            summary: None,
        };
    }

    let image_area = (image_width as f32 * image_height as f32).max(1.0);
    let relative_area = detection.bbox.area() / image_area;
    let location = describe_location(detection, image_width, image_height);

    let summary = if level == ExplanationLevel::Comprehensive {
        Some(build_summary(detection, band, relative_area, &location))
    } else {
        None
    };

    Explanation {
        confidence_band: band,
        relative_area: Some(relative_area),
        location: Some(location),
        summary,
    }
}

/// Name the image region containing the detection center
fn describe_location(detection: &Detection, image_width: u32, image_height: u32) -> String {
    let cx = detection.bbox.x + detection.bbox.width / 2.0;
    let cy = detection.bbox.y + detection.bbox.height / 2.0;
    let w = image_width as f32;
    let h = image_height as f32;

    // Central third counts as "center" on each axis
    let horizontal = if cx < w / 3.0 {
        Some("left")
    } else if cx > w * 2.0 / 3.0 {
        Some("right")
    } else {
        None
    };
    let vertical = if cy < h / 3.0 {
        Some("upper")
    } else if cy > h * 2.0 / 3.0 {
        Some("lower")
    } else {
        None
    };

    match (vertical, horizontal) {
        (Some(v), Some(h)) => format!("{} {}", v, h),
        (Some(v), None) => format!("{} center", v),
        (None, Some(h)) => format!("center {}", h),
        (None, None) => "center".to_string(),
    }
}

fn build_summary(
    detection: &Detection,
    band: ConfidenceBand,
    relative_area: f32,
    location: &str,
) -> String {
    let certainty = match band {
        ConfidenceBand::High => "high confidence",
        ConfidenceBand::Moderate => "moderate confidence",
        ConfidenceBand::Low => "low confidence",
    };
    let size = if relative_area > 0.05 {
        "large"
    } else if relative_area > 0.01 {
        "medium-sized"
    } else {
        "small"
    };

    format!(
        "A {} {} was detected with {} ({:.0}%) in the {} region of the image.",
        size,
        detection.label,
        certainty,
        detection.confidence * 100.0,
        location
    )
}
