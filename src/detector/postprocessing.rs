// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Decoding of raw YOLOv8 output into detections
//!
//! The exported checkpoint emits a tensor of shape [1, 4+nc, N]: four
//! box attributes (cx, cy, w, h in letterbox space) followed by one
//! score per class, for each of N candidate anchors.

use anyhow::Result;
use ndarray::ArrayViewD;
use serde::{Deserialize, Serialize};

use super::preprocessing::LetterboxInfo;

/// Axis-aligned bounding box, top-left anchored
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Intersection-over-union with another box
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);

        let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union = self.area() + other.area() - intersection;

        if union <= 0.0 {
            return 0.0;
        }
        intersection / union
    }
}

/// A single scored detection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    /// Index into the model's class list
    pub class_id: usize,
    /// Human-readable class label
    pub label: String,
    /// Confidence score (0.0-1.0)
    pub confidence: f32,
    /// Location of the finding
    pub bbox: BoundingBox,
}

/// Decode the raw output tensor into candidate detections.
///
/// Boxes are returned in letterbox space; confidences below `threshold`
/// are dropped. Bails on tensors that do not look like a YOLOv8 head.
pub fn decode_predictions(
    output: ArrayViewD<f32>,
    labels: &[String],
    threshold: f32,
) -> Result<Vec<Detection>> {
    let shape = output.shape();
    if shape.len() != 3 || shape[0] != 1 || shape[1] < 5 {
        anyhow::bail!(
            "unexpected output shape {:?}, expected [1, 4+classes, anchors]",
            shape
        );
    }

    let num_classes = shape[1] - 4;
    let num_anchors = shape[2];
    let mut detections = Vec::new();

    for n in 0..num_anchors {
        // Argmax over class scores
        let mut best_class = 0usize;
        let mut best_score = f32::MIN;
        for c in 0..num_classes {
            let score = output[[0, 4 + c, n]];
            if score > best_score {
                best_score = score;
                best_class = c;
            }
        }

        if best_score < threshold {
            continue;
        }

        let cx = output[[0, 0, n]];
        let cy = output[[0, 1, n]];
        let w = output[[0, 2, n]];
        let h = output[[0, 3, n]];

        if w <= 0.0 || h <= 0.0 {
            continue;
        }

        let label = labels
            .get(best_class)
            .cloned()
            .unwrap_or_else(|| format!("class-{}", best_class));

        detections.push(Detection {
            class_id: best_class,
            label,
            confidence: best_score.clamp(0.0, 1.0),
            bbox: BoundingBox {
                x: cx - w / 2.0,
                y: cy - h / 2.0,
                width: w,
                height: h,
            },
        });
    }

    Ok(detections)
}

/// Greedy non-maximum suppression.
///
/// Keeps the highest-confidence box of each overlapping cluster; two
/// returned boxes of the same class never exceed `iou_threshold`.
pub fn non_max_suppression(
    mut detections: Vec<Detection>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<Detection> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<Detection> = Vec::new();
    for candidate in detections {
        if kept.len() >= max_detections {
            break;
        }

        let suppressed = kept.iter().any(|k| {
            k.class_id == candidate.class_id && k.bbox.iou(&candidate.bbox) > iou_threshold
        });

        if !suppressed {
            kept.push(candidate);
        }
    }

    kept
}

/// Map detections from letterbox space back to source-image pixels,
/// clamping to the image bounds.
pub fn map_to_source(detections: Vec<Detection>, info: &LetterboxInfo) -> Vec<Detection> {
    let max_w = info.source_width as f32;
    let max_h = info.source_height as f32;

    detections
        .into_iter()
        .map(|mut det| {
            let (x1, y1) = info.to_source(det.bbox.x, det.bbox.y);
            let (x2, y2) = info.to_source(
                det.bbox.x + det.bbox.width,
                det.bbox.y + det.bbox.height,
            );

            let x1 = x1.clamp(0.0, max_w);
            let y1 = y1.clamp(0.0, max_h);
            let x2 = x2.clamp(0.0, max_w);
            let y2 = y2.clamp(0.0, max_h);

            det.bbox = BoundingBox {
                x: x1,
                y: y1,
                width: x2 - x1,
                height: y2 - y1,
            };
            det
        })
        .filter(|det| det.bbox.area() > 0.0)
        .collect()
}
