// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Kidney stone detection on CT imagery
//!
//! This module provides:
//! - YOLOv8 inference via ONNX Runtime (CPU only)
//! - Image decode and letterbox preprocessing
//! - Multi-level explanations for each detection
//!
//! The checkpoint is optional at startup: a missing or unloadable model
//! leaves the manager unavailable and detection endpoints return 503.

pub mod explain;
pub mod image_input;
pub mod manager;
pub mod model;
pub mod postprocessing;
pub mod preprocessing;

pub use explain::{explain_detection, ConfidenceBand, Explanation, ExplanationLevel};
pub use image_input::{decode_base64_image, decode_image_bytes, detect_format, ImageInputError, ImageInfo};
pub use manager::{DetectorManager, ModelSummary};
pub use model::StoneDetector;
pub use postprocessing::{non_max_suppression, BoundingBox, Detection};
pub use preprocessing::{image_to_tensor, letterbox, LetterboxInfo};

/// Class labels the checkpoint was trained on
pub const CLASS_LABELS: &[&str] = &["kidney-stone"];
