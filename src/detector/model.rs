// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLOv8 kidney stone detection model
//!
//! Wraps the ONNX checkpoint behind a thread-safe session. Runs on CPU
//! only; a GPU brings no benefit at the request rates this service sees.

use anyhow::{Context, Result};
use image::DynamicImage;
use ndarray::Array4;
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::postprocessing::{decode_predictions, map_to_source, non_max_suppression, Detection};
use super::preprocessing::{image_to_tensor, LetterboxInfo};
use crate::config::DetectorParams;

/// Kidney stone detector backed by a YOLOv8 ONNX checkpoint
#[derive(Clone)]
pub struct StoneDetector {
    /// ONNX Runtime session (thread-safe)
    session: Arc<Mutex<Session>>,
    /// Model input name
    input_name: String,
    /// Class labels in checkpoint order
    labels: Vec<String>,
    /// Detection thresholds
    params: DetectorParams,
}

impl std::fmt::Debug for StoneDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoneDetector")
            .field("input_name", &self.input_name)
            .field("labels", &self.labels)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl StoneDetector {
    /// Load the detection model from an ONNX checkpoint
    ///
    /// # Errors
    /// Returns error if:
    /// - Checkpoint file not found
    /// - ONNX Runtime initialization fails
    /// - Checkpoint cannot be parsed as a model
    pub async fn new<P: AsRef<Path>>(
        checkpoint: P,
        labels: Vec<String>,
        params: DetectorParams,
    ) -> Result<Self> {
        let checkpoint = checkpoint.as_ref();

        if !checkpoint.exists() {
            anyhow::bail!("detection checkpoint not found: {}", checkpoint.display());
        }

        info!("Loading detection checkpoint from {}", checkpoint.display());

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(4)
            .context("Failed to set intra threads")?
            .commit_from_file(checkpoint)
            .context(format!(
                "Failed to load detection checkpoint from {}",
                checkpoint.display()
            ))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "images".to_string());

        if let Some(output) = session.outputs.first() {
            debug!("Detection model output: {}", output.name);
        }

        info!("✅ Detection model loaded successfully (CPU-only)");

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            labels,
            params,
        })
    }

    /// Class labels in checkpoint order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Square input size expected by the checkpoint
    pub fn input_size(&self) -> u32 {
        self.params.input_size
    }

    /// Run detection on a decoded image.
    ///
    /// `confidence_override` replaces the configured threshold for this
    /// call only (per-request tuning from the API layer). Returned boxes
    /// are in source-image pixels.
    pub fn detect(
        &self,
        image: &DynamicImage,
        confidence_override: Option<f32>,
    ) -> Result<Vec<Detection>> {
        let tensor = image_to_tensor(image, self.params.input_size);
        let info = LetterboxInfo::new(image, self.params.input_size);
        let threshold = confidence_override
            .unwrap_or(self.params.confidence_threshold)
            .clamp(0.0, 1.0);

        let raw = self.run_inference(&tensor)?;
        let candidates = decode_predictions(raw.view(), &self.labels, threshold)?;
        debug!("{} candidates above threshold {}", candidates.len(), threshold);

        let kept = non_max_suppression(
            candidates,
            self.params.iou_threshold,
            self.params.max_detections,
        );
        let detections = map_to_source(kept, &info);

        debug!("{} detections after NMS and mapping", detections.len());
        Ok(detections)
    }

    /// Execute the session on a preprocessed NCHW tensor
    fn run_inference(&self, input: &Array4<f32>) -> Result<ndarray::ArrayD<f32>> {
        let shape = input.shape();
        if shape.len() != 4 || shape[0] != 1 || shape[1] != 3 {
            anyhow::bail!("invalid input shape: {:?}, expected [1, 3, H, W]", shape);
        }

        let mut session = self.session.lock().unwrap();

        let input_value =
            Value::from_array(input.to_owned()).context("Failed to create input tensor")?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_value])
            .context("Detection inference failed")?;

        let output_tensor = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        Ok(output_tensor.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<String> {
        vec!["kidney-stone".to_string()]
    }

    #[tokio::test]
    async fn test_checkpoint_not_found() {
        let result = StoneDetector::new(
            "/nonexistent/path/best.onnx",
            labels(),
            DetectorParams::default(),
        )
        .await;
        assert!(result.is_err());

        let err = result.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_garbage_checkpoint_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("best.onnx");
        std::fs::write(&path, b"not an onnx model").unwrap();

        let result = StoneDetector::new(&path, labels(), DetectorParams::default()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    #[ignore] // Only run if the checkpoint is downloaded
    async fn test_detect_on_blank_image() {
        let detector = match StoneDetector::new(
            "./models/best.onnx",
            labels(),
            DetectorParams::default(),
        )
        .await
        {
            Ok(d) => d,
            Err(_) => return, // Skip if checkpoint not available
        };

        let image = DynamicImage::new_rgb8(640, 640);
        let detections = detector.detect(&image, None).unwrap();

        // A uniform black image should not contain stones
        assert!(detections.iter().all(|d| d.confidence < 0.5));
    }
}
