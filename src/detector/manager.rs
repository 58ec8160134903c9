// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detector lifecycle management
//!
//! Loads the checkpoint at most once and degrades gracefully: a missing
//! or unloadable checkpoint leaves the manager unavailable, the service
//! keeps serving, and detection endpoints return 503.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use super::model::StoneDetector;
use super::CLASS_LABELS;
use crate::config::ServerConfig;

/// Model metadata reported by the status endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSummary {
    /// Logical model name
    pub name: String,
    /// Checkpoint path the node resolved at startup
    pub path: String,
    /// Whether the model is loaded and serving
    pub available: bool,
    /// SHA-256 of the checkpoint file (present when loaded)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    /// Class labels the checkpoint detects
    pub labels: Vec<String>,
    /// Square input size in pixels
    pub input_size: u32,
}

/// Manager for the detection model
pub struct DetectorManager {
    detector: Option<Arc<StoneDetector>>,
    summary: ModelSummary,
}

impl DetectorManager {
    /// Attempt to load the checkpoint named by the configuration.
    ///
    /// Load failures are logged and produce an unavailable manager,
    /// never an error: startup must not depend on the model.
    pub async fn load(config: &ServerConfig) -> Self {
        let labels: Vec<String> = CLASS_LABELS.iter().map(|s| s.to_string()).collect();

        let detector = match StoneDetector::new(
            &config.model_path,
            labels.clone(),
            config.detector.clone(),
        )
        .await
        {
            Ok(detector) => {
                info!(
                    "✅ Detection model ready: {}",
                    config.model_path.display()
                );
                Some(Arc::new(detector))
            }
            Err(e) => {
                warn!(
                    "⚠️ Failed to load detection model from {}: {}",
                    config.model_path.display(),
                    e
                );
                None
            }
        };

        let sha256 = if detector.is_some() {
            checksum_file(&config.model_path)
        } else {
            None
        };

        let summary = ModelSummary {
            name: "yolov8-kidney-stone".to_string(),
            path: config.model_path.display().to_string(),
            available: detector.is_some(),
            sha256,
            labels,
            input_size: config.detector.input_size,
        };

        Self { detector, summary }
    }

    /// Build a manager for a node running without a checkpoint
    pub fn unavailable(config: &ServerConfig) -> Self {
        Self {
            detector: None,
            summary: ModelSummary {
                name: "yolov8-kidney-stone".to_string(),
                path: config.model_path.display().to_string(),
                available: false,
                sha256: None,
                labels: CLASS_LABELS.iter().map(|s| s.to_string()).collect(),
                input_size: config.detector.input_size,
            },
        }
    }

    /// Get the detector if loaded
    pub fn detector(&self) -> Option<Arc<StoneDetector>> {
        self.detector.clone()
    }

    /// Whether detection requests can be served
    pub fn is_available(&self) -> bool {
        self.detector.is_some()
    }

    /// Model metadata for the status endpoint
    pub fn summary(&self) -> ModelSummary {
        self.summary.clone()
    }
}

/// SHA-256 of a file on disk, hex encoded. Read failures are logged,
/// never fatal.
fn checksum_file(path: &Path) -> Option<String> {
    match std::fs::read(path) {
        Ok(bytes) => {
            let mut hasher = Sha256::new();
            hasher.update(&bytes);
            Some(format!("{:x}", hasher.finalize()))
        }
        Err(e) => {
            warn!("Failed to checksum {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use std::path::PathBuf;

    fn test_config(model_path: PathBuf) -> ServerConfig {
        let cli = Cli::try_parse_from(["stonescan-node"]).unwrap();
        let mut config = ServerConfig::from_cli(&cli);
        config.model_path = model_path;
        config
    }

    #[tokio::test]
    async fn test_load_missing_checkpoint_degrades() {
        let config = test_config(PathBuf::from("/nonexistent/best.onnx"));
        let manager = DetectorManager::load(&config).await;

        assert!(!manager.is_available());
        assert!(manager.detector().is_none());

        let summary = manager.summary();
        assert!(!summary.available);
        assert!(summary.sha256.is_none());
        assert_eq!(summary.path, "/nonexistent/best.onnx");
    }

    #[tokio::test]
    async fn test_load_corrupt_checkpoint_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("best.onnx");
        std::fs::write(&path, b"definitely not a model").unwrap();

        let config = test_config(path);
        let manager = DetectorManager::load(&config).await;
        assert!(!manager.is_available());
    }

    #[test]
    fn test_unavailable_manager() {
        let config = test_config(PathBuf::from("./models/best.onnx"));
        let manager = DetectorManager::unavailable(&config);

        assert!(!manager.is_available());
        let summary = manager.summary();
        assert_eq!(summary.labels, vec!["kidney-stone".to_string()]);
        assert_eq!(summary.input_size, 640);
    }

    #[test]
    fn test_checksum_known_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob");
        std::fs::write(&path, b"abc").unwrap();

        // SHA-256 of "abc"
        assert_eq!(
            checksum_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_checksum_missing_file() {
        assert!(checksum_file(Path::new("/nonexistent/blob")).is_none());
    }
}
