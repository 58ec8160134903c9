// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Runtime configuration for the detection node
//!
//! Values are assembled once at startup from CLI flags and environment
//! overrides, then treated as immutable for the process lifetime.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::cli::Cli;

/// Default location of the YOLOv8 ONNX checkpoint, relative to the
/// working directory. Override with the MODEL_PATH environment variable.
pub const DEFAULT_MODEL_PATH: &str = "./models/best.onnx";

/// Maximum accepted upload size (20MB covers full-resolution CT slices)
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Detection thresholds passed to the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorParams {
    /// Square input size the checkpoint was exported with
    pub input_size: u32,
    /// Minimum confidence for a detection to be reported (0.0-1.0)
    pub confidence_threshold: f32,
    /// IoU threshold for non-maximum suppression (0.0-1.0)
    pub iou_threshold: f32,
    /// Upper bound on detections returned per image
    pub max_detections: usize,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            input_size: 640,
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
            max_detections: 100,
        }
    }
}

/// Full server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address for the HTTP server
    pub host: String,
    /// Bind port for the HTTP server
    pub port: u16,
    /// Debug mode: verbose logging plus error details in responses
    pub debug: bool,
    /// Path to the detection model checkpoint
    pub model_path: PathBuf,
    /// Detection thresholds
    pub detector: DetectorParams,
    /// Maximum accepted request payload
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    /// Build the configuration from parsed CLI arguments.
    ///
    /// The checkpoint path is fixed unless MODEL_PATH is set; thresholds
    /// keep their defaults (per-request overrides happen at the API layer).
    pub fn from_cli(cli: &Cli) -> Self {
        let model_path = env::var("MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_MODEL_PATH));

        Self {
            host: cli.host.clone(),
            port: cli.port,
            debug: cli.debug,
            model_path,
            detector: DetectorParams::default(),
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }

    /// Address string the HTTP listener binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_default_detector_params() {
        let params = DetectorParams::default();
        assert_eq!(params.input_size, 640);
        assert!((params.confidence_threshold - 0.25).abs() < f32::EPSILON);
        assert!((params.iou_threshold - 0.45).abs() < f32::EPSILON);
        assert_eq!(params.max_detections, 100);
    }

    #[test]
    fn test_bind_addr_from_cli() {
        let cli = Cli::try_parse_from(["stonescan-node", "--host", "10.0.0.7", "--port", "9090"])
            .unwrap();
        let config = ServerConfig::from_cli(&cli);
        assert_eq!(config.bind_addr(), "10.0.0.7:9090");
    }

    #[test]
    fn test_default_bind_addr() {
        let cli = Cli::try_parse_from(["stonescan-node"]).unwrap();
        let config = ServerConfig::from_cli(&cli);
        assert_eq!(config.bind_addr(), "0.0.0.0:5000");
        assert!(!config.debug);
    }

    #[test]
    fn test_debug_flag_carried() {
        let cli = Cli::try_parse_from(["stonescan-node", "--debug"]).unwrap();
        let config = ServerConfig::from_cli(&cli);
        assert!(config.debug);
    }
}
