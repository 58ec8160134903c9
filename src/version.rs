// Version information for the StoneScan detection node

/// Full version string with feature description
pub const VERSION: &str = "v1.2.0-multilevel-explainability-2026-07-21";

/// Semantic version number
pub const VERSION_NUMBER: &str = "1.2.0";

/// Build date
pub const BUILD_DATE: &str = "2026-07-21";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "yolov8-onnx",
    "cpu-inference",
    "multipart-upload",
    "base64-upload",
    "multi-level-explainability",
    "graceful-degradation",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("StoneScan Node {} ({})", VERSION_NUMBER, BUILD_DATE)
}
