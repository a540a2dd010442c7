// Version information for the detection node

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-yolo-onnx-2026-10-18";

/// Semantic version number
pub const VERSION_NUMBER: &str = "0.1.0";

/// Build date
pub const BUILD_DATE: &str = "2026-10-18";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "yolov8-onnx",
    "data-url-images",
    "detection-toggle",
    "cors-any-origin",
    "typed-error-status",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Detect Node {} ({})", VERSION_NUMBER, BUILD_DATE)
}
