// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Node configuration
//!
//! Values come from, in increasing priority: built-in defaults, an optional
//! TOML file, then command-line flags / environment variables (see
//! [`crate::cli::NodeArgs`]).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::vision::image_utils::DEFAULT_MAX_IMAGE_BYTES;
use crate::vision::yolo::DEFAULT_INPUT_SIZE;

/// How `/detect` failures are mapped to HTTP status codes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ErrorStatusPolicy {
    /// Every failure is reported as 500
    #[default]
    Legacy,
    /// Client input errors are 400, internal faults are 500
    Strict,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// HTML page served at `GET /`
    pub index_path: PathBuf,
    /// Request body limit, also the cap on decoded image bytes
    pub max_body_bytes: usize,
    pub error_status: ErrorStatusPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:5000".to_string(),
            index_path: PathBuf::from("./static/index.html"),
            max_body_bytes: DEFAULT_MAX_IMAGE_BYTES,
            error_status: ErrorStatusPolicy::Legacy,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectorConfig {
    /// ONNX export of the detection model
    pub model_path: PathBuf,
    /// Optional class names file, one per line; overrides model metadata
    pub labels_path: Option<PathBuf>,
    pub input_size: u32,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
    pub intra_threads: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("./weights/manggisv8n.onnx"),
            labels_path: None,
            input_size: DEFAULT_INPUT_SIZE,
            confidence_threshold: 0.25,
            iou_threshold: 0.7,
            max_detections: 300,
            intra_threads: 4,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NodeConfig {
    pub server: ServerConfig,
    pub detector: DetectorConfig,
}

impl NodeConfig {
    /// Load configuration from a TOML file
    ///
    /// Missing sections and keys fall back to defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<()> {
        let detector = &self.detector;

        if !(0.0..=1.0).contains(&detector.confidence_threshold) {
            anyhow::bail!(
                "confidence_threshold must be between 0 and 1, got {}",
                detector.confidence_threshold
            );
        }

        if !(0.0..=1.0).contains(&detector.iou_threshold) {
            anyhow::bail!(
                "iou_threshold must be between 0 and 1, got {}",
                detector.iou_threshold
            );
        }

        if detector.input_size == 0 || detector.input_size % 32 != 0 {
            anyhow::bail!(
                "input_size must be a positive multiple of 32, got {}",
                detector.input_size
            );
        }

        if detector.max_detections == 0 {
            anyhow::bail!("max_detections must be greater than 0");
        }

        if detector.intra_threads == 0 {
            anyhow::bail!("intra_threads must be greater than 0");
        }

        if self.server.max_body_bytes == 0 {
            anyhow::bail!("max_body_bytes must be greater than 0");
        }

        self.server
            .listen_addr
            .parse::<std::net::SocketAddr>()
            .with_context(|| format!("Invalid listen_addr '{}'", self.server.listen_addr))?;

        Ok(())
    }
}
