// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use crate::config::{ErrorStatusPolicy, NodeConfig};

/// Object detection HTTP node
#[derive(Parser, Debug, Default)]
#[command(name = "detect-node")]
#[command(version = crate::version::VERSION_NUMBER)]
#[command(about = "Serve a YOLOv8 ONNX detection model over HTTP", long_about = None)]
pub struct NodeArgs {
    /// TOML configuration file
    #[arg(long, env = "DETECT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind, e.g. 0.0.0.0:5000
    #[arg(long, env = "LISTEN_ADDR")]
    pub listen_addr: Option<String>,

    /// Path to the ONNX detection model
    #[arg(long, env = "MODEL_PATH")]
    pub model_path: Option<PathBuf>,

    /// Class names file, one per line (defaults to model metadata)
    #[arg(long, env = "LABELS_PATH")]
    pub labels_path: Option<PathBuf>,

    /// HTML page served at /
    #[arg(long, env = "INDEX_PATH")]
    pub index_path: Option<PathBuf>,

    /// Minimum confidence for reported detections
    #[arg(long, env = "CONFIDENCE_THRESHOLD")]
    pub confidence_threshold: Option<f32>,

    /// IoU threshold for non-max suppression
    #[arg(long, env = "IOU_THRESHOLD")]
    pub iou_threshold: Option<f32>,

    /// Status code policy for /detect failures
    #[arg(long, env = "ERROR_STATUS", value_enum)]
    pub error_status: Option<ErrorStatusPolicy>,
}

impl NodeArgs {
    /// Build the effective configuration: file (if any), then flag overrides
    pub fn into_config(self) -> Result<NodeConfig> {
        let mut config = match &self.config {
            Some(path) => NodeConfig::from_file(path)?,
            None => NodeConfig::default(),
        };

        if let Some(addr) = self.listen_addr {
            config.server.listen_addr = addr;
        }
        if let Some(path) = self.index_path {
            config.server.index_path = path;
        }
        if let Some(policy) = self.error_status {
            config.server.error_status = policy;
        }
        if let Some(path) = self.model_path {
            config.detector.model_path = path;
        }
        if let Some(path) = self.labels_path {
            config.detector.labels_path = Some(path);
        }
        if let Some(threshold) = self.confidence_threshold {
            config.detector.confidence_threshold = threshold;
        }
        if let Some(threshold) = self.iou_threshold {
            config.detector.iou_threshold = threshold;
        }

        config.validate()?;
        Ok(config)
    }
}
