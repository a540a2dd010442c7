// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Parser;
use detect_node::{
    api::start_server,
    cli::NodeArgs,
    version,
    vision::{ObjectDetector, YoloDetector},
};
use std::{env, sync::Arc};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    info!("🚀 Starting {}", version::get_version_string());

    let config = match NodeArgs::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            error!("❌ Invalid configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    // The model must load before the server binds
    info!("🧠 Loading detection model...");
    let detector = match YoloDetector::new(&config.detector).await {
        Ok(detector) => detector,
        Err(e) => {
            error!("❌ Failed to load detection model: {:#}", e);
            std::process::exit(1);
        }
    };

    info!(
        "✅ Detector ready: {} ({} classes, conf={}, iou={})",
        detector.name(),
        detector.labels().len(),
        config.detector.confidence_threshold,
        config.detector.iou_threshold
    );

    let detector: Arc<dyn ObjectDetector> = Arc::new(detector);
    start_server(config.server, detector).await
}
