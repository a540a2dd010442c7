// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::{
    net::SocketAddr,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use super::detect::detect_handler;
use super::handlers::health_handler;
use super::index::index_handler;
use super::toggle::toggle_detection_handler;
use crate::config::{ErrorStatusPolicy, ServerConfig};
use crate::vision::ObjectDetector;

/// Shared state handed to every request handler
#[derive(Clone)]
pub struct AppState {
    /// Loaded once at start-up, shared read-only
    pub detector: Arc<dyn ObjectDetector>,
    /// Process-wide toggle; starts false, never persisted
    pub detection_enabled: Arc<AtomicBool>,
    pub index_path: Arc<PathBuf>,
    pub error_status: ErrorStatusPolicy,
    pub max_image_bytes: usize,
}

impl AppState {
    pub fn new(detector: Arc<dyn ObjectDetector>, config: &ServerConfig) -> Self {
        Self {
            detector,
            detection_enabled: Arc::new(AtomicBool::new(false)),
            index_path: Arc::new(config.index_path.clone()),
            error_status: config.error_status,
            max_image_bytes: config.max_body_bytes,
        }
    }

    pub fn detection_enabled(&self) -> bool {
        self.detection_enabled.load(Ordering::SeqCst)
    }

    /// Flip the flag atomically and return the new value
    pub fn toggle_detection(&self) -> bool {
        !self.detection_enabled.fetch_xor(true, Ordering::SeqCst)
    }
}

pub fn create_router(state: AppState) -> Router {
    // Base64 inflates by 4/3, leave room for the JSON wrapper
    let body_limit = state.max_image_bytes / 3 * 4 + 64 * 1024;

    Router::new()
        .route("/", get(index_handler))
        .route("/toggle_detection", post(toggle_detection_handler))
        .route("/detect", post(detect_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `config.listen_addr` and serve until Ctrl-C
pub async fn start_server(config: ServerConfig, detector: Arc<dyn ObjectDetector>) -> Result<()> {
    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address '{}'", config.listen_addr))?;

    let state = AppState::new(detector, &config);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("🌐 Detection API listening on http://{}", listener.local_addr()?);
    info!("   GET  /                  - index page");
    info!("   POST /toggle_detection  - flip detection flag");
    info!("   POST /detect            - detect objects in a data-URL image");
    info!("   GET  /health            - node status");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
