// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Static index page

use axum::{extract::State, http::StatusCode, response::Html};
use tracing::warn;

use super::http_server::AppState;

/// GET / - serve the configured HTML page
pub async fn index_handler(
    State(state): State<AppState>,
) -> Result<Html<String>, (StatusCode, String)> {
    tokio::fs::read_to_string(state.index_path.as_path())
        .await
        .map(Html)
        .map_err(|e| {
            warn!(
                "Failed to read index page {}: {}",
                state.index_path.display(),
                e
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load index page".to_string(),
            )
        })
}
