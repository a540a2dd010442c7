// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::http_server::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToggleResponse {
    pub detection_enabled: bool,
}

/// POST /toggle_detection - flip the detection flag
///
/// No request body. Always succeeds and returns the new value. `/detect`
/// does not consult this flag.
pub async fn toggle_detection_handler(State(state): State<AppState>) -> Json<ToggleResponse> {
    let detection_enabled = state.toggle_detection();
    info!("Detection toggled: enabled={}", detection_enabled);

    Json(ToggleResponse { detection_enabled })
}
