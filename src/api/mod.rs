// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod detect;
pub mod errors;
pub mod handlers;
pub mod http_server;
pub mod index;
pub mod toggle;

pub use detect::{detect_handler, DetectRequest, DetectResponse, Detection};
pub use errors::ApiError;
pub use handlers::{health_handler, HealthResponse};
pub use http_server::{create_router, start_server, AppState};
pub use index::index_handler;
pub use toggle::{toggle_detection_handler, ToggleResponse};
