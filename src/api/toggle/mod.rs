// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection toggle endpoint
//!
//! Provides POST /toggle_detection for flipping the process-wide flag.

pub mod handler;

pub use handler::{toggle_detection_handler, ToggleResponse};
