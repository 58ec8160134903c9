// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod detect;
pub mod errors;
pub mod handlers;
pub mod server;

pub use detect::{detect_handler, detect_upload_handler, DetectRequest, DetectResponse};
pub use errors::{ApiError, ErrorResponse};
pub use handlers::{HealthResponse, StatusResponse};
pub use server::{build_router, serve, ApiConfig, AppState};
