// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shared wire types for the service endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::detector::ModelSummary;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues: Option<Vec<String>>,
}

/// Response for GET /api/status
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub service: String,
    pub version: String,
    pub started_at: DateTime<Utc>,
    pub debug: bool,
    pub model: ModelSummary,
}
