//! Health and index DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Liveness report of the server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

/// Self-description returned at the API root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiIndex {
    pub message: String,
    pub version: String,
    pub endpoints: BTreeMap<String, String>,
}
