//! Error types for request validation

use thiserror::Error;

/// A build request was rejected before any job was created
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Missing required fields: {}", missing.join(", "))]
pub struct ValidationError {
    /// Wire names of the fields that were absent or blank
    pub missing: Vec<&'static str>,
}
