//! Error types for the apkforge client

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when using the apkforge client
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
        /// Build id reported with a failed build
        build_id: Option<uuid::Uuid>,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A downloaded file could not be written locally
    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
            build_id: None,
        }
    }

    /// Create an API error from the body of an error response
    ///
    /// Server error bodies are JSON objects carrying `error` and optionally
    /// `message`, `missing` and `buildId`; anything else is kept verbatim.
    pub fn from_body(status: u16, body: &str) -> Self {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
            return Self::api_error(status, body);
        };

        let field = |name: &str| value.get(name).and_then(|v| v.as_str());
        let mut message = match (field("error"), field("message")) {
            (Some(error), Some(detail)) => format!("{}: {}", error, detail),
            (Some(error), None) => error.to_string(),
            (None, Some(detail)) => detail.to_string(),
            (None, None) => body.to_string(),
        };

        if let Some(missing) = value.get("missing").and_then(|v| v.as_array()) {
            let names: Vec<&str> = missing.iter().filter_map(|v| v.as_str()).collect();
            if !names.is_empty() {
                message = format!("{} ({})", message, names.join(", "));
            }
        }

        Self::ApiError {
            status,
            message,
            build_id: field("buildId").and_then(|id| id.parse().ok()),
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_)) || matches!(self, Self::ApiError { status: 404, .. })
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 400 && *status < 500)
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }

    /// Build id attached to a failed build
    pub fn build_id(&self) -> Option<uuid::Uuid> {
        match self {
            Self::ApiError { build_id, .. } => *build_id,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_body_missing_fields() {
        let err = ClientError::from_body(
            400,
            r#"{"error":"Missing required fields","required":["appName","appUrl","logoUrl","packageId"],"missing":["logoUrl"]}"#,
        );
        assert!(err.is_client_error());
        assert_eq!(
            err.to_string(),
            "API error (status 400): Missing required fields (logoUrl)"
        );
    }

    #[test]
    fn test_from_body_build_failure() {
        let id = uuid::Uuid::new_v4();
        let body = format!(
            r#"{{"error":"Build failed","message":"Toolchain command failed","buildId":"{}"}}"#,
            id
        );
        let err = ClientError::from_body(500, &body);
        assert!(err.is_server_error());
        assert_eq!(err.build_id(), Some(id));
        assert!(err.to_string().contains("Build failed: Toolchain command failed"));
    }

    #[test]
    fn test_from_body_plain_text() {
        let err = ClientError::from_body(502, "Bad Gateway");
        assert_eq!(err.to_string(), "API error (status 502): Bad Gateway");
        assert!(ClientError::api_error(404, "x").is_not_found());
    }
}
