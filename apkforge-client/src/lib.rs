//! apkforge HTTP Client
//!
//! A simple, type-safe HTTP client for the apkforge build server API.
//!
//! # Example
//!
//! ```no_run
//! use apkforge_client::ApkforgeClient;
//! use apkforge_core::dto::build::CreateBuild;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ApkforgeClient::new("http://localhost:3000");
//!
//!     let build = client.build(CreateBuild {
//!         app_name: Some("Demo App".to_string()),
//!         app_url: Some("https://example.com".to_string()),
//!         logo_url: Some("https://example.com/icon.png".to_string()),
//!         package_id: Some("com.example.demo".to_string()),
//!     }).await?;
//!
//!     println!("Download: {}", build.download_url);
//!     Ok(())
//! }
//! ```

mod builds;
pub mod error;
mod health;

// Re-export commonly used types
pub use error::{ClientError, Result};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the apkforge build server
#[derive(Debug, Clone)]
pub struct ApkforgeClient {
    /// Base URL of the server (e.g., "http://localhost:3000")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl ApkforgeClient {
    /// Create a new client
    ///
    /// Builds run synchronously on the server and can take many minutes,
    /// so the default client sets no request timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a server-relative path (such as a download URL) to an absolute URL
    pub fn resolve(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::from_body(status.as_u16(), &error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Serves `router` on an ephemeral local port and returns its base URL
    pub(crate) async fn serve(router: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_client_creation() {
        let client = ApkforgeClient::new("http://localhost:3000");
        assert_eq!(client.base_url(), "http://localhost:3000");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = ApkforgeClient::new("http://localhost:3000/");
        assert_eq!(client.base_url(), "http://localhost:3000");
    }

    #[test]
    fn test_resolve() {
        let client = ApkforgeClient::new("http://localhost:3000");
        assert_eq!(
            client.resolve("/builds/x/A-release.apk"),
            "http://localhost:3000/builds/x/A-release.apk"
        );
        assert_eq!(
            client.resolve("https://cdn.example.com/a.apk"),
            "https://cdn.example.com/a.apk"
        );
    }
}
