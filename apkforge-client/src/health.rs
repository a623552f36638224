//! Health and index endpoints

use crate::ApkforgeClient;
use crate::error::Result;
use apkforge_core::dto::health::{ApiIndex, Health};

impl ApkforgeClient {
    /// Check that the server is up
    pub async fn health(&self) -> Result<Health> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Fetch the endpoint index served at the API root
    pub async fn index(&self) -> Result<ApiIndex> {
        let url = format!("{}/", self.base_url);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }
}
