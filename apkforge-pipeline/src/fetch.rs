//! Remote asset download

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{BuildError, Result};

/// Downloads remote resources into a build
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Writes the body at `url` to `dest`, replacing any existing file
    ///
    /// Returns the number of bytes written.
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64>;
}

/// Asset fetcher streaming over HTTP(S)
#[derive(Debug, Clone, Default)]
pub struct HttpAssetFetcher {
    client: Client,
}

impl HttpAssetFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Uses a preconfigured client (timeouts, proxies, user agent)
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AssetFetcher for HttpAssetFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64> {
        info!("Downloading {} to {}", url, dest.display());

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| BuildError::fetch(url, e))?;

        if !response.status().is_success() {
            return Err(BuildError::fetch(
                url,
                format!("server responded with status {}", response.status()),
            ));
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| BuildError::workspace(parent, e))?;
        }

        // Stream into a sibling temp file, then move it over the destination
        let tmp = dest.with_extension(format!("tmp-{}", Uuid::new_v4()));
        let written = match stream_to_file(response, &tmp, url).await {
            Ok(written) => written,
            Err(e) => {
                let _ = tokio::fs::remove_file(&tmp).await;
                return Err(e);
            }
        };

        tokio::fs::rename(&tmp, dest)
            .await
            .map_err(|e| BuildError::workspace(dest, e))?;

        debug!("Downloaded {} byte(s) from {}", written, url);
        Ok(written)
    }
}

async fn stream_to_file(response: reqwest::Response, path: &Path, url: &str) -> Result<u64> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| BuildError::workspace(path, e))?;

    let mut written = 0u64;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| BuildError::fetch(url, e))?;
        file.write_all(&chunk)
            .await
            .map_err(|e| BuildError::workspace(path, e))?;
        written += chunk.len() as u64;
    }

    file.flush()
        .await
        .map_err(|e| BuildError::workspace(path, e))?;
    file.sync_all()
        .await
        .map_err(|e| BuildError::workspace(path, e))?;

    Ok(written)
}
