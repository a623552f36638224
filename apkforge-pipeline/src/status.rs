//! Build status derived from the builds root
//!
//! Nothing about a build is stored besides its directory: a directory with
//! an artifact file is completed, a directory without one is building.

use apkforge_core::domain::build::BuildStatus;
use chrono::{DateTime, Utc};
use std::io;
use std::time::SystemTime;
use tracing::warn;
use uuid::Uuid;

use crate::artifact::is_artifact_name;
use crate::workspace::Workspace;

/// A build found under the builds root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRecord {
    pub build_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub status: BuildStatus,
}

#[derive(Debug, Clone)]
pub struct StatusStore {
    workspace: Workspace,
}

impl StatusStore {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }

    /// Current status of one build
    ///
    /// Only immediate entries of the build directory are considered. When
    /// several artifacts exist the lexicographically smallest name wins.
    pub async fn status_of(&self, build_id: Uuid) -> io::Result<BuildStatus> {
        let dir = self.workspace.locate(build_id);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BuildStatus::NotFound),
            Err(e) if e.kind() == io::ErrorKind::NotADirectory => {
                return Ok(BuildStatus::NotFound);
            }
            Err(e) => return Err(e),
        };

        let mut artifact: Option<String> = None;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if !is_artifact_name(&name) || !entry.file_type().await?.is_file() {
                continue;
            }
            if artifact.as_ref().is_none_or(|current| name < *current) {
                artifact = Some(name);
            }
        }

        Ok(match artifact {
            Some(artifact_name) => BuildStatus::Completed { artifact_name },
            None => BuildStatus::Building,
        })
    }

    /// Every build under the root, newest first
    pub async fn list_all(&self) -> io::Result<Vec<BuildRecord>> {
        let mut entries = match tokio::fs::read_dir(self.workspace.root()).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(build_id) = name.to_str().and_then(|n| Uuid::parse_str(n).ok()) else {
                continue;
            };

            let metadata = entry.metadata().await?;
            if !metadata.is_dir() {
                continue;
            }
            let created = metadata
                .created()
                .or_else(|_| metadata.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);

            // A directory removed between the scan and the lookup is skipped
            let status = match self.status_of(build_id).await {
                Ok(BuildStatus::NotFound) => continue,
                Ok(status) => status,
                Err(e) => {
                    warn!("Cannot read build {}: {}", build_id, e);
                    continue;
                }
            };

            records.push(BuildRecord {
                build_id,
                created_at: DateTime::<Utc>::from(created),
                status,
            });
        }

        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}
