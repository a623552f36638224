//! ID resolver module
//!
//! Lets users name a build by a short, unambiguous prefix of its id
//! instead of the full UUID.

use anyhow::{Context, Result, anyhow};
use apkforge_client::ApkforgeClient;
use uuid::Uuid;

/// Resolve a build ID or prefix to a full UUID
///
/// A full UUID is returned as is, without asking the server. Otherwise the
/// build list is fetched and searched for a single build whose ID starts
/// with the prefix.
pub async fn resolve_build_id(client: &ApkforgeClient, input: &str) -> Result<Uuid> {
    if let Ok(uuid) = Uuid::parse_str(input) {
        return Ok(uuid);
    }

    let builds = client
        .list_builds()
        .await
        .context("Failed to fetch builds for ID resolution")?;

    match_prefix(builds.builds.iter().map(|b| b.build_id), input)
}

/// Pick the single ID starting with `prefix` (case-insensitive)
fn match_prefix(ids: impl IntoIterator<Item = Uuid>, prefix: &str) -> Result<Uuid> {
    let prefix = prefix.trim().to_lowercase();
    if prefix.is_empty() {
        return Err(anyhow!("Build ID cannot be empty"));
    }

    let matches: Vec<Uuid> = ids
        .into_iter()
        .filter(|id| id.to_string().starts_with(&prefix))
        .collect();

    match matches.as_slice() {
        [] => Err(anyhow!("No build found with ID starting with '{}'", prefix)),
        [id] => Ok(*id),
        _ => {
            let ids: Vec<String> = matches.iter().map(Uuid::to_string).collect();
            Err(anyhow!(
                "Ambiguous prefix '{}' matches multiple builds: {}",
                prefix,
                ids.join(", ")
            ))
        }
    }
}
