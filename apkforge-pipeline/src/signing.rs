//! Signing material provisioning
//!
//! Every build gets a fresh throwaway keystore and a `key.properties` file
//! pointing the Gradle release signing config at it.

use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::config::SigningSettings;
use crate::error::{BuildError, Result};
use crate::toolchain::{Invocation, Toolchain};

/// Files produced for the release signing config
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningMaterial {
    pub keystore: PathBuf,
    pub properties: PathBuf,
}

pub struct SigningProvisioner<'a> {
    settings: &'a SigningSettings,
}

impl<'a> SigningProvisioner<'a> {
    pub fn new(settings: &'a SigningSettings) -> Self {
        Self { settings }
    }

    /// Arguments of the keystore generation command
    pub fn keytool_args(&self, keystore: &Path) -> Vec<String> {
        let s = self.settings;
        vec![
            "-genkeypair".to_string(),
            "-v".to_string(),
            "-keystore".to_string(),
            keystore.to_string_lossy().to_string(),
            "-alias".to_string(),
            s.key_alias.clone(),
            "-keyalg".to_string(),
            "RSA".to_string(),
            "-keysize".to_string(),
            "2048".to_string(),
            "-validity".to_string(),
            s.validity_days.to_string(),
            "-storepass".to_string(),
            s.password.clone(),
            "-keypass".to_string(),
            s.password.clone(),
            "-dname".to_string(),
            s.distinguished_name.clone(),
        ]
    }

    /// Contents of `key.properties`
    ///
    /// `storeFile` is resolved by Gradle relative to the app module, which
    /// is where the keystore is generated.
    pub fn key_properties(&self, keystore: &Path) -> String {
        let store_file = keystore
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        format!(
            "storePassword={}\nkeyPassword={}\nkeyAlias={}\nstoreFile={}\n",
            self.settings.password, self.settings.password, self.settings.key_alias, store_file
        )
    }

    /// Generates the keystore and writes the properties file
    ///
    /// `keytool` carries the program, working directory, environment and
    /// timeout; the generation arguments are appended here.
    pub async fn provision(
        &self,
        toolchain: &dyn Toolchain,
        keytool: Invocation,
    ) -> Result<SigningMaterial> {
        let project_dir = keytool.working_dir.clone();
        let keystore = project_dir.join(&self.settings.keystore_path);
        let properties = project_dir.join(&self.settings.key_properties_path);

        // keytool refuses to add an alias that already exists
        match tokio::fs::remove_file(&keystore).await {
            Ok(()) => info!("Replaced existing keystore {}", keystore.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(BuildError::Provisioning(format!(
                    "cannot remove stale keystore {}: {}",
                    keystore.display(),
                    e
                )));
            }
        }

        if let Some(parent) = keystore.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                BuildError::Provisioning(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }

        let invocation = keytool.args(self.keytool_args(&keystore));
        if let Err(e) = toolchain.run(&invocation).await {
            if let Some(stderr) = e.stderr() {
                error!("keytool output: {}", stderr.trim());
            }
            return Err(BuildError::Provisioning(e.to_string()));
        }

        if !tokio::fs::try_exists(&keystore).await.unwrap_or(false) {
            return Err(BuildError::Provisioning(format!(
                "keytool did not create {}",
                keystore.display()
            )));
        }

        tokio::fs::write(&properties, self.key_properties(&keystore))
            .await
            .map_err(|e| {
                BuildError::Provisioning(format!("cannot write {}: {}", properties.display(), e))
            })?;

        info!("Generated signing keystore {}", keystore.display());
        Ok(SigningMaterial {
            keystore,
            properties,
        })
    }
}
