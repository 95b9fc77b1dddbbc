//! External secret sources for [`SecretCopier`](crate::copier::SecretCopier).
//!
//! [`ManifestSource`] reads Kubernetes `Secret` manifests exported with
//! `kubectl get secret NAME -o json` from a directory. `data` values are
//! base64-decoded; `stringData` values are taken verbatim and win on
//! conflicts, matching how the API server merges them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use tracing::debug;
use vaultutils_store::SecretData;

use crate::error::SourceError;

/// Somewhere secrets can be read from by name.
#[async_trait::async_trait]
pub trait SecretSource: Send + Sync + 'static {
    /// Read the decoded key/value pairs of secret `name`.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] if the secret is missing or undecodable.
    async fn read_secret(&self, name: &str) -> Result<SecretData, SourceError>;
}

#[derive(Debug, Deserialize)]
struct SecretManifest {
    kind: Option<String>,
    #[serde(default)]
    metadata: ManifestMetadata,
    #[serde(default)]
    data: BTreeMap<String, String>,
    #[serde(default, rename = "stringData")]
    string_data: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct ManifestMetadata {
    name: Option<String>,
    namespace: Option<String>,
}

/// Reads `<dir>/<name>.json` Kubernetes secret manifests.
#[derive(Debug, Clone)]
pub struct ManifestSource {
    dir: PathBuf,
    namespace: Option<String>,
}

impl ManifestSource {
    /// Read manifests from `dir`, accepting any namespace.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            namespace: None,
        }
    }

    /// Only accept manifests whose `metadata.namespace` is `namespace`.
    #[must_use]
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    fn manifest_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }
}

#[async_trait::async_trait]
impl SecretSource for ManifestSource {
    async fn read_secret(&self, name: &str) -> Result<SecretData, SourceError> {
        let path = self.manifest_path(name);
        let location = path.display().to_string();

        let raw = tokio::fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SourceError::NotFound {
                    name: name.to_owned(),
                    location: location.clone(),
                }
            } else {
                SourceError::Read {
                    location: location.clone(),
                    reason: e.to_string(),
                }
            }
        })?;

        let manifest: SecretManifest =
            serde_json::from_str(&raw).map_err(|e| SourceError::Parse {
                location: location.clone(),
                reason: e.to_string(),
            })?;

        check_manifest(&manifest, name, &path, self.namespace.as_deref())?;
        let secret = decode_manifest(manifest, name)?;
        debug!(name, keys = secret.len(), "read secret manifest");
        Ok(secret)
    }
}

fn check_manifest(
    manifest: &SecretManifest,
    name: &str,
    path: &Path,
    namespace: Option<&str>,
) -> Result<(), SourceError> {
    let location = || path.display().to_string();

    if let Some(kind) = manifest.kind.as_deref() {
        if kind != "Secret" {
            return Err(SourceError::Parse {
                location: location(),
                reason: format!("expected kind 'Secret', found '{kind}'"),
            });
        }
    }
    if let Some(found) = manifest.metadata.name.as_deref() {
        if found != name {
            return Err(SourceError::Parse {
                location: location(),
                reason: format!("manifest describes secret '{found}', not '{name}'"),
            });
        }
    }
    if let Some(expected) = namespace {
        let found = manifest.metadata.namespace.as_deref().unwrap_or("default");
        if found != expected {
            return Err(SourceError::Namespace {
                name: name.to_owned(),
                expected: expected.to_owned(),
                found: found.to_owned(),
            });
        }
    }
    Ok(())
}

fn decode_manifest(manifest: SecretManifest, name: &str) -> Result<SecretData, SourceError> {
    let mut secret = SecretData::new();
    for (key, encoded) in manifest.data {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| SourceError::Decode {
                name: name.to_owned(),
                key: key.clone(),
                reason: e.to_string(),
            })?;
        let value = String::from_utf8(bytes).map_err(|e| SourceError::Decode {
            name: name.to_owned(),
            key: key.clone(),
            reason: e.to_string(),
        })?;
        secret.insert(key, value);
    }
    secret.extend(manifest.string_data);
    Ok(secret)
}
