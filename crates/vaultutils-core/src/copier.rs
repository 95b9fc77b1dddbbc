//! Copies an external secret into the store.
//!
//! Every key of the source secret becomes its own store entry at
//! `<destination>/<key>`, holding `{"value": <decoded value>}`.

use std::sync::Arc;

use tracing::{debug, info};
use vaultutils_store::{SecretData, SecretStore};

use crate::error::CopyError;
use crate::path::{DEFAULT_MOUNT_PREFIX, SecretPath};
use crate::source::SecretSource;

/// Copies secrets from a [`SecretSource`] into a [`SecretStore`].
pub struct SecretCopier {
    store: Arc<dyn SecretStore>,
    source: Arc<dyn SecretSource>,
    mount_prefix: String,
}

impl SecretCopier {
    /// Pair `store` with `source`, checking that the store accepts its
    /// credentials.
    ///
    /// # Errors
    ///
    /// - [`CopyError::Authentication`] if the store rejects the credentials.
    /// - [`CopyError::StoreUnavailable`] if the check itself fails.
    pub async fn connect(
        store: Arc<dyn SecretStore>,
        source: Arc<dyn SecretSource>,
    ) -> Result<Self, CopyError> {
        if !store.is_authenticated().await? {
            return Err(CopyError::Authentication);
        }
        Ok(Self {
            store,
            source,
            mount_prefix: DEFAULT_MOUNT_PREFIX.to_owned(),
        })
    }

    /// Require destinations to live under `prefix` instead of `secret/`.
    #[must_use]
    pub fn with_mount_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.mount_prefix = prefix.into();
        self
    }

    /// Copy source secret `name` to `destination`. Returns the number of
    /// keys written.
    ///
    /// The source is read in full before anything is written, so a decode
    /// failure leaves the store untouched. A failed write stops the copy.
    ///
    /// # Errors
    ///
    /// - [`CopyError::InvalidPath`] if `destination` lacks the mount prefix.
    /// - [`CopyError::Source`] if the source secret can't be read.
    /// - [`CopyError::MalformedKey`] if a key is empty or contains `/`.
    /// - [`CopyError::StoreUnavailable`] on the first failed write.
    pub async fn copy(&self, name: &str, destination: &str) -> Result<usize, CopyError> {
        let destination = SecretPath::parse(destination, &self.mount_prefix)?;
        let secret = self.source.read_secret(name).await?;

        if let Some(key) = secret.keys().find(|k| k.is_empty() || k.contains('/')) {
            return Err(CopyError::MalformedKey { key: key.clone() });
        }

        for (key, value) in &secret {
            let target = destination.child(key);
            let data = SecretData::from([("value".to_owned(), value.clone())]);
            debug!(path = %target, "writing secret key");
            self.store.write(target.as_str(), &data).await?;
        }

        info!(source = name, destination = %destination, keys = secret.len(), "secret copied");
        Ok(secret.len())
    }
}
