//! Secret store abstraction for `vaultutils`.
//!
//! This crate defines the [`SecretStore`] trait, the hierarchical key-value
//! interface every tool in `vaultutils-core` talks to, and the
//! [`TokenAuthority`] trait for issuing and revoking scoped tokens. The HTTP
//! implementation lives in `vaultutils-client`; [`MemoryStore`] implements
//! both traits in memory for tests and dry runs.
//!
//! Paths are UTF-8 strings using `/` as a separator (e.g.
//! `secret/myapp/db/password`). A path with children is a "folder"; listing
//! it returns the immediate child names, with a trailing `/` on names that
//! are themselves folders.

mod error;
mod memory;

use std::collections::BTreeMap;

pub use error::StoreError;
pub use memory::MemoryStore;

/// The key/value payload stored at a single secret path.
pub type SecretData = BTreeMap<String, String>;

/// A hierarchical secret store.
///
/// Implementations must be safe to share across async tasks (`Send + Sync`).
#[async_trait::async_trait]
pub trait SecretStore: Send + Sync + 'static {
    /// List the immediate children of `path`.
    ///
    /// Returns `Ok(None)` when the path has no children (a leaf, or nothing
    /// at all). `Ok(Some(vec![]))` is a distinct answer: the store reported a
    /// listing that happens to be empty.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store cannot be reached or refuses the
    /// request.
    async fn list(&self, path: &str) -> Result<Option<Vec<String>>, StoreError>;

    /// Read the data stored at exactly `path`.
    ///
    /// Returns `Ok(None)` if nothing is stored there.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store cannot be reached or refuses the
    /// request.
    async fn read(&self, path: &str) -> Result<Option<SecretData>, StoreError>;

    /// Write `data` at `path`, replacing whatever was there.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store cannot be reached or refuses the
    /// request.
    async fn write(&self, path: &str, data: &SecretData) -> Result<(), StoreError>;

    /// Delete the value stored at exactly `path`. Deleting a path that holds
    /// nothing is not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store cannot be reached or refuses the
    /// request.
    async fn delete(&self, path: &str) -> Result<(), StoreError>;

    /// Whether the credentials this store was built with are accepted.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] only for transport failures; a rejected
    /// credential is `Ok(false)`.
    async fn is_authenticated(&self) -> Result<bool, StoreError>;
}

/// A token issued by a [`TokenAuthority`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// The secret token value handed to clients.
    pub id: String,
    /// Non-secret handle that can revoke or look up the token.
    pub accessor: String,
}

/// Issues and revokes scoped access tokens, and manages the policies they
/// are bound to.
#[async_trait::async_trait]
pub trait TokenAuthority: Send + Sync + 'static {
    /// Create or replace the policy `name` with the given rules document.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the request fails.
    async fn write_policy(&self, name: &str, rules: &str) -> Result<(), StoreError>;

    /// Delete the policy `name`. Deleting a missing policy is not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the request fails.
    async fn delete_policy(&self, name: &str) -> Result<(), StoreError>;

    /// Issue a token bound to `policies`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the request fails.
    async fn create_token(
        &self,
        policies: &[String],
        display_name: &str,
    ) -> Result<IssuedToken, StoreError>;

    /// Revoke the token identified by `accessor`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the request fails.
    async fn revoke_accessor(&self, accessor: &str) -> Result<(), StoreError>;
}
