//! In-memory secret store for testing.
//!
//! Secrets live in a `BTreeMap` behind a `RwLock`; folders are implicit, the
//! same way Vault's KV engine derives them from the keys below a path. Also
//! keeps policies and issued tokens so [`TokenAuthority`] flows can be
//! exercised without a server.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{IssuedToken, SecretData, SecretStore, StoreError, TokenAuthority};

#[derive(Debug, Clone)]
struct TokenRecord {
    id: String,
    policies: Vec<String>,
    display_name: String,
}

#[derive(Debug)]
struct Inner {
    secrets: BTreeMap<String, SecretData>,
    policies: BTreeMap<String, String>,
    /// Keyed by accessor.
    tokens: BTreeMap<String, TokenRecord>,
    authenticated: bool,
}

/// An in-memory store backed by `BTreeMap`s.
///
/// Cloning shares state, so a test can keep a handle for assertions after
/// handing an `Arc` of it to the code under test.
///
/// # Examples
///
/// ```
/// # use vaultutils_store::{MemoryStore, SecretStore};
/// # #[tokio::main]
/// # async fn main() {
/// let store = MemoryStore::new();
/// store.insert("secret/app/db", [("value", "hunter2")]).await;
/// let children = store.list("secret/app").await.unwrap();
/// assert_eq!(children, Some(vec!["db".to_owned()]));
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    /// Create an empty store that accepts its credentials.
    #[must_use]
    pub fn new() -> Self {
        Self::with_authentication(true)
    }

    /// Create an empty store whose credentials are rejected.
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self::with_authentication(false)
    }

    fn with_authentication(authenticated: bool) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                secrets: BTreeMap::new(),
                policies: BTreeMap::new(),
                tokens: BTreeMap::new(),
                authenticated,
            })),
        }
    }

    /// Seed a secret from `(key, value)` pairs.
    pub async fn insert<'a, I>(&self, path: &str, pairs: I)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let data = pairs
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        self.inner.write().await.secrets.insert(path.to_owned(), data);
    }

    /// Every secret path currently stored, sorted.
    pub async fn paths(&self) -> Vec<String> {
        self.inner.read().await.secrets.keys().cloned().collect()
    }

    /// The rules of policy `name`, if it exists.
    pub async fn policy(&self, name: &str) -> Option<String> {
        self.inner.read().await.policies.get(name).cloned()
    }

    /// Names of all stored policies, sorted.
    pub async fn policy_names(&self) -> Vec<String> {
        self.inner.read().await.policies.keys().cloned().collect()
    }

    /// Accessors of all live tokens, sorted.
    pub async fn token_accessors(&self) -> Vec<String> {
        self.inner.read().await.tokens.keys().cloned().collect()
    }

    /// Policies attached to the live token with the given id.
    pub async fn token_policies(&self, id: &str) -> Option<Vec<String>> {
        self.inner
            .read()
            .await
            .tokens
            .values()
            .find(|t| t.id == id)
            .map(|t| t.policies.clone())
    }

    /// Display name of the live token with the given accessor.
    pub async fn token_display_name(&self, accessor: &str) -> Option<String> {
        self.inner
            .read()
            .await
            .tokens
            .get(accessor)
            .map(|t| t.display_name.clone())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SecretStore for MemoryStore {
    async fn list(&self, path: &str) -> Result<Option<Vec<String>>, StoreError> {
        let inner = self.inner.read().await;
        let trimmed = path.trim_end_matches('/');
        let prefix = if trimmed.is_empty() {
            String::new()
        } else {
            format!("{trimmed}/")
        };

        let children: BTreeSet<String> = inner
            .secrets
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .filter_map(|(k, _)| {
                let rest = &k[prefix.len()..];
                match rest.find('/') {
                    Some(0) => None,
                    Some(i) => Some(rest[..=i].to_owned()),
                    None if rest.is_empty() => None,
                    None => Some(rest.to_owned()),
                }
            })
            .collect();

        if children.is_empty() {
            Ok(None)
        } else {
            Ok(Some(children.into_iter().collect()))
        }
    }

    async fn read(&self, path: &str) -> Result<Option<SecretData>, StoreError> {
        Ok(self.inner.read().await.secrets.get(path).cloned())
    }

    async fn write(&self, path: &str, data: &SecretData) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .secrets
            .insert(path.to_owned(), data.clone());
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        self.inner.write().await.secrets.remove(path);
        Ok(())
    }

    async fn is_authenticated(&self) -> Result<bool, StoreError> {
        Ok(self.inner.read().await.authenticated)
    }
}

#[async_trait::async_trait]
impl TokenAuthority for MemoryStore {
    async fn write_policy(&self, name: &str, rules: &str) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .policies
            .insert(name.to_owned(), rules.to_owned());
        Ok(())
    }

    async fn delete_policy(&self, name: &str) -> Result<(), StoreError> {
        self.inner.write().await.policies.remove(name);
        Ok(())
    }

    async fn create_token(
        &self,
        policies: &[String],
        display_name: &str,
    ) -> Result<IssuedToken, StoreError> {
        let issued = IssuedToken {
            id: format!("s.{}", uuid::Uuid::new_v4().simple()),
            accessor: uuid::Uuid::new_v4().simple().to_string(),
        };
        self.inner.write().await.tokens.insert(
            issued.accessor.clone(),
            TokenRecord {
                id: issued.id.clone(),
                policies: policies.to_vec(),
                display_name: display_name.to_owned(),
            },
        );
        tracing::debug!(display_name, "memory store issued token");
        Ok(issued)
    }

    async fn revoke_accessor(&self, accessor: &str) -> Result<(), StoreError> {
        let removed = self.inner.write().await.tokens.remove(accessor);
        if removed.is_none() {
            return Err(StoreError::Api {
                operation: "revoke",
                path: format!("auth/token/accessor/{accessor}"),
                status: 400,
                message: "invalid accessor".to_owned(),
            });
        }
        Ok(())
    }
}
