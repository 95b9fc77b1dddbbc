//! Scoped token administration.
//!
//! For a secret path, `create` issues three tokens (`read`, `write`,
//! `admin`), each bound to its own policy over `<path>/*`, and records the
//! token id and accessor under the admin prefix so an admin token can hand
//! them out later. `revoke` undoes all of it.
//!
//! Record layout: `<admin prefix>/<path below mount>/<role>` holding
//! `{ id, accessor, policy }`.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, info};
use vaultutils_store::{IssuedToken, SecretData, SecretStore, TokenAuthority};

use crate::error::TokenAdminError;
use crate::path::{DEFAULT_MOUNT_PREFIX, SecretPath};

/// Where token records are kept unless configured otherwise.
pub const DEFAULT_ADMIN_PREFIX: &str = "secret/admin/tokens";

/// The operation requested of [`TokenAdmin::execute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Create,
    Revoke,
}

impl FromStr for Verb {
    type Err = TokenAdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "create" => Ok(Self::Create),
            "revoke" => Ok(Self::Revoke),
            _ => Err(TokenAdminError::InvalidVerb { verb: s.to_owned() }),
        }
    }
}

/// One of the three access levels issued per path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRole {
    Read,
    Write,
    Admin,
}

impl TokenRole {
    pub const ALL: [Self; 3] = [Self::Read, Self::Write, Self::Admin];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Admin => "admin",
        }
    }

    /// Vault capabilities granted on `<path>/*`.
    pub fn capabilities(self) -> &'static [&'static str] {
        match self {
            Self::Read => &["read", "list"],
            Self::Write => &["create", "read", "update", "delete", "list"],
            Self::Admin => &["create", "read", "update", "delete", "list", "sudo"],
        }
    }
}

impl fmt::Display for TokenRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Creates and revokes the token trio for a path.
pub struct TokenAdmin {
    store: Arc<dyn SecretStore>,
    authority: Arc<dyn TokenAuthority>,
    mount_prefix: String,
    admin_prefix: String,
}

impl TokenAdmin {
    /// Wrap the store and token authority, checking the store accepts its
    /// credentials.
    ///
    /// # Errors
    ///
    /// - [`TokenAdminError::Authentication`] if the credentials are rejected.
    /// - [`TokenAdminError::StoreUnavailable`] if the check itself fails.
    pub async fn connect(
        store: Arc<dyn SecretStore>,
        authority: Arc<dyn TokenAuthority>,
    ) -> Result<Self, TokenAdminError> {
        if !store.is_authenticated().await? {
            return Err(TokenAdminError::Authentication);
        }
        Ok(Self {
            store,
            authority,
            mount_prefix: DEFAULT_MOUNT_PREFIX.to_owned(),
            admin_prefix: DEFAULT_ADMIN_PREFIX.to_owned(),
        })
    }

    /// Keep token records under `prefix` instead of `secret/admin/tokens`.
    #[must_use]
    pub fn with_admin_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.admin_prefix = prefix.into();
        self
    }

    /// Run `verb` (`create` or `revoke`, any case) against `path`.
    ///
    /// # Errors
    ///
    /// [`TokenAdminError::InvalidVerb`] for an unknown verb, otherwise
    /// whatever [`create`](Self::create) or [`revoke`](Self::revoke) return.
    pub async fn execute(&self, verb: &str, path: &str) -> Result<(), TokenAdminError> {
        match verb.parse::<Verb>()? {
            Verb::Create => self.create(path).await.map(|_| ()),
            Verb::Revoke => self.revoke(path).await.map(|_| ()),
        }
    }

    /// Issue the token trio for `path`.
    ///
    /// # Errors
    ///
    /// - [`TokenAdminError::InvalidPath`] / [`TokenAdminError::MountRoot`]
    ///   for an unusable path.
    /// - [`TokenAdminError::AlreadyIssued`] if any role already has a record.
    /// - [`TokenAdminError::StoreUnavailable`] if a store call fails.
    pub async fn create(
        &self,
        path: &str,
    ) -> Result<Vec<(TokenRole, IssuedToken)>, TokenAdminError> {
        let path = self.scoped_path(path)?;

        for role in TokenRole::ALL {
            let record = self.record_path(&path, role)?;
            if self.store.read(record.as_str()).await?.is_some() {
                return Err(TokenAdminError::AlreadyIssued {
                    path: path.to_string(),
                    role: role.as_str(),
                    record: record.to_string(),
                });
            }
        }

        let mut issued = Vec::with_capacity(TokenRole::ALL.len());
        for role in TokenRole::ALL {
            let policy = self.policy_name(&path, role);
            self.authority
                .write_policy(&policy, &policy_rules(&path, role))
                .await?;
            let token = self
                .authority
                .create_token(std::slice::from_ref(&policy), &policy)
                .await?;

            let record = self.record_path(&path, role)?;
            let data = SecretData::from([
                ("id".to_owned(), token.id.clone()),
                ("accessor".to_owned(), token.accessor.clone()),
                ("policy".to_owned(), policy.clone()),
            ]);
            self.store.write(record.as_str(), &data).await?;
            debug!(%role, %record, "token recorded");
            issued.push((role, token));
        }

        info!(path = %path, "token trio created");
        Ok(issued)
    }

    /// Revoke the token trio for `path` and remove its records and
    /// policies. Roles with no record are skipped. Returns how many tokens
    /// were revoked.
    ///
    /// # Errors
    ///
    /// - [`TokenAdminError::InvalidPath`] / [`TokenAdminError::MountRoot`]
    ///   for an unusable path.
    /// - [`TokenAdminError::MalformedRecord`] if a record has no accessor.
    /// - [`TokenAdminError::StoreUnavailable`] if a store call fails.
    pub async fn revoke(&self, path: &str) -> Result<usize, TokenAdminError> {
        let path = self.scoped_path(path)?;
        let mut revoked = 0;

        for role in TokenRole::ALL {
            let record = self.record_path(&path, role)?;
            if let Some(data) = self.store.read(record.as_str()).await? {
                let accessor = data.get("accessor").ok_or_else(|| {
                    TokenAdminError::MalformedRecord {
                        record: record.to_string(),
                    }
                })?;
                self.authority.revoke_accessor(accessor).await?;
                self.store.delete(record.as_str()).await?;
                revoked += 1;
                debug!(%role, %record, "token revoked");
            }
            self.authority
                .delete_policy(&self.policy_name(&path, role))
                .await?;
        }

        info!(path = %path, revoked, "token trio revoked");
        Ok(revoked)
    }

    /// Policy name for `role` on `path`: the path below the mount with `/`
    /// replaced by `.`, then `-<role>`.
    pub fn policy_name(&self, path: &SecretPath, role: TokenRole) -> String {
        format!(
            "{}-{role}",
            path.relative_to(&self.mount_prefix).replace('/', ".")
        )
    }

    fn scoped_path(&self, raw: &str) -> Result<SecretPath, TokenAdminError> {
        let path = SecretPath::parse(raw, &self.mount_prefix)?;
        if path.relative_to(&self.mount_prefix).is_empty() {
            return Err(TokenAdminError::MountRoot {
                path: raw.to_owned(),
            });
        }
        Ok(path)
    }

    fn record_path(
        &self,
        path: &SecretPath,
        role: TokenRole,
    ) -> Result<SecretPath, TokenAdminError> {
        let base = SecretPath::parse(&self.admin_prefix, &self.mount_prefix)?;
        Ok(base
            .child(path.relative_to(&self.mount_prefix))
            .child(role.as_str()))
    }
}

/// HCL policy granting `role`'s capabilities below `path`.
fn policy_rules(path: &SecretPath, role: TokenRole) -> String {
    let capabilities = role
        .capabilities()
        .iter()
        .map(|c| format!("\"{c}\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!("path \"{path}/*\" {{\n  capabilities = [{capabilities}]\n}}\n")
}
