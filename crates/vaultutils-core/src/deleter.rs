//! Recursive deletion of a secret subtree.
//!
//! Each visited path is listed once and classified:
//!
//! - **children**: every child path is visited, in listing order, before
//!   the walk moves on to the node's later siblings. The node's own key is
//!   left in place; only leaves are deleted.
//! - **empty listing**: the store answered with a listing that has no keys.
//!   Nothing is deleted there.
//! - **no listing**: the path is a leaf (or holds nothing) and is deleted.
//!
//! The walk keeps its own stack of pending paths instead of recursing, so
//! tree depth is bounded by memory rather than the native stack. The first
//! failed store call ends the walk; nothing already deleted is restored.

use std::sync::Arc;

use tracing::{debug, info, warn};
use vaultutils_store::SecretStore;

use crate::error::DeleteError;
use crate::path::{DEFAULT_MOUNT_PREFIX, SecretPath, is_degenerate_key};

/// Counts from a completed deletion.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeleteReport {
    /// Paths that were listed.
    pub nodes_listed: usize,
    /// Leaf paths that received a delete call.
    pub leaves_deleted: usize,
    /// Paths whose listing was present but empty.
    pub empty_nodes: usize,
}

/// How a single `list` answer classifies a path.
#[derive(Debug, PartialEq, Eq)]
enum Listing {
    Absent,
    EmptyPresent,
    Children(Vec<String>),
}

impl From<Option<Vec<String>>> for Listing {
    fn from(keys: Option<Vec<String>>) -> Self {
        match keys {
            None => Self::Absent,
            Some(keys) if keys.is_empty() => Self::EmptyPresent,
            Some(keys) => Self::Children(keys),
        }
    }
}

/// Deletes every secret at or below a path.
pub struct TreeDeleter {
    store: Arc<dyn SecretStore>,
    mount_prefix: String,
}

impl TreeDeleter {
    /// Wrap `store`, checking that it accepts its credentials.
    ///
    /// # Errors
    ///
    /// - [`DeleteError::Authentication`] if the store rejects the credentials.
    /// - [`DeleteError::StoreUnavailable`] if the check itself fails.
    pub async fn connect(store: Arc<dyn SecretStore>) -> Result<Self, DeleteError> {
        if !store.is_authenticated().await? {
            return Err(DeleteError::Authentication);
        }
        Ok(Self {
            store,
            mount_prefix: DEFAULT_MOUNT_PREFIX.to_owned(),
        })
    }

    /// Require paths to live under `prefix` instead of `secret/`.
    #[must_use]
    pub fn with_mount_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.mount_prefix = prefix.into();
        self
    }

    pub fn mount_prefix(&self) -> &str {
        &self.mount_prefix
    }

    /// Delete `path` and everything under it.
    ///
    /// # Errors
    ///
    /// - [`DeleteError::InvalidPath`] if `path` lacks the mount prefix; no
    ///   store call is made.
    /// - [`DeleteError::MalformedListing`] if a listing contains a key that
    ///   would resolve back to its parent.
    /// - [`DeleteError::StoreUnavailable`] on the first failed list or delete
    ///   call. Leaves deleted before the failure stay deleted.
    pub async fn delete_tree(&self, path: &str) -> Result<DeleteReport, DeleteError> {
        let root = SecretPath::parse(path, &self.mount_prefix)?;
        debug!(path = %root, "removing recursively");

        let mut report = DeleteReport::default();
        let mut pending = vec![root.clone()];

        while let Some(current) = pending.pop() {
            let listing = Listing::from(self.store.list(current.as_str()).await?);
            report.nodes_listed += 1;

            match listing {
                Listing::Children(keys) => {
                    if let Some(key) = keys.iter().find(|k| is_degenerate_key(k)) {
                        return Err(DeleteError::MalformedListing {
                            path: current.to_string(),
                            key: key.clone(),
                        });
                    }
                    debug!(path = %current, children = keys.len(), "removing tree rooted here");
                    // Reversed so the first listed child is popped first.
                    pending.extend(keys.iter().rev().map(|key| current.child(key)));
                }
                Listing::EmptyPresent => {
                    warn!(path = %current, "listing is present but empty; leaving node untouched");
                    report.empty_nodes += 1;
                }
                Listing::Absent => {
                    debug!(path = %current, "removing as leaf node");
                    self.store.delete(current.as_str()).await?;
                    report.leaves_deleted += 1;
                }
            }
        }

        info!(
            path = %root,
            listed = report.nodes_listed,
            deleted = report.leaves_deleted,
            "secret tree removed"
        );
        Ok(report)
    }
}
