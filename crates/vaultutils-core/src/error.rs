//! Error types for `vaultutils-core`.
//!
//! Each error variant carries enough context to diagnose the problem without
//! a debugger. Tokens and secret values never appear in messages.

use vaultutils_store::StoreError;

/// Errors from secret path validation.
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// The path does not start with the required mount prefix.
    #[error("path '{path}' must begin with '{prefix}'")]
    MissingPrefix { path: String, prefix: String },
}

/// Errors from building a [`VaultConfig`](crate::config::VaultConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required setting was not supplied by flag or environment.
    #[error(
        "missing {field}: all of Vault URL, token, and CA certificate path are required \
         (pass --{flag} or set {env})"
    )]
    Missing {
        field: &'static str,
        flag: &'static str,
        env: &'static str,
    },
}

/// Errors from recursive tree deletion.
#[derive(Debug, thiserror::Error)]
pub enum DeleteError {
    /// The root path was rejected before any store call.
    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathError),

    /// The store does not accept the configured credentials.
    #[error("secret store rejected the configured credentials")]
    Authentication,

    /// A listing returned a child key that would resolve back to its parent.
    #[error("listing of '{path}' returned unusable child key {key:?}")]
    MalformedListing { path: String, key: String },

    /// A list or delete call failed; the walk stopped there.
    #[error("secret store unavailable")]
    StoreUnavailable(#[from] StoreError),
}

/// Errors from reading an external secret source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// No secret with this name exists in the source.
    #[error("secret '{name}' not found at '{location}'")]
    NotFound { name: String, location: String },

    /// The source could not be read.
    #[error("failed to read '{location}': {reason}")]
    Read { location: String, reason: String },

    /// The source was read but is not a usable secret document.
    #[error("invalid secret document '{location}': {reason}")]
    Parse { location: String, reason: String },

    /// A value could not be decoded to UTF-8 text.
    #[error("secret '{name}' key '{key}' could not be decoded: {reason}")]
    Decode {
        name: String,
        key: String,
        reason: String,
    },

    /// The secret belongs to a different namespace than requested.
    #[error("secret '{name}' is in namespace '{found}', expected '{expected}'")]
    Namespace {
        name: String,
        expected: String,
        found: String,
    },
}

/// Errors from copying an external secret into the store.
#[derive(Debug, thiserror::Error)]
pub enum CopyError {
    /// The destination path was rejected before any store call.
    #[error("invalid destination: {0}")]
    InvalidPath(#[from] PathError),

    /// The store does not accept the configured credentials.
    #[error("secret store rejected the configured credentials")]
    Authentication,

    /// The source secret could not be read.
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// A source key cannot be used as a path segment.
    #[error("source key {key:?} cannot be used as a secret path segment")]
    MalformedKey { key: String },

    /// A write call failed; keys after it were not copied.
    #[error("secret store unavailable")]
    StoreUnavailable(#[from] StoreError),
}

/// Errors from scoped token administration.
#[derive(Debug, thiserror::Error)]
pub enum TokenAdminError {
    /// The verb is neither `create` nor `revoke`.
    #[error("verb must be either 'create' or 'revoke', got '{verb}'")]
    InvalidVerb { verb: String },

    /// The target path was rejected before any store call.
    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathError),

    /// Tokens cannot be scoped to the whole mount.
    #[error("refusing to manage tokens for the mount root '{path}'")]
    MountRoot { path: String },

    /// The store does not accept the configured credentials.
    #[error("secret store rejected the configured credentials")]
    Authentication,

    /// Tokens for this path were already issued and not revoked.
    #[error("{role} token for '{path}' already exists at '{record}'")]
    AlreadyIssued {
        path: String,
        role: &'static str,
        record: String,
    },

    /// A stored token record is missing its accessor.
    #[error("token record at '{record}' has no accessor")]
    MalformedRecord { record: String },

    /// A store or token call failed.
    #[error("secret store unavailable")]
    StoreUnavailable(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    fn denied() -> StoreError {
        StoreError::Denied {
            operation: "delete",
            path: "secret/app/db".to_owned(),
        }
    }

    #[test]
    fn store_failure_is_reported_once_in_the_chain() {
        for err in [
            Box::new(DeleteError::from(denied())) as Box<dyn std::error::Error>,
            Box::new(CopyError::from(denied())),
            Box::new(TokenAdminError::from(denied())),
        ] {
            let top = err.to_string();
            assert_eq!(top, "secret store unavailable");
            let cause = err.source().map(ToString::to_string);
            assert_eq!(
                cause.as_deref(),
                Some("permission denied for delete 'secret/app/db'")
            );
        }
    }
}
