//! Errors from building a [`VaultClient`](crate::VaultClient).
//!
//! Request failures are reported as
//! [`StoreError`](vaultutils_store::StoreError) instead, so the tools in
//! `vaultutils-core` see one error type regardless of backend.

/// Errors that can occur while constructing the client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The CA certificate file could not be read or parsed.
    #[error("failed to load CA certificate '{path}': {reason}")]
    CaCertificate { path: String, reason: String },

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}
