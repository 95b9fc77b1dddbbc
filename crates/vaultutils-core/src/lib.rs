//! Core library for `vaultutils`.
//!
//! Three tools that operate on a [`SecretStore`](vaultutils_store::SecretStore)
//! injected by the caller:
//!
//! - [`deleter::TreeDeleter`] removes every secret at or below a path.
//! - [`copier::SecretCopier`] copies a Kubernetes secret into the store.
//! - [`token::TokenAdmin`] issues or revokes a trio of scoped tokens for a path.
//!
//! None of them holds state beyond the store handle; the HTTP client that
//! usually backs them lives in `vaultutils-client`.

pub mod config;
pub mod copier;
pub mod deleter;
pub mod error;
pub mod path;
pub mod source;
pub mod token;

pub use config::VaultConfig;
pub use copier::SecretCopier;
pub use deleter::{DeleteReport, TreeDeleter};
pub use path::{DEFAULT_MOUNT_PREFIX, SecretPath};
pub use source::{ManifestSource, SecretSource};
pub use token::{TokenAdmin, TokenRole, Verb};
