//! HTTP client for `vaultutils`.
//!
//! [`VaultClient`] implements [`SecretStore`](vaultutils_store::SecretStore)
//! and [`TokenAuthority`](vaultutils_store::TokenAuthority) against the Vault
//! HTTP API. Every call is a single request: no retries, no caching.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vaultutils_client::VaultClient;
//! use vaultutils_core::{TreeDeleter, VaultConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = VaultConfig::from_options(
//!     std::env::var("VAULT_ADDR").ok(),
//!     std::env::var("VAULT_TOKEN").ok(),
//!     std::env::var("VAULT_CAPATH").ok().map(Into::into),
//! )?;
//! let client = Arc::new(VaultClient::from_config(&config)?);
//! let deleter = TreeDeleter::connect(client).await?;
//! deleter.delete_tree("secret/old-app").await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod types;

pub use client::VaultClient;
pub use error::ClientError;
