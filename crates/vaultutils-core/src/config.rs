//! Connection settings for the secret store.
//!
//! The CLI merges flags with `VAULT_ADDR`, `VAULT_TOKEN`, and `VAULT_CAPATH`
//! before calling [`VaultConfig::from_options`]; nothing here reads the
//! environment itself.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Request timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything needed to reach and authenticate to the store.
#[derive(Clone)]
pub struct VaultConfig {
    /// Base URL of the Vault endpoint, e.g. `https://vault.example.com:8200`.
    pub url: String,
    /// Token sent with every request.
    pub token: String,
    /// PEM file holding the CA certificate that signed the server's cert.
    pub ca_cert: PathBuf,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl VaultConfig {
    /// Build a config from optional settings. Empty strings count as missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] naming the first absent setting; the
    /// URL, token, and CA path must all be present.
    pub fn from_options(
        url: Option<String>,
        token: Option<String>,
        ca_cert: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let url = non_empty(url).ok_or(ConfigError::Missing {
            field: "Vault URL",
            flag: "url",
            env: "VAULT_ADDR",
        })?;
        let token = non_empty(token).ok_or(ConfigError::Missing {
            field: "Vault token",
            flag: "token",
            env: "VAULT_TOKEN",
        })?;
        let ca_cert = ca_cert
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(ConfigError::Missing {
                field: "Vault CA certificate path",
                flag: "cacert",
                env: "VAULT_CAPATH",
            })?;

        Ok(Self {
            url: url.trim_end_matches('/').to_owned(),
            token,
            ca_cert,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Override the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultConfig")
            .field("url", &self.url)
            .field("token", &"[REDACTED]")
            .field("ca_cert", &self.ca_cert)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
