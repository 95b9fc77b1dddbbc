//! `VaultClient` implementation.

use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;
use vaultutils_core::VaultConfig;
use vaultutils_store::{IssuedToken, SecretData, SecretStore, StoreError, TokenAuthority};

use crate::error::ClientError;
use crate::types::{
    ApiErrorBody, AuthResponse, ListResponse, ReadResponse, value_to_string,
};

const TOKEN_HEADER: &str = "X-Vault-Token";

/// A Vault HTTP API client bound to one address and token.
pub struct VaultClient {
    http: reqwest::Client,
    addr: String,
    token: String,
}

impl VaultClient {
    /// Build a client for `addr`, trusting `ca_pem` in addition to the
    /// platform roots when given.
    ///
    /// # Errors
    ///
    /// - [`ClientError::CaCertificate`] if `ca_pem` is not a PEM certificate.
    /// - [`ClientError::Http`] if the HTTP client can't be built.
    pub fn new(
        addr: impl Into<String>,
        token: impl Into<String>,
        ca_pem: Option<&[u8]>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("vaultutils/", env!("CARGO_PKG_VERSION")));

        if let Some(pem) = ca_pem {
            let cert = reqwest::Certificate::from_pem(pem).map_err(|e| {
                ClientError::CaCertificate {
                    path: "<inline>".to_owned(),
                    reason: e.to_string(),
                }
            })?;
            builder = builder.add_root_certificate(cert);
        }

        Ok(Self {
            http: builder.build()?,
            addr: addr.into().trim_end_matches('/').to_owned(),
            token: token.into(),
        })
    }

    /// Build a client from a [`VaultConfig`], reading its CA file.
    ///
    /// # Errors
    ///
    /// - [`ClientError::CaCertificate`] if the CA file can't be read or parsed.
    /// - [`ClientError::Http`] if the HTTP client can't be built.
    pub fn from_config(config: &VaultConfig) -> Result<Self, ClientError> {
        let path = config.ca_cert.display().to_string();
        let pem = std::fs::read(&config.ca_cert).map_err(|e| ClientError::CaCertificate {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        Self::new(&config.url, &config.token, Some(&pem), config.timeout).map_err(|e| match e {
            ClientError::CaCertificate { reason, .. } => ClientError::CaCertificate { path, reason },
            other => other,
        })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Each segment is percent-encoded so keys holding `#`, `?` or `%`
    /// address the secret they name.
    fn url(&self, path: &str) -> String {
        let encoded: Vec<_> = path
            .trim_start_matches('/')
            .split('/')
            .map(urlencoding::encode)
            .collect();
        format!("{}/v1/{}", self.addr, encoded.join("/"))
    }

    /// Send one request. `Ok(None)` means the server answered 404.
    async fn send(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Option<Value>, StoreError> {
        let mut req = self
            .http
            .request(method, self.url(path))
            .header(TOKEN_HEADER, &self.token);
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(b) = body {
            req = req.json(b);
        }

        let resp = req.send().await.map_err(|e| StoreError::Transport {
            operation,
            path: path.to_owned(),
            reason: if e.is_timeout() {
                "request timed out".to_owned()
            } else {
                e.to_string()
            },
        })?;

        let status = resp.status();
        debug!(operation, path, status = status.as_u16(), "vault response");

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(StoreError::Denied {
                operation,
                path: path.to_owned(),
            });
        }

        let text = resp.text().await.map_err(|e| StoreError::Transport {
            operation,
            path: path.to_owned(),
            reason: e.to_string(),
        })?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .ok()
                .map(|b| b.errors.join("; "))
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(StoreError::Api {
                operation,
                path: path.to_owned(),
                status: status.as_u16(),
                message,
            });
        }

        if text.is_empty() {
            return Ok(Some(Value::Null));
        }
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| StoreError::Decode {
                operation,
                path: path.to_owned(),
                reason: e.to_string(),
            })
    }

    fn decode<T: DeserializeOwned>(
        operation: &'static str,
        path: &str,
        value: Value,
    ) -> Result<T, StoreError> {
        serde_json::from_value(value).map_err(|e| StoreError::Decode {
            operation,
            path: path.to_owned(),
            reason: e.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl SecretStore for VaultClient {
    async fn list(&self, path: &str) -> Result<Option<Vec<String>>, StoreError> {
        match self
            .send("list", Method::GET, path, &[("list", "true")], None)
            .await?
        {
            Some(value) => {
                let resp: ListResponse = Self::decode("list", path, value)?;
                Ok(Some(resp.data.keys))
            }
            None => Ok(None),
        }
    }

    async fn read(&self, path: &str) -> Result<Option<SecretData>, StoreError> {
        match self.send("read", Method::GET, path, &[], None).await? {
            Some(value) => {
                let resp: ReadResponse = Self::decode("read", path, value)?;
                Ok(Some(
                    resp.data
                        .into_iter()
                        .map(|(k, v)| (k, value_to_string(v)))
                        .collect(),
                ))
            }
            None => Ok(None),
        }
    }

    async fn write(&self, path: &str, data: &SecretData) -> Result<(), StoreError> {
        let body = json!(data);
        self.send("write", Method::POST, path, &[], Some(&body))
            .await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        self.send("delete", Method::DELETE, path, &[], None).await?;
        Ok(())
    }

    async fn is_authenticated(&self) -> Result<bool, StoreError> {
        match self
            .send("lookup", Method::GET, "auth/token/lookup-self", &[], None)
            .await
        {
            Ok(found) => Ok(found.is_some()),
            Err(StoreError::Denied { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[async_trait::async_trait]
impl TokenAuthority for VaultClient {
    async fn write_policy(&self, name: &str, rules: &str) -> Result<(), StoreError> {
        let body = json!({ "policy": rules });
        self.send(
            "write policy",
            Method::PUT,
            &format!("sys/policy/{name}"),
            &[],
            Some(&body),
        )
        .await?;
        Ok(())
    }

    async fn delete_policy(&self, name: &str) -> Result<(), StoreError> {
        self.send(
            "delete policy",
            Method::DELETE,
            &format!("sys/policy/{name}"),
            &[],
            None,
        )
        .await?;
        Ok(())
    }

    async fn create_token(
        &self,
        policies: &[String],
        display_name: &str,
    ) -> Result<IssuedToken, StoreError> {
        let path = "auth/token/create";
        let body = json!({ "policies": policies, "display_name": display_name });
        let value = self
            .send("create token", Method::POST, path, &[], Some(&body))
            .await?
            .ok_or_else(|| StoreError::Api {
                operation: "create token",
                path: path.to_owned(),
                status: 404,
                message: "token auth method not mounted".to_owned(),
            })?;
        let resp: AuthResponse = Self::decode("create token", path, value)?;
        Ok(IssuedToken {
            id: resp.auth.client_token,
            accessor: resp.auth.accessor,
        })
    }

    async fn revoke_accessor(&self, accessor: &str) -> Result<(), StoreError> {
        let body = json!({ "accessor": accessor });
        self.send(
            "revoke token",
            Method::POST,
            "auth/token/revoke-accessor",
            &[],
            Some(&body),
        )
        .await?;
        Ok(())
    }
}
