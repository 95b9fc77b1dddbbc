//! Wire types for the Vault HTTP API.

use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
pub(crate) struct ListResponse {
    pub data: ListData,
}

#[derive(Deserialize)]
pub(crate) struct ListData {
    #[serde(default)]
    pub keys: Vec<String>,
}

#[derive(Deserialize)]
pub(crate) struct ReadResponse {
    #[serde(default)]
    pub data: serde_json::Map<String, Value>,
}

#[derive(Deserialize)]
pub(crate) struct AuthResponse {
    pub auth: AuthData,
}

#[derive(Deserialize)]
pub(crate) struct AuthData {
    pub client_token: String,
    pub accessor: String,
}

#[derive(Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Vault values may be any JSON type; the tools only deal in strings.
pub(crate) fn value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
