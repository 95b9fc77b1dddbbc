//! Store error types.
//!
//! Every variant names the path it failed on so a failed tree walk can be
//! diagnosed from the message alone. Tokens never appear in messages.

/// Errors that can occur while talking to a secret store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The request never completed (connection refused, TLS failure, timeout).
    #[error("{operation} '{path}' failed: {reason}")]
    Transport {
        operation: &'static str,
        path: String,
        reason: String,
    },

    /// The store answered with an error status.
    #[error("{operation} '{path}' returned {status}: {message}")]
    Api {
        operation: &'static str,
        path: String,
        status: u16,
        message: String,
    },

    /// The store rejected the credentials for this request.
    #[error("permission denied for {operation} '{path}'")]
    Denied {
        operation: &'static str,
        path: String,
    },

    /// The store answered but the body could not be understood.
    #[error("unexpected response to {operation} '{path}': {reason}")]
    Decode {
        operation: &'static str,
        path: String,
        reason: String,
    },
}

impl StoreError {
    /// The path the failed request targeted.
    pub fn path(&self) -> &str {
        match self {
            Self::Transport { path, .. }
            | Self::Api { path, .. }
            | Self::Denied { path, .. }
            | Self::Decode { path, .. } => path,
        }
    }
}
