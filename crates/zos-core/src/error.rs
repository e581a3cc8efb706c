// ── Core error types ──
//
// User-facing errors from zos-core. Consumers never see HTTP status codes
// or JSON parse failures directly: the `From<zos_api::Error>` impl
// translates transport-layer errors into domain-appropriate variants.

use thiserror::Error;

use crate::normalized::{NormalizeError, SchemaError};

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach the zOS API at {url}: {reason}")]
    Connection { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Runtime is shut down")]
    Shutdown,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Entity not found: {kind} with key {key}")]
    NotFound { kind: String, key: String },

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Normalize error: {0}")]
    Normalize(#[from] NormalizeError),

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Chat SDK ─────────────────────────────────────────────────────
    #[error("Chat error: {message}")]
    Chat { message: String },

    // ── Local storage ────────────────────────────────────────────────
    #[error("Storage error: {message}")]
    Storage { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Whether the user must log in again.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<zos_api::Error> for CoreError {
    fn from(err: zos_api::Error) -> Self {
        match err {
            zos_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            zos_api::Error::Transport(ref e) => {
                if e.is_timeout() || e.is_connect() {
                    CoreError::Connection {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            zos_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            zos_api::Error::Tls(msg) => CoreError::Connection {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            zos_api::Error::Io(e) => CoreError::Storage {
                message: e.to_string(),
            },
            zos_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            zos_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::Storage {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Internal(format!("JSON error: {err}"))
    }
}
