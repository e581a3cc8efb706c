//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use zos_config::ConfigError;
use zos_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the zOS API at {url}")]
    #[diagnostic(
        code(zos::connection_failed),
        help(
            "Check the API URL and your network connection.\n\
             Reason: {reason}\n\
             Try: zos config show"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(zos::auth_failed),
        help(
            "The access token is missing or expired.\n\
             Run: zos auth login, or store a token with: zos config set-token"
        )
    )]
    AuthFailed { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(zos::not_found),
        help("Run: zos {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    #[diagnostic(code(zos::api_error))]
    ApiError { status: Option<u16>, message: String },

    #[error("Chat error: {message}")]
    #[diagnostic(code(zos::chat))]
    Chat { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(zos::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(zos::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: zos config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No configuration for this command")]
    #[diagnostic(
        code(zos::no_config),
        help(
            "Create one with: zos config init, or pass --api-url.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("No network selected")]
    #[diagnostic(
        code(zos::no_network),
        help("Pass --network or run: zos config set network_id <id>")
    )]
    NoNetwork,

    #[error(transparent)]
    #[diagnostic(code(zos::config))]
    Config(ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Prompt failed: {0}")]
    #[diagnostic(
        code(zos::prompt),
        help("Use --yes (-y) or pass values as arguments in non-interactive contexts.")
    )]
    Prompt(String),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(zos::json))]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(zos::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. }
            | Self::Prompt(_)
            | Self::NoNetwork
            | Self::ProfileNotFound { .. }
            | Self::NoConfig { .. }
            | Self::Config(_) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::ProfileNotFound { name } => Self::ProfileNotFound {
                name,
                available: "(none)".into(),
            },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config(other),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Connection { url, reason } => Self::ConnectionFailed { url, reason },

            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },

            CoreError::NotFound { kind, key } => Self::NotFound {
                list_command: format!("{kind} list"),
                resource_type: kind.trim_end_matches('s').to_owned(),
                identifier: key,
            },

            CoreError::Api { message, status } => Self::ApiError { status, message },

            CoreError::Chat { message } => Self::Chat { message },

            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Storage { message } => Self::Io(std::io::Error::other(message)),

            other @ (CoreError::Shutdown
            | CoreError::Schema(_)
            | CoreError::Normalize(_)
            | CoreError::Internal(_)) => Self::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_exit_with_auth_code() {
        let err = CliError::from(CoreError::AuthenticationFailed {
            message: "expired".into(),
        });
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }

    #[test]
    fn missing_entity_points_at_list_command() {
        let err = CliError::from(CoreError::NotFound {
            kind: "channels".into(),
            key: "c1".into(),
        });
        match err {
            CliError::NotFound {
                ref resource_type,
                ref list_command,
                ..
            } => {
                assert_eq!(resource_type, "channel");
                assert_eq!(list_command, "channels list");
            }
            ref other => panic!("unexpected {other:?}"),
        }
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
    }

    #[test]
    fn api_status_shows_in_message() {
        let err = CliError::from(CoreError::Api {
            message: "down".into(),
            status: Some(503),
        });
        assert_eq!(err.to_string(), "API error (503): down");
        assert_eq!(err.exit_code(), exit_code::GENERAL);
    }
}
