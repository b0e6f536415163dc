//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError`, `RouteError` and `ConfigError` into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use issuetrack_config::ConfigError;
use issuetrack_core::{CoreError, RouteError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to server at {url}")]
    #[diagnostic(
        code(issuetrack::connection_failed),
        help(
            "Check that the server is running and accessible.\n\
             Use --insecure (-k) for self-signed certificates."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(issuetrack::auth_failed),
        help(
            "Verify your API token.\n\
             Run: issuetrack config set-token --profile {profile}"
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("Access to '{state}' requires {required}")]
    #[diagnostic(code(issuetrack::forbidden))]
    Forbidden { state: String, required: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("Issue '{identifier}' not found")]
    #[diagnostic(
        code(issuetrack::not_found),
        help("Run: issuetrack issues list to see available issues")
    )]
    NotFound { identifier: String },

    #[error("{message}")]
    #[diagnostic(code(issuetrack::conflict))]
    Conflict { message: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error ({code}): {message}")]
    #[diagnostic(code(issuetrack::api_error))]
    ApiError { code: String, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(issuetrack::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(issuetrack::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: issuetrack config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No server configured")]
    #[diagnostic(
        code(issuetrack::no_config),
        help(
            "Create a config with: issuetrack config init\n\
             Or pass --server. Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(issuetrack::config))]
    Config(#[from] ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(issuetrack::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(issuetrack::timeout),
        help("Increase timeout with --timeout or check server responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── IO / Other ───────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    #[diagnostic(code(issuetrack::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::Forbidden { .. } => exit_code::PERMISSION,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. }
            | Self::ProfileNotFound { .. }
            | Self::NoConfig { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed {
                profile: "default".into(),
                message,
            },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::NotFound { identifier } => CliError::NotFound { identifier },

            CoreError::InvalidDate { value } => CliError::Validation {
                field: "created".into(),
                reason: format!("{value:?} is not a YYYY-MM-DD date"),
            },

            CoreError::MissingId { operation } => CliError::Validation {
                field: "id".into(),
                reason: format!("an issue without id cannot be {operation}"),
            },

            CoreError::Attachment { path, reason } => CliError::Validation {
                field: "attachment".into(),
                reason: format!("{path}: {reason}"),
            },

            CoreError::Api {
                message,
                key,
                status,
                ..
            } => match (status, key) {
                (Some(400 | 409), Some(key)) => CliError::Conflict {
                    message: format!("{message} ({key})"),
                },
                (_, key) => CliError::ApiError {
                    code: key.unwrap_or_else(|| {
                        status.map_or_else(|| "unknown".into(), |s| s.to_string())
                    }),
                    message,
                },
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            err @ (CoreError::SaveInProgress
            | CoreError::Translation { .. }
            | CoreError::Internal(_)) => CliError::Internal(err.to_string()),
        }
    }
}

impl From<RouteError> for CliError {
    fn from(err: RouteError) -> Self {
        match err {
            RouteError::UnknownUrl { url } => CliError::NotFound { identifier: url },
            RouteError::Forbidden { state, required } => CliError::Forbidden {
                state: state.to_string(),
                required: required.join(", "),
            },
            RouteError::Resolve { source, .. } => source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_exit_code_4() {
        let err: CliError = CoreError::NotFound {
            identifier: "7".into(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
    }

    #[test]
    fn failure_key_becomes_conflict() {
        let err: CliError = CoreError::Api {
            message: "Bad Request".into(),
            key: Some("error.idexists".into()),
            params: Some("issue".into()),
            status: Some(400),
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::CONFLICT);
        assert!(err.to_string().contains("error.idexists"));
    }

    #[test]
    fn route_resolve_unwraps_source() {
        let err: CliError = RouteError::Resolve {
            state: issuetrack_core::StateName::IssueDetail,
            source: CoreError::Timeout { timeout_secs: 5 },
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::TIMEOUT);
    }
}
