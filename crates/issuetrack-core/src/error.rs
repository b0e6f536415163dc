// ── Core error types ──
//
// Errors surfaced to the CLI and TUI. Transport details (status codes,
// JSON failures) are folded into domain variants by the
// `From<issuetrack_api::Error>` impl below.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to server at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Issue not found: {identifier}")]
    NotFound { identifier: String },

    #[error("Invalid date {value:?}: expected YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("Issue has no id and cannot be {operation}")]
    MissingId { operation: &'static str },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("A save is already in progress")]
    SaveInProgress,

    #[error("Cannot attach {path}: {reason}")]
    Attachment { path: String, reason: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// Server failure key from the `X-<app>-error` header (e.g. `error.idexists`).
        key: Option<String>,
        /// Companion `X-<app>-params` value.
        params: Option<String>,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Translation / configuration errors ───────────────────────────
    #[error("Translation part {part:?} unavailable for language {language:?}: {reason}")]
    Translation {
        language: String,
        part: String,
        reason: String,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// The server-provided failure key, when there is one.
    pub fn error_key(&self) -> Option<&str> {
        match self {
            Self::Api { key, .. } => key.as_deref(),
            _ => None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<issuetrack_api::Error> for CoreError {
    fn from(err: issuetrack_api::Error) -> Self {
        match err {
            issuetrack_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            issuetrack_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        key: None,
                        params: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            issuetrack_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            issuetrack_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            issuetrack_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            issuetrack_api::Error::Api {
                status: 404,
                message,
                ..
            } => CoreError::NotFound {
                identifier: message,
            },
            issuetrack_api::Error::Api {
                status,
                message,
                error_key,
                params,
            } => CoreError::Api {
                message,
                key: error_key,
                params,
                status: Some(status),
            },
            issuetrack_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn api_not_found_maps_to_not_found() {
        let err = CoreError::from(issuetrack_api::Error::Api {
            status: 404,
            message: "/api/issues/9".into(),
            error_key: None,
            params: None,
        });
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[test]
    fn failure_key_survives_conversion() {
        let err = CoreError::from(issuetrack_api::Error::Api {
            status: 400,
            message: "A new issue cannot already have an ID".into(),
            error_key: Some("error.idexists".into()),
            params: Some("issue".into()),
        });
        assert_eq!(err.error_key(), Some("error.idexists"));
        assert!(matches!(err, CoreError::Api { status: Some(400), .. }));
    }

    #[test]
    fn authentication_is_preserved() {
        let err = CoreError::from(issuetrack_api::Error::Authentication {
            message: "server responded 401".into(),
        });
        assert!(err.to_string().contains("401"));
    }
}
