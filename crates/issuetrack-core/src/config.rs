// ── Runtime connection configuration ──
//
// Describes how to reach the issue tracker server. Built by the CLI/TUI
// from issuetrack-config; core never reads config files itself.

use std::sync::Arc;
use std::time::Duration;

use issuetrack_api::{
    AlertHeaders, AlertSink, ApiClient, NotificationInterceptor, TlsMode, TransportConfig,
};
use secrecy::SecretString;
use url::Url;

use crate::error::CoreError;

/// Authority every issue route requires.
pub const ROLE_USER: &str = "ROLE_USER";

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed development servers).
    DangerAcceptInvalid,
}

/// Configuration for talking to one server.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server root, e.g. `http://localhost:8080/`.
    pub url: Url,
    /// Bearer token, if the server needs one.
    pub token: Option<SecretString>,
    /// Application name used in the alert header prefix.
    pub app_name: String,
    pub tls: TlsVerification,
    pub timeout: Duration,
    /// Authorities granted to the current user.
    pub authorities: Vec<String>,
    /// Language used for translations.
    pub language: String,
}

impl ClientConfig {
    /// Defaults for everything but the server URL.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            token: None,
            app_name: issuetrack_api::DEFAULT_APP_NAME.into(),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            authorities: vec![ROLE_USER.into()],
            language: "en".into(),
        }
    }

    pub fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
            bearer_token: self.token.clone(),
        }
    }

    pub fn alert_headers(&self) -> AlertHeaders {
        AlertHeaders::for_app(&self.app_name)
    }

    /// Build an API client whose success alerts go to `sink`.
    pub fn api_client(&self, sink: Option<Arc<dyn AlertSink>>) -> Result<ApiClient, CoreError> {
        let client = ApiClient::new(self.url.as_str(), &self.transport())?;
        Ok(match sink {
            Some(sink) => {
                client.with_interceptor(NotificationInterceptor::new(sink, self.alert_headers()))
            }
            None => client.with_alert_headers(self.alert_headers()),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn local() -> ClientConfig {
        ClientConfig::new(Url::parse("http://localhost:8080/").unwrap())
    }

    #[test]
    fn default_grants_role_user() {
        let config = local();
        assert_eq!(config.authorities, vec![ROLE_USER.to_string()]);
        assert_eq!(config.alert_headers().alert, "X-issueTrackerApp-alert");
    }

    #[test]
    fn transport_maps_tls_mode() {
        let config = ClientConfig {
            tls: TlsVerification::DangerAcceptInvalid,
            timeout: Duration::from_secs(5),
            ..local()
        };
        let transport = config.transport();
        assert!(matches!(transport.tls, TlsMode::DangerAcceptInvalid));
        assert_eq!(transport.timeout, Duration::from_secs(5));
    }

    #[test]
    fn api_client_keeps_base_url() {
        let client = local().api_client(None).unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:8080/");
    }
}
