//! Response alert bridge.
//!
//! The server attaches `X-<app>-alert` (a message key such as
//! `issueTrackerApp.issue.created`) and `X-<app>-params` (usually the entity
//! id) to successful mutations. [`NotificationInterceptor`] forwards that pair
//! to an [`AlertSink`] and hands the response back untouched.

use std::fmt;
use std::sync::Arc;

use reqwest::header::HeaderMap;
use tracing::trace;

/// Application name used in the alert header prefix.
pub const DEFAULT_APP_NAME: &str = "issueTrackerApp";

/// Receives success alerts surfaced by the server.
pub trait AlertSink: Send + Sync {
    fn success(&self, key: &str, param: Option<&str>);
}

/// Header names for one application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertHeaders {
    pub alert: String,
    pub params: String,
    pub error: String,
}

impl AlertHeaders {
    pub fn for_app(app_name: &str) -> Self {
        Self {
            alert: format!("X-{app_name}-alert"),
            params: format!("X-{app_name}-params"),
            error: format!("X-{app_name}-error"),
        }
    }
}

impl Default for AlertHeaders {
    fn default() -> Self {
        Self::for_app(DEFAULT_APP_NAME)
    }
}

/// Inspects successful responses for alert headers.
#[derive(Clone)]
pub struct NotificationInterceptor {
    sink: Arc<dyn AlertSink>,
    headers: AlertHeaders,
}

impl fmt::Debug for NotificationInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationInterceptor")
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

impl NotificationInterceptor {
    pub fn new(sink: Arc<dyn AlertSink>, headers: AlertHeaders) -> Self {
        Self { sink, headers }
    }

    pub fn headers(&self) -> &AlertHeaders {
        &self.headers
    }

    /// Forward any alert on `response` and return it unchanged.
    pub fn response(&self, response: reqwest::Response) -> reqwest::Response {
        self.inspect(response.headers());
        response
    }

    /// Forward the alert carried by `headers`, if any. Returns whether the
    /// sink was called.
    pub fn inspect(&self, headers: &HeaderMap) -> bool {
        // Only textual header values count as an alert key.
        let Some(key) = headers
            .get(self.headers.alert.as_str())
            .and_then(|v| v.to_str().ok())
        else {
            return false;
        };

        let param = headers
            .get(self.headers.params.as_str())
            .and_then(|v| v.to_str().ok());

        trace!(key, ?param, "forwarding alert");
        self.sink.success(key, param);
        true
    }
}
