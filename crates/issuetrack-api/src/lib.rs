// issuetrack-api: Async Rust client for the issue tracker REST API

pub mod alert;
pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use alert::{AlertHeaders, AlertSink, DEFAULT_APP_NAME, NotificationInterceptor};
pub use client::ApiClient;
pub use error::Error;
pub use models::{ITEMS_PER_PAGE, IssueRecord, Page, PageRequest};
pub use transport::{TlsMode, TransportConfig};
