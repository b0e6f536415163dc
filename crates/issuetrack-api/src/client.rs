// Async HTTP client for the issue tracker REST API.
//
// Endpoints:  api/issues, api/issues/{id}, api/_search/issues
// Auth:       optional bearer token (see TransportConfig)

use reqwest::header::HeaderMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::alert::{AlertHeaders, NotificationInterceptor};
use crate::error::Error;
use crate::models::{IssueRecord, Page, PageRequest};
use crate::transport::TransportConfig;

const TOTAL_COUNT_HEADER: &str = "X-Total-Count";

// ── Error response shape ─────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the issue endpoints.
///
/// Every successful response passes through the configured
/// [`NotificationInterceptor`] before its body is decoded.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    headers: AlertHeaders,
    interceptor: Option<NotificationInterceptor>,
}

impl ApiClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a base URL and transport config.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::from_reqwest(base_url, http)
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(base_url)?,
            headers: AlertHeaders::default(),
            interceptor: None,
        })
    }

    /// Use the header names of a different application prefix.
    pub fn with_alert_headers(mut self, headers: AlertHeaders) -> Self {
        self.headers = headers;
        self
    }

    /// Route every successful response through `interceptor`.
    pub fn with_interceptor(mut self, interceptor: NotificationInterceptor) -> Self {
        self.headers = interceptor.headers().clone();
        self.interceptor = Some(interceptor);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Ensure the base path ends with `/` so relative joins keep it.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── HTTP plumbing ────────────────────────────────────────────────

    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, Error> {
        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(self.parse_error(status, resp).await);
        }
        Ok(match &self.interceptor {
            Some(interceptor) => interceptor.response(resp),
            None => resp,
        })
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.execute(self.http.get(url)).await?;
        Self::decode(resp).await
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Page<T>, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self.execute(self.http.get(url).query(params)).await?;
        let total = total_count(resp.headers());
        let data: Vec<T> = Self::decode(resp).await?;
        let total_count = total.unwrap_or_else(|| u64::try_from(data.len()).unwrap_or(u64::MAX));
        Ok(Page { data, total_count })
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.execute(self.http.post(url).json(body)).await?;
        Self::decode(resp).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("PUT {url}");

        let resp = self.execute(self.http.put(url).json(body)).await?;
        Self::decode(resp).await
    }

    async fn delete(&self, path: &str) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("DELETE {url}");

        self.execute(self.http.delete(url)).await?;
        Ok(())
    }

    async fn parse_error(&self, status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let error_key = header_text(resp.headers(), &self.headers.error);
        let params = header_text(resp.headers(), &self.headers.params);

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Error::Authentication {
                message: format!("server responded {status}"),
            };
        }

        let raw = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&raw)
            .ok()
            .and_then(|e| e.description.or(e.title).or(e.message))
            .or_else(|| (!raw.is_empty()).then(|| raw.clone()))
            .unwrap_or_else(|| status.to_string());

        Error::Api {
            status: status.as_u16(),
            message,
            error_key,
            params,
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Issues ───────────────────────────────────────────────────────

    pub async fn list_issues(&self, page: &PageRequest) -> Result<Page<IssueRecord>, Error> {
        self.get_page("api/issues", &page.to_params()).await
    }

    pub async fn get_issue(&self, id: i64) -> Result<IssueRecord, Error> {
        self.get(&format!("api/issues/{id}")).await
    }

    pub async fn create_issue(&self, issue: &IssueRecord) -> Result<IssueRecord, Error> {
        self.post("api/issues", issue).await
    }

    pub async fn update_issue(&self, id: i64, issue: &IssueRecord) -> Result<IssueRecord, Error> {
        self.put(&format!("api/issues/{id}"), issue).await
    }

    pub async fn delete_issue(&self, id: i64) -> Result<(), Error> {
        self.delete(&format!("api/issues/{id}")).await
    }

    // ── Search ───────────────────────────────────────────────────────

    pub async fn search_issues(
        &self,
        query: &str,
        page: &PageRequest,
    ) -> Result<Page<IssueRecord>, Error> {
        let mut params = vec![("query", query.to_owned())];
        params.extend(page.to_params());
        self.get_page("api/_search/issues", &params).await
    }
}

fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

fn total_count(headers: &HeaderMap) -> Option<u64> {
    header_text(headers, TOTAL_COUNT_HEADER).and_then(|v| v.trim().parse().ok())
}
