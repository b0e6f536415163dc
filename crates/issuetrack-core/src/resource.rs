// ── Resource and search clients ──
//
// `IssueResource` is the CRUD seam every controller and the router talk
// to; `IssueSearch` is the read-only search seam used by the list view.
// The REST implementations wrap `issuetrack_api::ApiClient`, converting
// `created` on the way in and out. Search results stay in wire form.

use std::future::Future;

use issuetrack_api::{ApiClient, IssueRecord, Page, PageRequest};
use tracing::{debug, info};

use crate::error::CoreError;
use crate::model::{Issue, IssueId, PagingParams};

/// One page of converted issues.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssuePage {
    pub issues: Vec<Issue>,
    pub total_count: u64,
}

/// A free-text search plus paging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub page: PageRequest,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            page: PageRequest::default(),
        }
    }

    /// The search carried by list paging params, if any.
    pub fn from_paging(paging: &PagingParams) -> Option<Self> {
        paging.search.as_ref().map(|text| Self {
            text: text.clone(),
            page: paging.page_request(),
        })
    }
}

// ── Seams ───────────────────────────────────────────────────────────

/// CRUD access to issues.
///
/// Errors always reach the caller; implementations never swallow them.
pub trait IssueResource: Send + Sync {
    fn list(&self, paging: &PagingParams)
    -> impl Future<Output = Result<IssuePage, CoreError>> + Send;

    fn get(&self, id: IssueId) -> impl Future<Output = Result<Issue, CoreError>> + Send;

    /// Create a new issue; the server assigns the id.
    fn create(&self, issue: &Issue) -> impl Future<Output = Result<Issue, CoreError>> + Send;

    /// Replace an existing issue. Rejected without a request when `issue.id` is `None`.
    fn update(&self, issue: &Issue) -> impl Future<Output = Result<Issue, CoreError>> + Send;

    fn delete(&self, id: IssueId) -> impl Future<Output = Result<(), CoreError>> + Send;
}

/// Read-only full-text search.
pub trait IssueSearch: Send + Sync {
    fn search_page(
        &self,
        query: &SearchQuery,
    ) -> impl Future<Output = Result<Page<IssueRecord>, CoreError>> + Send;

    fn search(
        &self,
        query: &SearchQuery,
    ) -> impl Future<Output = Result<Vec<IssueRecord>, CoreError>> + Send {
        let page = self.search_page(query);
        async move { page.await.map(|p| p.data) }
    }
}

// ── REST implementations ────────────────────────────────────────────

/// [`IssueResource`] over the `api/issues` endpoints.
#[derive(Clone)]
pub struct RestIssueResource {
    client: ApiClient,
}

impl RestIssueResource {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

impl IssueResource for RestIssueResource {
    async fn list(&self, paging: &PagingParams) -> Result<IssuePage, CoreError> {
        let page = self.client.list_issues(&paging.page_request()).await?;
        debug!(count = page.data.len(), total = page.total_count, "issues listed");
        Ok(IssuePage {
            issues: page
                .data
                .into_iter()
                .map(Issue::try_from)
                .collect::<Result<_, _>>()?,
            total_count: page.total_count,
        })
    }

    async fn get(&self, id: IssueId) -> Result<Issue, CoreError> {
        let record = self.client.get_issue(id.get()).await.map_err(|e| {
            if e.is_not_found() {
                CoreError::NotFound {
                    identifier: id.to_string(),
                }
            } else {
                e.into()
            }
        })?;
        Issue::try_from(record)
    }

    async fn create(&self, issue: &Issue) -> Result<Issue, CoreError> {
        let saved = self.client.create_issue(&IssueRecord::from(issue)).await?;
        let saved = Issue::try_from(saved)?;
        info!(id = ?saved.id, "issue created");
        Ok(saved)
    }

    async fn update(&self, issue: &Issue) -> Result<Issue, CoreError> {
        let id = issue.id.ok_or(CoreError::MissingId {
            operation: "updated",
        })?;
        let saved = self
            .client
            .update_issue(id.get(), &IssueRecord::from(issue))
            .await?;
        info!(%id, "issue updated");
        Issue::try_from(saved)
    }

    async fn delete(&self, id: IssueId) -> Result<(), CoreError> {
        self.client.delete_issue(id.get()).await?;
        info!(%id, "issue deleted");
        Ok(())
    }
}

/// [`IssueSearch`] over `api/_search/issues`.
#[derive(Clone)]
pub struct RestIssueSearch {
    client: ApiClient,
}

impl RestIssueSearch {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

impl IssueSearch for RestIssueSearch {
    async fn search_page(&self, query: &SearchQuery) -> Result<Page<IssueRecord>, CoreError> {
        let page = self.client.search_issues(&query.text, &query.page).await?;
        debug!(query = %query.text, count = page.data.len(), "search completed");
        Ok(page)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn resource() -> (MockServer, RestIssueResource) {
        let server = MockServer::start().await;
        let client = ApiClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
        (server, RestIssueResource::new(client))
    }

    #[tokio::test]
    async fn update_without_id_sends_nothing() {
        let (server, resource) = resource().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = resource.update(&Issue::blank()).await.unwrap_err();
        assert!(matches!(err, CoreError::MissingId { .. }));
    }

    #[tokio::test]
    async fn get_missing_issue_is_not_found() {
        let (server, resource) = resource().await;
        Mock::given(method("GET"))
            .and(path("/api/issues/9"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = resource.get(IssueId::new(9)).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound { ref identifier } if identifier == "9"));
    }

    #[test]
    fn search_query_follows_paging() {
        let paging = PagingParams::from_query(Some("2"), None, Some("crash"));
        let query = SearchQuery::from_paging(&paging).unwrap();
        assert_eq!(query.text, "crash");
        assert_eq!(query.page.page, 1);
        assert!(SearchQuery::from_paging(&PagingParams::default()).is_none());
    }
}
