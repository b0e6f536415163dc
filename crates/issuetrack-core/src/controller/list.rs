// ── Issue list ──
//
// Paging, sorting and searching all produce new `PagingParams`; the host
// navigates the router with them and a fresh load follows. Any published
// update marks the list as needing a reload.

use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::{Issue, PagingParams};
use crate::resource::{IssueResource, IssueSearch, SearchQuery};
use crate::updates::IssueSubscription;

/// A list load detached from the controller.
#[derive(Debug)]
pub struct LoadRequest<R, S> {
    paging: PagingParams,
    resource: R,
    search: S,
}

impl<R: IssueResource, S: IssueSearch> LoadRequest<R, S> {
    pub async fn dispatch(self) -> LoadResponse {
        let result = match SearchQuery::from_paging(&self.paging) {
            Some(query) => self.search.search_page(&query).await.map(|page| {
                let total = page.total_count;
                let issues = page
                    .data
                    .into_iter()
                    .filter_map(|record| match Issue::try_from(record) {
                        Ok(issue) => Some(issue),
                        Err(e) => {
                            warn!(error = %e, "skipping unreadable search hit");
                            None
                        }
                    })
                    .collect();
                (issues, total)
            }),
            None => self
                .resource
                .list(&self.paging)
                .await
                .map(|page| (page.issues, page.total_count)),
        };
        LoadResponse {
            paging: self.paging,
            result,
        }
    }
}

#[derive(Debug)]
pub struct LoadResponse {
    paging: PagingParams,
    result: Result<(Vec<Issue>, u64), CoreError>,
}

/// State behind the issue list page.
#[derive(Debug)]
pub struct IssueListController<R, S> {
    resource: R,
    search: S,
    paging: PagingParams,
    issues: Vec<Issue>,
    total_count: u64,
    loaded: bool,
    updates: Option<IssueSubscription>,
}

impl<R, S> IssueListController<R, S>
where
    R: IssueResource + Clone,
    S: IssueSearch + Clone,
{
    pub fn new(resource: R, search: S, paging: PagingParams, updates: IssueSubscription) -> Self {
        Self {
            resource,
            search,
            paging,
            issues: Vec::new(),
            total_count: 0,
            loaded: false,
            updates: Some(updates),
        }
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn paging(&self) -> &PagingParams {
        &self.paging
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn page_count(&self) -> u64 {
        PagingParams::page_count(self.total_count)
    }

    /// Adopt new paging params (after the router re-resolved them).
    pub fn set_paging(&mut self, paging: PagingParams) {
        if paging != self.paging {
            self.paging = paging;
            self.loaded = false;
        }
    }

    // ── Loading ──────────────────────────────────────────────────────

    pub async fn load_all(&mut self) -> Result<(), CoreError> {
        let response = self.load_request().dispatch().await;
        self.complete_load(response).map(|_| ())
    }

    pub fn load_request(&self) -> LoadRequest<R, S> {
        LoadRequest {
            paging: self.paging.clone(),
            resource: self.resource.clone(),
            search: self.search.clone(),
        }
    }

    /// Apply a load result. Returns `Ok(false)` for a response issued under
    /// paging params that are no longer current.
    pub fn complete_load(&mut self, response: LoadResponse) -> Result<bool, CoreError> {
        if response.paging != self.paging {
            debug!("ignoring list load for superseded paging");
            return Ok(false);
        }
        let (issues, total) = response.result?;
        self.issues = issues;
        self.total_count = total;
        self.loaded = true;
        Ok(true)
    }

    /// Drain queued updates. Returns whether a reload is needed.
    pub fn poll_updates(&mut self) -> bool {
        let mut stale = false;
        while self
            .updates
            .as_mut()
            .and_then(IssueSubscription::try_next)
            .is_some()
        {
            stale = true;
        }
        if stale {
            self.loaded = false;
        }
        stale
    }

    pub fn teardown(&mut self) {
        self.updates = None;
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Params for another page.
    pub fn transition(&self, page: u32) -> PagingParams {
        self.paging.clone().with_page(page)
    }

    /// Params sorted by `predicate`; sorting by the current predicate
    /// flips the direction.
    pub fn sort_by(&self, predicate: &str) -> PagingParams {
        let ascending = if self.paging.predicate == predicate {
            !self.paging.ascending
        } else {
            true
        };
        self.paging.clone().with_sort(predicate, ascending)
    }

    /// Params for a search; an empty query clears the search.
    pub fn search(&self, query: &str) -> PagingParams {
        let query = query.trim();
        if query.is_empty() {
            return self.clear();
        }
        PagingParams::default()
            .with_sort("_score", false)
            .with_search(Some(query.to_owned()))
    }

    /// Params for the unfiltered first page.
    pub fn clear(&self) -> PagingParams {
        PagingParams::default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::testing::{Call, MemoryResource, issue};
    use crate::updates::IssueUpdates;

    fn controller(
        resource: &MemoryResource,
        paging: PagingParams,
        updates: &IssueUpdates,
    ) -> IssueListController<MemoryResource, MemoryResource> {
        IssueListController::new(resource.clone(), resource.clone(), paging, updates.subscribe())
    }

    #[tokio::test]
    async fn loads_plain_list() {
        let resource = MemoryResource::with_issues([issue(1, "Bug A"), issue(2, "Crash")]);
        let mut list = controller(&resource, PagingParams::default(), &IssueUpdates::new());

        list.load_all().await.unwrap();

        assert!(list.is_loaded());
        assert_eq!(list.issues().len(), 2);
        assert_eq!(list.total_count(), 2);
        assert_eq!(resource.calls(), vec![Call::List(1)]);
    }

    #[tokio::test]
    async fn search_params_use_search_client() {
        let resource = MemoryResource::with_issues([issue(1, "Bug A"), issue(2, "Crash")]);
        let updates = IssueUpdates::new();
        let list = controller(&resource, PagingParams::default(), &updates);

        let paging = list.search("Crash");
        assert_eq!(paging.predicate, "_score");
        assert!(!paging.ascending);
        assert_eq!(paging.page, 1);

        let mut list = controller(&resource, paging, &updates);
        list.load_all().await.unwrap();
        assert_eq!(list.issues().len(), 1);
        assert_eq!(resource.calls(), vec![Call::Search("Crash".into())]);
    }

    #[test]
    fn empty_search_clears() {
        let resource = MemoryResource::default();
        let paging = PagingParams::from_query(Some("3"), Some("name,desc"), Some("old"));
        let list = controller(&resource, paging, &IssueUpdates::new());
        assert_eq!(list.search("  "), PagingParams::default());
    }

    #[test]
    fn sorting_same_predicate_flips_direction() {
        let resource = MemoryResource::default();
        let list = controller(&resource, PagingParams::default(), &IssueUpdates::new());
        let flipped = list.sort_by("id");
        assert_eq!(flipped.sort, "id,desc");
        assert_eq!(list.sort_by("name").sort, "name,asc");
    }

    #[tokio::test]
    async fn superseded_load_is_ignored() {
        let resource = MemoryResource::with_issues([issue(1, "Bug A")]);
        let mut list = controller(&resource, PagingParams::default(), &IssueUpdates::new());

        let request = list.load_request();
        list.set_paging(list.transition(2));
        assert!(!list.complete_load(request.dispatch().await).unwrap());
        assert!(!list.is_loaded());
    }

    #[tokio::test]
    async fn update_marks_list_stale() {
        let resource = MemoryResource::with_issues([issue(1, "Bug A")]);
        let updates = IssueUpdates::new();
        let mut list = controller(&resource, PagingParams::default(), &updates);
        list.load_all().await.unwrap();

        updates.publish(issue(1, "Bug A (edited)"));
        assert!(list.poll_updates());
        assert!(!list.is_loaded());
        assert!(!list.poll_updates());
    }
}
