// In-memory doubles shared by unit tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use issuetrack_api::{IssueRecord, Page};

use crate::error::CoreError;
use crate::model::{Issue, IssueId, PagingParams};
use crate::resource::{IssuePage, IssueResource, IssueSearch, SearchQuery};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    List(u32),
    Get(IssueId),
    Create(Option<String>),
    Update(IssueId),
    Delete(IssueId),
    Search(String),
}

#[derive(Default)]
struct Inner {
    issues: BTreeMap<IssueId, Issue>,
    calls: Vec<Call>,
    fail: bool,
}

/// Issue store that records every call.
#[derive(Clone, Default)]
pub(crate) struct MemoryResource {
    inner: Arc<Mutex<Inner>>,
}

#[allow(clippy::unwrap_used)]
impl MemoryResource {
    pub(crate) fn with_issues(issues: impl IntoIterator<Item = Issue>) -> Self {
        let resource = Self::default();
        {
            let mut inner = resource.inner.lock().unwrap();
            for issue in issues {
                if let Some(id) = issue.id {
                    inner.issues.insert(id, issue);
                }
            }
        }
        resource
    }

    /// Make every following call fail.
    pub(crate) fn fail(&self) {
        self.inner.lock().unwrap().fail = true;
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.inner.lock().unwrap().calls.clone()
    }

    fn record(&self, call: Call) -> Result<(), CoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(call);
        if inner.fail {
            return Err(CoreError::Api {
                message: "server unavailable".into(),
                key: None,
                params: None,
                status: Some(503),
            });
        }
        Ok(())
    }
}

pub(crate) fn issue(id: i64, name: &str) -> Issue {
    Issue {
        id: Some(IssueId::new(id)),
        name: Some(name.into()),
        ..Issue::default()
    }
}

#[allow(clippy::unwrap_used)]
impl IssueResource for MemoryResource {
    async fn list(&self, paging: &PagingParams) -> Result<IssuePage, CoreError> {
        self.record(Call::List(paging.page))?;
        let inner = self.inner.lock().unwrap();
        Ok(IssuePage {
            issues: inner.issues.values().cloned().collect(),
            total_count: u64::try_from(inner.issues.len()).unwrap(),
        })
    }

    async fn get(&self, id: IssueId) -> Result<Issue, CoreError> {
        self.record(Call::Get(id))?;
        self.inner
            .lock()
            .unwrap()
            .issues
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound {
                identifier: id.to_string(),
            })
    }

    async fn create(&self, issue: &Issue) -> Result<Issue, CoreError> {
        self.record(Call::Create(issue.name.clone()))?;
        let mut inner = self.inner.lock().unwrap();
        let next = inner.issues.keys().last().map_or(1, |id| id.get() + 1);
        let saved = Issue {
            id: Some(IssueId::new(next)),
            ..issue.clone()
        };
        inner.issues.insert(IssueId::new(next), saved.clone());
        Ok(saved)
    }

    async fn update(&self, issue: &Issue) -> Result<Issue, CoreError> {
        let id = issue.id.ok_or(CoreError::MissingId {
            operation: "updated",
        })?;
        self.record(Call::Update(id))?;
        self.inner.lock().unwrap().issues.insert(id, issue.clone());
        Ok(issue.clone())
    }

    async fn delete(&self, id: IssueId) -> Result<(), CoreError> {
        self.record(Call::Delete(id))?;
        self.inner.lock().unwrap().issues.remove(&id);
        Ok(())
    }
}

#[allow(clippy::unwrap_used)]
impl IssueSearch for MemoryResource {
    async fn search_page(&self, query: &SearchQuery) -> Result<Page<IssueRecord>, CoreError> {
        self.record(Call::Search(query.text.clone()))?;
        let inner = self.inner.lock().unwrap();
        let data: Vec<IssueRecord> = inner
            .issues
            .values()
            .filter(|i| i.name.as_deref().is_some_and(|n| n.contains(&query.text)))
            .map(IssueRecord::from)
            .collect();
        Ok(Page {
            total_count: u64::try_from(data.len()).unwrap(),
            data,
        })
    }
}
