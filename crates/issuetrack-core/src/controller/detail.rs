// ── Issue detail ──

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::data_utils;
use crate::error::CoreError;
use crate::model::Issue;
use crate::router::PreviousState;
use crate::updates::IssueSubscription;

/// Read-only view of one issue that follows saves made elsewhere.
///
/// Only updates carrying the same id replace the bound issue. The update
/// subscription is released on [`teardown`](Self::teardown) or drop.
#[derive(Debug)]
pub struct IssueDetailController {
    issue: Issue,
    previous_state: PreviousState,
    updates: Option<IssueSubscription>,
}

impl IssueDetailController {
    pub fn new(issue: Issue, previous_state: PreviousState, updates: IssueSubscription) -> Self {
        Self {
            issue,
            previous_state,
            updates: Some(updates),
        }
    }

    pub fn issue(&self) -> &Issue {
        &self.issue
    }

    /// Name of the state to return to.
    pub fn previous_state(&self) -> &str {
        &self.previous_state.name
    }

    pub fn previous(&self) -> &PreviousState {
        &self.previous_state
    }

    pub fn byte_size(&self, base64: &str) -> String {
        data_utils::byte_size(base64)
    }

    pub async fn open_file(
        &self,
        content_type: &str,
        data: &str,
        dir: &Path,
    ) -> Result<PathBuf, CoreError> {
        data_utils::open_file(content_type, data, dir).await
    }

    /// Apply every queued update. Returns whether the issue changed.
    pub fn poll_updates(&mut self) -> bool {
        let mut changed = false;
        while let Some(issue) = self.updates.as_mut().and_then(IssueSubscription::try_next) {
            changed |= self.apply(issue);
        }
        changed
    }

    /// Wait for the next update that applies to this issue. Returns `false`
    /// once the subscription is gone.
    pub async fn next_update(&mut self) -> bool {
        loop {
            let Some(updates) = self.updates.as_mut() else {
                return false;
            };
            let Some(issue) = updates.next().await else {
                return false;
            };
            if self.apply(issue) {
                return true;
            }
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.updates.is_some()
    }

    /// Stop following updates.
    pub fn teardown(&mut self) {
        if self.updates.take().is_some() {
            debug!(id = ?self.issue.id, "detail view unsubscribed");
        }
    }

    fn apply(&mut self, issue: Issue) -> bool {
        if issue.id.is_none() || issue.id != self.issue.id {
            return false;
        }
        self.issue = issue;
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::IssueId;
    use crate::updates::IssueUpdates;

    fn issue(id: i64, name: &str) -> Issue {
        Issue {
            id: Some(IssueId::new(id)),
            name: Some(name.into()),
            ..Issue::default()
        }
    }

    fn controller(updates: &IssueUpdates) -> IssueDetailController {
        IssueDetailController::new(issue(7, "Bug A"), PreviousState::list(), updates.subscribe())
    }

    #[test]
    fn binds_issue_and_previous_state() {
        let updates = IssueUpdates::new();
        let detail = controller(&updates);
        assert_eq!(detail.issue().name.as_deref(), Some("Bug A"));
        assert_eq!(detail.previous_state(), "issue");
        assert_eq!(detail.byte_size("aGk="), "2 bytes");
    }

    #[test]
    fn matching_update_replaces_issue() {
        let updates = IssueUpdates::new();
        let mut detail = controller(&updates);
        updates.publish(issue(8, "Other"));
        updates.publish(issue(7, "Bug A (edited)"));

        assert!(detail.poll_updates());
        assert_eq!(detail.issue().name.as_deref(), Some("Bug A (edited)"));
    }

    #[test]
    fn teardown_unsubscribes() {
        let updates = IssueUpdates::new();
        let mut detail = controller(&updates);
        assert_eq!(updates.subscriber_count(), 1);

        detail.teardown();
        assert_eq!(updates.subscriber_count(), 0);
        updates.publish(issue(7, "ignored"));
        assert!(!detail.poll_updates());
        assert_eq!(detail.issue().name.as_deref(), Some("Bug A"));
    }

    #[test]
    fn drop_unsubscribes() {
        let updates = IssueUpdates::new();
        drop(controller(&updates));
        assert_eq!(updates.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn next_update_waits_for_matching_id() {
        let updates = IssueUpdates::new();
        let mut detail = controller(&updates);
        let publisher = updates.clone();
        tokio::spawn(async move {
            publisher.publish(issue(1, "Unrelated"));
            publisher.publish(issue(7, "Renamed"));
        });

        assert!(detail.next_update().await);
        assert_eq!(detail.issue().name.as_deref(), Some("Renamed"));
    }
}
