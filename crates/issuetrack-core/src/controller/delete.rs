// ── Delete confirmation ──

use tracing::{debug, warn};

use crate::error::CoreError;
use crate::modal::ModalState;
use crate::model::{Issue, IssueId};
use crate::resource::IssueResource;

/// A delete detached from the controller.
#[derive(Debug)]
pub struct DeleteRequest<R> {
    id: IssueId,
    resource: R,
}

impl<R: IssueResource> DeleteRequest<R> {
    pub async fn dispatch(self) -> DeleteResponse {
        DeleteResponse {
            id: self.id,
            result: self.resource.delete(self.id).await,
        }
    }
}

#[derive(Debug)]
pub struct DeleteResponse {
    id: IssueId,
    result: Result<(), CoreError>,
}

/// Confirmation modal for deleting one issue. Closes with `true` once the
/// server confirms the delete; failures leave it open.
#[derive(Debug)]
pub struct IssueDeleteController<R> {
    resource: R,
    issue: Issue,
    modal: ModalState<bool>,
}

impl<R: IssueResource + Clone> IssueDeleteController<R> {
    pub fn new(resource: R, issue: Issue) -> Self {
        Self {
            resource,
            issue,
            modal: ModalState::Open,
        }
    }

    pub fn issue(&self) -> &Issue {
        &self.issue
    }

    pub fn modal(&self) -> &ModalState<bool> {
        &self.modal
    }

    pub fn clear(&mut self) {
        self.modal.dismiss();
    }

    pub async fn confirm_delete(&mut self, id: IssueId) -> Result<(), CoreError> {
        let response = self.delete_request(id).dispatch().await;
        self.complete_delete(response).map(drop)
    }

    pub fn delete_request(&self, id: IssueId) -> DeleteRequest<R> {
        DeleteRequest {
            id,
            resource: self.resource.clone(),
        }
    }

    /// Apply a delete result. Returns whether the modal closed; a response
    /// for an issue other than the bound one is ignored and leaves it open.
    pub fn complete_delete(&mut self, response: DeleteResponse) -> Result<bool, CoreError> {
        if self.issue.id != Some(response.id) {
            warn!(
                id = %response.id,
                bound = ?self.issue.id,
                "ignoring delete response for another issue"
            );
            return Ok(false);
        }
        response.result?;
        debug!(id = %response.id, "delete confirmed");
        self.modal.close(true);
        Ok(true)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::testing::{Call, MemoryResource, issue};

    #[tokio::test]
    async fn confirm_deletes_and_closes_with_true() {
        let resource = MemoryResource::with_issues([issue(7, "Bug A")]);
        let mut controller = IssueDeleteController::new(resource.clone(), issue(7, "Bug A"));

        controller.confirm_delete(IssueId::new(7)).await.unwrap();

        assert_eq!(resource.calls(), vec![Call::Delete(IssueId::new(7))]);
        assert_eq!(controller.modal().result(), Some(&true));
    }

    #[tokio::test]
    async fn failure_keeps_modal_open() {
        let resource = MemoryResource::with_issues([issue(7, "Bug A")]);
        resource.fail();
        let mut controller = IssueDeleteController::new(resource, issue(7, "Bug A"));

        assert!(controller.confirm_delete(IssueId::new(7)).await.is_err());
        assert!(controller.modal().is_open());
    }

    #[tokio::test]
    async fn response_for_another_issue_leaves_modal_open() {
        let resource = MemoryResource::with_issues([issue(7, "Bug A"), issue(8, "Bug B")]);
        let seven = IssueDeleteController::new(resource.clone(), issue(7, "Bug A"));
        let late = seven.delete_request(IssueId::new(7)).dispatch().await;

        let mut eight = IssueDeleteController::new(resource.clone(), issue(8, "Bug B"));
        assert!(!eight.complete_delete(late).unwrap());
        assert!(eight.modal().is_open());

        let own = eight.delete_request(IssueId::new(8)).dispatch().await;
        assert!(eight.complete_delete(own).unwrap());
        assert_eq!(eight.modal().result(), Some(&true));
    }

    #[test]
    fn clear_dismisses() {
        let mut controller =
            IssueDeleteController::new(MemoryResource::default(), issue(7, "Bug A"));
        controller.clear();
        assert_eq!(controller.modal(), &ModalState::Dismissed);
    }
}
