// ── Wire ↔ domain conversion ──
//
// `created` is the only field that changes shape; everything else is
// copied through. Conversion happens in the resource client only.

use issuetrack_api::IssueRecord;

use crate::date::{local_date_from_server, local_date_to_server};
use crate::error::CoreError;
use crate::model::{Issue, IssueId};

impl TryFrom<IssueRecord> for Issue {
    type Error = CoreError;

    fn try_from(record: IssueRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: record.id.map(IssueId::new),
            created: local_date_from_server(record.created.as_deref())?,
            name: record.name,
            description: record.description,
            state: record.state,
            priority: record.priority,
            attachment: record.attachment,
            attachment_content_type: record.attachment_content_type,
            comment: record.comment,
        })
    }
}

impl From<&Issue> for IssueRecord {
    fn from(issue: &Issue) -> Self {
        Self {
            id: issue.id.map(IssueId::get),
            name: issue.name.clone(),
            description: issue.description.clone(),
            created: local_date_to_server(issue.created),
            state: issue.state.clone(),
            priority: issue.priority.clone(),
            attachment: issue.attachment.clone(),
            attachment_content_type: issue.attachment_content_type.clone(),
            comment: issue.comment.clone(),
        }
    }
}
