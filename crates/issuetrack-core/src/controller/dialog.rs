// ── Create / edit dialog ──
//
// Saves go through `create` or `update` depending on whether the issue has
// an id. Every save carries a ticket unique across all dialogs, so a
// response can only ever complete the dialog that issued it. Attachment
// encodes are tagged with a per-dialog generation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::data_utils::{self, EncodedFile};
use crate::error::CoreError;
use crate::modal::ModalState;
use crate::model::Issue;
use crate::resource::IssueResource;
use crate::updates::IssueUpdates;

/// Date fields with a calendar picker.
const DATE_FIELDS: &[&str] = &["created"];

// ── Save round trip ─────────────────────────────────────────────────

static NEXT_SAVE_TICKET: AtomicU64 = AtomicU64::new(1);

fn next_save_ticket() -> u64 {
    NEXT_SAVE_TICKET.fetch_add(1, Ordering::Relaxed)
}

/// A save detached from the controller, ready to run on any task.
#[derive(Debug)]
pub struct SaveRequest<R> {
    ticket: u64,
    issue: Issue,
    resource: R,
}

impl<R: IssueResource> SaveRequest<R> {
    pub fn issue(&self) -> &Issue {
        &self.issue
    }

    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    pub async fn dispatch(self) -> SaveResponse {
        let result = if self.issue.is_new() {
            self.resource.create(&self.issue).await
        } else {
            self.resource.update(&self.issue).await
        };
        SaveResponse {
            ticket: self.ticket,
            result,
        }
    }
}

#[derive(Debug)]
pub struct SaveResponse {
    ticket: u64,
    result: Result<Issue, CoreError>,
}

impl SaveResponse {
    /// Ticket of the request this answers.
    pub fn ticket(&self) -> u64 {
        self.ticket
    }
}

/// What [`IssueDialogController::complete_save`] did with a response.
#[derive(Debug)]
pub enum SaveOutcome {
    /// Saved; the modal is closed with this issue.
    Saved(Issue),
    /// The save failed; the modal stays open.
    Failed(CoreError),
    /// The dialog had already been dismissed, or the response belongs to
    /// another dialog's save.
    Stale,
}

// ── Attachment round trip ───────────────────────────────────────────

/// A pending file encode.
#[derive(Debug)]
pub struct AttachmentRequest {
    generation: u64,
    path: PathBuf,
    cancel: CancellationToken,
}

impl AttachmentRequest {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn encode(self) -> AttachmentResponse {
        let result = tokio::select! {
            () = self.cancel.cancelled() => Err(CoreError::Attachment {
                path: self.path.display().to_string(),
                reason: "cancelled".into(),
            }),
            encoded = data_utils::to_base64(&self.path) => encoded,
        };
        AttachmentResponse {
            generation: self.generation,
            result,
        }
    }
}

#[derive(Debug)]
pub struct AttachmentResponse {
    generation: u64,
    result: Result<EncodedFile, CoreError>,
}

// ── Controller ──────────────────────────────────────────────────────

/// Form state for creating or editing one issue.
#[derive(Debug)]
pub struct IssueDialogController<R> {
    resource: R,
    updates: IssueUpdates,
    issue: Issue,
    is_saving: bool,
    date_picker_open: BTreeMap<String, bool>,
    modal: ModalState<Issue>,
    /// Ticket of the last save this dialog issued.
    save_ticket: Option<u64>,
    attachment_generation: u64,
    attachment_cancel: Option<CancellationToken>,
}

impl<R: IssueResource + Clone> IssueDialogController<R> {
    pub fn new(resource: R, updates: IssueUpdates, issue: Issue) -> Self {
        let date_picker_open = DATE_FIELDS
            .iter()
            .map(|field| ((*field).to_owned(), false))
            .collect();
        Self {
            resource,
            updates,
            issue,
            is_saving: false,
            date_picker_open,
            modal: ModalState::Open,
            save_ticket: None,
            attachment_generation: 0,
            attachment_cancel: None,
        }
    }

    pub fn issue(&self) -> &Issue {
        &self.issue
    }

    /// Mutable access for form fields.
    pub fn issue_mut(&mut self) -> &mut Issue {
        &mut self.issue
    }

    pub fn is_saving(&self) -> bool {
        self.is_saving
    }

    pub fn modal(&self) -> &ModalState<Issue> {
        &self.modal
    }

    pub fn date_picker_open(&self, field: &str) -> bool {
        self.date_picker_open.get(field).copied().unwrap_or(false)
    }

    pub fn open_calendar(&mut self, field: &str) {
        self.date_picker_open.insert(field.to_owned(), true);
    }

    pub fn close_calendar(&mut self, field: &str) {
        self.date_picker_open.insert(field.to_owned(), false);
    }

    /// Dismiss without saving. Any pending attach is cancelled and any
    /// in-flight save will be treated as stale.
    pub fn clear(&mut self) {
        if self.modal.dismiss() {
            debug!(id = ?self.issue.id, "dialog dismissed");
        }
        self.is_saving = false;
        self.cancel_attachment();
    }

    // ── Saving ───────────────────────────────────────────────────────

    /// Save and wait for the result.
    pub async fn save(&mut self) -> Result<Issue, CoreError> {
        let request = self.begin_save()?;
        match self.complete_save(request.dispatch().await) {
            SaveOutcome::Saved(issue) => Ok(issue),
            SaveOutcome::Failed(err) => Err(err),
            SaveOutcome::Stale => Err(CoreError::Internal("dialog closed during save".into())),
        }
    }

    /// Mark the dialog as saving and detach the request.
    pub fn begin_save(&mut self) -> Result<SaveRequest<R>, CoreError> {
        if self.is_saving {
            return Err(CoreError::SaveInProgress);
        }
        if !self.modal.is_open() {
            return Err(CoreError::Internal("dialog is closed".into()));
        }
        let ticket = next_save_ticket();
        self.is_saving = true;
        self.save_ticket = Some(ticket);
        Ok(SaveRequest {
            ticket,
            issue: self.issue.clone(),
            resource: self.resource.clone(),
        })
    }

    /// Ticket of the save in flight, if any.
    pub fn pending_save(&self) -> Option<u64> {
        self.save_ticket.filter(|_| self.is_saving)
    }

    /// Apply a save result. A successful save of this dialog is published
    /// even when the dialog was dismissed meanwhile; a response to another
    /// dialog's save is ignored outright.
    pub fn complete_save(&mut self, response: SaveResponse) -> SaveOutcome {
        if self.save_ticket != Some(response.ticket) {
            warn!(
                ticket = response.ticket,
                id = ?self.issue.id,
                "ignoring save response issued by another dialog"
            );
            return SaveOutcome::Stale;
        }
        let current = self.is_saving && self.modal.is_open();
        match response.result {
            Ok(saved) => {
                self.updates.publish(saved.clone());
                if !current {
                    return SaveOutcome::Stale;
                }
                self.modal.close(saved.clone());
                self.is_saving = false;
                SaveOutcome::Saved(saved)
            }
            Err(err) => {
                if !current {
                    debug!(error = %err, "ignoring failure of superseded save");
                    return SaveOutcome::Stale;
                }
                self.is_saving = false;
                SaveOutcome::Failed(err)
            }
        }
    }

    // ── Attachment ───────────────────────────────────────────────────

    /// Encode `file` into the issue. `None` leaves the issue untouched.
    /// Returns whether the attachment was applied.
    pub async fn set_attachment(&mut self, file: Option<&Path>) -> Result<bool, CoreError> {
        let Some(path) = file else {
            return Ok(false);
        };
        let request = self.begin_attachment(path);
        self.complete_attachment(request.encode().await)
    }

    /// Start encoding `path`, cancelling any earlier encode.
    pub fn begin_attachment(&mut self, path: &Path) -> AttachmentRequest {
        self.cancel_attachment();
        self.attachment_generation += 1;
        let cancel = CancellationToken::new();
        self.attachment_cancel = Some(cancel.clone());
        AttachmentRequest {
            generation: self.attachment_generation,
            path: path.to_path_buf(),
            cancel,
        }
    }

    /// Apply an encode result. Stale results return `Ok(false)`; only
    /// `attachment` and `attachment_content_type` are ever changed.
    pub fn complete_attachment(&mut self, response: AttachmentResponse) -> Result<bool, CoreError> {
        if response.generation != self.attachment_generation || !self.modal.is_open() {
            return Ok(false);
        }
        self.attachment_cancel = None;
        match response.result {
            Ok(encoded) => {
                self.issue.attachment = Some(encoded.data);
                self.issue.attachment_content_type = Some(encoded.content_type);
                Ok(true)
            }
            Err(err) => {
                warn!(error = %err, "attachment encode failed");
                Err(err)
            }
        }
    }

    pub fn clear_attachment(&mut self) {
        self.cancel_attachment();
        self.issue.attachment = None;
        self.issue.attachment_content_type = None;
    }

    fn cancel_attachment(&mut self) {
        if let Some(cancel) = self.attachment_cancel.take() {
            cancel.cancel();
        }
    }
}
