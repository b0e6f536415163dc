// ── View controllers ──
//
// Framework-independent state behind each issue view. A host (CLI or TUI)
// mounts one per active state and feeds it user input.

pub mod delete;
pub mod detail;
pub mod dialog;
pub mod list;

pub use delete::{DeleteRequest, DeleteResponse, IssueDeleteController};
pub use detail::IssueDetailController;
pub use dialog::{
    AttachmentRequest, AttachmentResponse, IssueDialogController, SaveOutcome, SaveRequest,
    SaveResponse,
};
pub use list::{IssueListController, LoadRequest, LoadResponse};
