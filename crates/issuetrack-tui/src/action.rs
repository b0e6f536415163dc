//! Everything that can change UI state. Key handlers and background tasks
//! only ever produce actions; the app loop applies them.

use std::path::PathBuf;

use issuetrack_core::controller::{
    AttachmentResponse, DeleteResponse, LoadResponse, SaveResponse,
};
use issuetrack_core::{Activation, CoreError, RouteError, StateName, StateParams, Transition};

#[derive(Debug)]
pub enum Action {
    Quit,
    Resize(u16, u16),
    Tick,
    Render,
    ToggleHelp,

    // ── Navigation ──
    /// Enter `state` with `params`.
    Go {
        state: StateName,
        params: StateParams,
    },
    /// Follow a modal exit, keeping the current params.
    Follow(Transition),
    /// A navigation finished resolving on a background task.
    Resolved(Result<Activation, RouteError>),

    // ── List ──
    ListLoaded(LoadResponse),

    // ── Dialog ──
    SubmitDialog,
    /// Encode the file at this path into the dialog's issue.
    Attach(PathBuf),
    AttachmentEncoded(AttachmentResponse),
    Saved(SaveResponse),
    /// Dismiss the open modal without a result.
    CancelModal,

    // ── Delete ──
    ConfirmDelete,
    Deleted(DeleteResponse),

    // ── Detail ──
    /// Write the shown attachment to disk.
    OpenAttachment,
    AttachmentOpened(Result<PathBuf, CoreError>),

    // ── Notifications ──
    /// Alert key (and parameter) sent back by the server.
    Alert {
        key: String,
        param: Option<String>,
    },
    Notify(Notification),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn success(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Success,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Error,
        }
    }

    pub fn info(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Info,
        }
    }
}
