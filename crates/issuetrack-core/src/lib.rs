//! Domain layer between `issuetrack-api` and the CLI / TUI front ends.
//!
//! - **Resource and search clients** ([`resource`]): the [`IssueResource`]
//!   and [`IssueSearch`] seams plus their REST implementations. The
//!   resource client converts the `created` date between its wire form and
//!   a calendar date.
//!
//! - **Controllers** ([`controller`]): list, detail, create/edit dialog and
//!   delete confirmation. Each one owns its bound [`Issue`] and talks to the
//!   server only through the seams above. Long-running work (saves,
//!   attachment encodes, loads) is split into detachable request/response
//!   pairs so a host can run it on another task.
//!
//! - **Router** ([`router`]): the declarative [`StateTable`] and the
//!   [`Router`] that evaluates it, resolving everything a state needs
//!   before it becomes current.
//!
//! - **Update channel** ([`updates`]): saves are published on
//!   [`IssueUpdates`]; mounted views subscribe and drop their subscription
//!   on teardown.

pub mod config;
pub mod controller;
pub mod convert;
pub mod data_utils;
pub mod date;
pub mod error;
pub mod i18n;
pub mod modal;
pub mod model;
pub mod resource;
pub mod router;
pub mod updates;

#[cfg(test)]
mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ClientConfig, ROLE_USER, TlsVerification};
pub use controller::{
    IssueDeleteController, IssueDetailController, IssueDialogController, IssueListController,
    SaveOutcome,
};
pub use data_utils::EncodedFile;
pub use error::CoreError;
pub use i18n::{BundledTranslations, TranslationSource, Translations};
pub use modal::{ModalExit, ModalState};
pub use model::{Issue, IssueId, PagingParams};
pub use resource::{
    IssuePage, IssueResource, IssueSearch, RestIssueResource, RestIssueSearch, SearchQuery,
};
pub use router::{
    Activation, PreviousState, RouteError, Router, StateName, StateParams, StateTable, Transition,
};
pub use updates::{IssueSubscription, IssueUpdates};

// Wire types callers need alongside the domain ones.
pub use issuetrack_api::{AlertSink, DEFAULT_APP_NAME, IssueRecord};
