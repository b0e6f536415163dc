// ── Issue state table ──
//
// Six navigational states: the list page, the detail page, and four modal
// overlays stacked on top of one of those two pages.

use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::config::ROLE_USER;

/// Every state an issue view can be in.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
pub enum StateName {
    #[strum(serialize = "issue")]
    Issue,
    #[strum(serialize = "issue-detail")]
    IssueDetail,
    #[strum(serialize = "issue-detail.edit")]
    IssueDetailEdit,
    #[strum(serialize = "issue.new")]
    IssueNew,
    #[strum(serialize = "issue.edit")]
    IssueEdit,
    #[strum(serialize = "issue.delete")]
    IssueDelete,
}

impl StateName {
    fn index(self) -> usize {
        match self {
            Self::Issue => 0,
            Self::IssueDetail => 1,
            Self::IssueDetailEdit => 2,
            Self::IssueNew => 3,
            Self::IssueEdit => 4,
            Self::IssueDelete => 5,
        }
    }
}

/// Modal width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalSize {
    Medium,
    Large,
}

/// What a state mounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Page {
        template: &'static str,
        controller: &'static str,
    },
    Modal {
        template: &'static str,
        controller: &'static str,
        size: ModalSize,
        /// Clicking outside the modal does not dismiss it.
        static_backdrop: bool,
    },
}

impl View {
    pub fn is_modal(&self) -> bool {
        matches!(self, Self::Modal { .. })
    }

    pub fn controller(&self) -> &'static str {
        match self {
            Self::Page { controller, .. } | Self::Modal { controller, .. } => controller,
        }
    }
}

/// Data a state needs before it becomes active, evaluated in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolve {
    /// Translation parts to load.
    Translations(&'static [&'static str]),
    /// List paging parsed from `page`, `sort`, `search`.
    PagingParams,
    /// The issue named by the `id` param, fetched from the server.
    Entity,
    /// An all-null issue for the create dialog.
    BlankEntity,
    /// Descriptor of the state being left.
    PreviousState,
}

/// Where a modal exit leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitTarget {
    /// The modal's parent state (`^`).
    Parent,
    State(StateName),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitRule {
    pub target: ExitTarget,
    /// Re-resolve the target even if it is already active.
    pub reload: bool,
}

/// Declaration of one state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateDef {
    pub name: StateName,
    pub parent: Option<StateName>,
    /// Full URL pattern including inherited segments.
    pub url: &'static str,
    /// Params owned by this state; a change in any of them re-enters it.
    pub params: &'static [&'static str],
    pub authorities: &'static [&'static str],
    pub page_title: Option<&'static str>,
    pub view: View,
    pub resolves: &'static [Resolve],
    pub on_confirm: Option<ExitRule>,
    pub on_cancel: Option<ExitRule>,
}

const AUTH_USER: &[&str] = &[ROLE_USER];
const LIST_PARTS: &[&str] = &["issue", "state", "priority", "global"];
const DETAIL_PARTS: &[&str] = &["issue", "state", "priority"];

const DIALOG: View = View::Modal {
    template: "issue-dialog.html",
    controller: "IssueDialogController",
    size: ModalSize::Large,
    static_backdrop: true,
};

const BACK_TO_LIST_RELOADED: Option<ExitRule> = Some(ExitRule {
    target: ExitTarget::State(StateName::Issue),
    reload: true,
});

const BACK_TO_PARENT: Option<ExitRule> = Some(ExitRule {
    target: ExitTarget::Parent,
    reload: false,
});

static ISSUE_STATES: [StateDef; 6] = [
    StateDef {
        name: StateName::Issue,
        parent: None,
        url: "/issue?page&sort&search",
        params: &["page", "sort", "search"],
        authorities: AUTH_USER,
        page_title: Some("issueTrackerApp.issue.home.title"),
        view: View::Page {
            template: "issues.html",
            controller: "IssueController",
        },
        resolves: &[Resolve::Translations(LIST_PARTS), Resolve::PagingParams],
        on_confirm: None,
        on_cancel: None,
    },
    StateDef {
        name: StateName::IssueDetail,
        parent: None,
        url: "/issue/{id}",
        params: &["id"],
        authorities: AUTH_USER,
        page_title: Some("issueTrackerApp.issue.detail.title"),
        view: View::Page {
            template: "issue-detail.html",
            controller: "IssueDetailController",
        },
        resolves: &[
            Resolve::Translations(DETAIL_PARTS),
            Resolve::Entity,
            Resolve::PreviousState,
        ],
        on_confirm: None,
        on_cancel: None,
    },
    StateDef {
        name: StateName::IssueDetailEdit,
        parent: Some(StateName::IssueDetail),
        url: "/issue/{id}/detail/edit",
        params: &[],
        authorities: AUTH_USER,
        page_title: None,
        view: DIALOG,
        resolves: &[Resolve::Entity],
        on_confirm: BACK_TO_PARENT,
        on_cancel: BACK_TO_PARENT,
    },
    StateDef {
        name: StateName::IssueNew,
        parent: Some(StateName::Issue),
        url: "/issue/new",
        params: &[],
        authorities: AUTH_USER,
        page_title: None,
        view: DIALOG,
        resolves: &[Resolve::BlankEntity],
        on_confirm: BACK_TO_LIST_RELOADED,
        on_cancel: Some(ExitRule {
            target: ExitTarget::State(StateName::Issue),
            reload: false,
        }),
    },
    StateDef {
        name: StateName::IssueEdit,
        parent: Some(StateName::Issue),
        url: "/issue/{id}/edit",
        params: &["id"],
        authorities: AUTH_USER,
        page_title: None,
        view: DIALOG,
        resolves: &[Resolve::Entity],
        on_confirm: BACK_TO_LIST_RELOADED,
        on_cancel: BACK_TO_PARENT,
    },
    StateDef {
        name: StateName::IssueDelete,
        parent: Some(StateName::Issue),
        url: "/issue/{id}/delete",
        params: &["id"],
        authorities: AUTH_USER,
        page_title: None,
        view: View::Modal {
            template: "issue-delete-dialog.html",
            controller: "IssueDeleteController",
            size: ModalSize::Medium,
            static_backdrop: false,
        },
        resolves: &[Resolve::Entity],
        on_confirm: BACK_TO_LIST_RELOADED,
        on_cancel: BACK_TO_PARENT,
    },
];

/// The declared issue states.
#[derive(Debug, Clone, Copy)]
pub struct StateTable {
    states: &'static [StateDef; 6],
}

impl Default for StateTable {
    fn default() -> Self {
        Self::issues()
    }
}

impl StateTable {
    pub fn issues() -> Self {
        Self {
            states: &ISSUE_STATES,
        }
    }

    pub fn get(&self, name: StateName) -> &'static StateDef {
        &self.states[name.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static StateDef> {
        self.states.iter()
    }

    /// `name` and its ancestors, root first.
    pub fn chain(&self, name: StateName) -> Vec<&'static StateDef> {
        let mut chain = vec![self.get(name)];
        while let Some(parent) = chain.last().and_then(|def| def.parent) {
            chain.push(self.get(parent));
        }
        chain.reverse();
        chain
    }

    /// Whether `ancestor` is `name` or one of its parents.
    pub fn is_within(&self, name: StateName, ancestor: StateName) -> bool {
        self.chain(name).iter().any(|def| def.name == ancestor)
    }
}
