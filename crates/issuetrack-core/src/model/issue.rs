// ── Issue entity ──
//
// The single domain entity. An issue without an id has never been saved;
// ids are only ever assigned by the server.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ── IssueId ─────────────────────────────────────────────────────────

/// Server-assigned issue identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueId(i64);

impl IssueId {
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for IssueId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<i64> for IssueId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

// ── Issue ───────────────────────────────────────────────────────────

/// An issue with its `created` date already converted to a calendar date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: Option<IssueId>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub created: Option<NaiveDate>,
    pub state: Option<String>,
    pub priority: Option<String>,
    /// Base64 payload.
    pub attachment: Option<String>,
    pub attachment_content_type: Option<String>,
    pub comment: Option<String>,
}

impl Issue {
    /// The all-null template handed to the create dialog.
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn has_attachment(&self) -> bool {
        self.attachment.as_deref().is_some_and(|a| !a.is_empty())
    }

    /// Display label: the name, or `#<id>` when unnamed.
    pub fn label(&self) -> String {
        match (&self.name, self.id) {
            (Some(name), _) if !name.is_empty() => name.clone(),
            (_, Some(id)) => format!("#{id}"),
            _ => String::from("(new issue)"),
        }
    }
}
