// ── Wire models ──
//
// JSON shapes exactly as the server sends them. `created` stays the raw
// date-only string; conversion to a calendar date happens in issuetrack-core.

use serde::{Deserialize, Serialize};

/// Default page size used by the list and search endpoints.
pub const ITEMS_PER_PAGE: u32 = 20;

/// An issue as serialized on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// `YYYY-MM-DD`, or null.
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    /// Base64 payload.
    #[serde(default)]
    pub attachment: Option<String>,
    #[serde(default)]
    pub attachment_content_type: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Page request parameters (`page` is zero-based on the wire).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    /// Each entry becomes one `sort=` parameter, e.g. `"name,asc"`.
    pub sort: Vec<String>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: ITEMS_PER_PAGE,
            sort: Vec::new(),
        }
    }
}

impl PageRequest {
    pub(crate) fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("page", self.page.to_string()), ("size", self.size.to_string())];
        params.extend(self.sort.iter().map(|s| ("sort", s.clone())));
        params
    }
}

/// One page of results plus the `X-Total-Count` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total_count: u64,
}
