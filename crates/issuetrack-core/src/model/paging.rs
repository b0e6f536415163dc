// ── List paging parameters ──
//
// Parsed from the list URL query (`?page&sort&search`). `page` is one-based
// here and converted to the zero-based wire form by `page_request()`.

use issuetrack_api::{ITEMS_PER_PAGE, PageRequest};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_SORT: &str = "id,asc";

/// Resolved paging state for the list view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagingParams {
    pub page: u32,
    /// Raw sort parameter, e.g. `"name,desc"`.
    pub sort: String,
    pub predicate: String,
    pub ascending: bool,
    pub search: Option<String>,
}

impl Default for PagingParams {
    fn default() -> Self {
        Self::from_query(None, None, None)
    }
}

impl PagingParams {
    /// Build from raw query values; absent values take the list defaults.
    pub fn from_query(page: Option<&str>, sort: Option<&str>, search: Option<&str>) -> Self {
        let sort = sort.filter(|s| !s.is_empty()).unwrap_or(DEFAULT_SORT);
        Self {
            page: parse_page(page),
            sort: sort.to_owned(),
            predicate: parse_predicate(sort),
            ascending: parse_ascending(sort),
            search: search.filter(|s| !s.is_empty()).map(str::to_owned),
        }
    }

    /// Sort parameters sent to the server. A non-`id` predicate gets `id`
    /// appended as a stable tiebreaker.
    pub fn sort_params(&self) -> Vec<String> {
        let direction = if self.ascending { "asc" } else { "desc" };
        let mut sort = vec![format!("{},{direction}", self.predicate)];
        if self.predicate != "id" {
            sort.push("id".into());
        }
        sort
    }

    pub fn page_request(&self) -> PageRequest {
        PageRequest {
            page: self.page.saturating_sub(1),
            size: ITEMS_PER_PAGE,
            sort: self.sort_params(),
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(DEFAULT_PAGE);
        self
    }

    pub fn with_sort(mut self, predicate: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.sort = format!("{predicate},{direction}");
        self.predicate = predicate.to_owned();
        self.ascending = ascending;
        self
    }

    pub fn with_search(mut self, search: Option<String>) -> Self {
        self.search = search.filter(|s| !s.is_empty());
        self
    }

    /// Number of pages needed for `total` items.
    pub fn page_count(total: u64) -> u64 {
        total.div_ceil(u64::from(ITEMS_PER_PAGE)).max(1)
    }
}

/// One-based page number; anything unparsable or zero becomes page 1.
pub fn parse_page(raw: Option<&str>) -> u32 {
    raw.and_then(|p| p.trim().parse::<u32>().ok())
        .filter(|p| *p >= DEFAULT_PAGE)
        .unwrap_or(DEFAULT_PAGE)
}

/// The field name before the first comma.
pub fn parse_predicate(sort: &str) -> String {
    sort.split(',').next().unwrap_or_default().to_owned()
}

/// Ascending unless the last comma-separated segment is `desc`.
pub fn parse_ascending(sort: &str) -> bool {
    let mut parts = sort.split(',');
    parts.next();
    parts.next_back().is_none_or(|direction| direction != "desc")
}
