// ── Domain model ──

mod issue;
mod paging;

pub use issue::{Issue, IssueId};
pub use paging::{DEFAULT_PAGE, DEFAULT_SORT, PagingParams};
