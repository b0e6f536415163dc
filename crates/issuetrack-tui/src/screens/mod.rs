pub mod detail;
pub mod issues;

pub use detail::DetailScreen;
pub use issues::IssuesScreen;
