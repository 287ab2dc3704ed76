//! Enterprise-search client for the Scout agent.
//!
//! One HTTP surface: a POST to the deployment's `/rest/api/v1/search`
//! endpoint. The backend filters results by the caller's permissions, so an
//! empty result set is ambiguous between "no matches" and "no access"; the
//! formatting layer states that ambiguity instead of guessing.

pub mod client;
pub mod format;
pub mod types;

pub use client::{SearchClient, SearchError};
pub use format::format_hits;
pub use types::SearchHit;
