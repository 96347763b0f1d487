//! GitHub API access.
//!
//! - [`GitHubApi`]: the operations command handlers need
//! - [`GitHubApiError`]: failures categorized as transient or permanent
//! - [`OctocrabClient`]: the production implementation

mod api;
mod client;
mod error;

pub use api::{GitHubApi, NewLabel};
pub use client::OctocrabClient;
pub use error::{GitHubApiError, GitHubErrorKind};
