//! The GitHub operations commands are built from.
//!
//! [`GitHubApi`] is the seam between command handlers and the network: the
//! production implementation is [`OctocrabClient`](super::OctocrabClient), and
//! tests substitute a scripted mock. Every operation is a single fallible
//! remote call; retry policy lives in the worker loop, never here.

use std::future::Future;

use crate::types::{IssueNumber, RepoId};

use super::error::GitHubApiError;

/// A label definition used when creating labels in a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewLabel<'a> {
    pub name: &'a str,

    /// Six hex digits, without a leading `#`.
    pub color: &'a str,

    pub description: &'a str,
}

/// GitHub API operations needed by command handlers.
///
/// Issues and pull requests share one number space, so operations that apply
/// to both take an [`IssueNumber`].
///
/// # Example (mock for testing)
///
/// ```ignore
/// struct AlwaysMember;
///
/// impl GitHubApi for AlwaysMember {
///     async fn is_org_member(&self, _org: &str, _user: &str) -> Result<bool, GitHubApiError> {
///         Ok(true)
///     }
///     // ...
/// }
/// ```
pub trait GitHubApi: Send + Sync {
    /// Sets the issue or pull request state to closed.
    fn close_issue(
        &self,
        repo: &RepoId,
        issue: IssueNumber,
    ) -> impl Future<Output = Result<(), GitHubApiError>> + Send;

    fn add_assignees(
        &self,
        repo: &RepoId,
        issue: IssueNumber,
        assignees: &[String],
    ) -> impl Future<Output = Result<(), GitHubApiError>> + Send;

    fn remove_assignees(
        &self,
        repo: &RepoId,
        issue: IssueNumber,
        assignees: &[String],
    ) -> impl Future<Output = Result<(), GitHubApiError>> + Send;

    /// Adds labels to an issue. Labels already present are left alone.
    fn add_labels(
        &self,
        repo: &RepoId,
        issue: IssueNumber,
        labels: &[String],
    ) -> impl Future<Output = Result<(), GitHubApiError>> + Send;

    /// Removes a label from an issue. Removing a label the issue does not
    /// carry succeeds.
    fn remove_label(
        &self,
        repo: &RepoId,
        issue: IssueNumber,
        label: &str,
    ) -> impl Future<Output = Result<(), GitHubApiError>> + Send;

    /// Lists the names of every label defined in the repository, following
    /// pagination to the end.
    fn list_labels(
        &self,
        repo: &RepoId,
    ) -> impl Future<Output = Result<Vec<String>, GitHubApiError>> + Send;

    fn create_label(
        &self,
        repo: &RepoId,
        label: NewLabel<'_>,
    ) -> impl Future<Output = Result<(), GitHubApiError>> + Send;

    /// Requests reviews on a pull request.
    fn request_reviewers(
        &self,
        repo: &RepoId,
        pr: IssueNumber,
        reviewers: &[String],
    ) -> impl Future<Output = Result<(), GitHubApiError>> + Send;

    /// Withdraws review requests on a pull request.
    fn remove_reviewers(
        &self,
        repo: &RepoId,
        pr: IssueNumber,
        reviewers: &[String],
    ) -> impl Future<Output = Result<(), GitHubApiError>> + Send;

    /// Checks whether `user` is a member of organization `org`.
    fn is_org_member(
        &self,
        org: &str,
        user: &str,
    ) -> impl Future<Output = Result<bool, GitHubApiError>> + Send;

    /// Checks whether `user` is a collaborator on the repository.
    fn is_collaborator(
        &self,
        repo: &RepoId,
        user: &str,
    ) -> impl Future<Output = Result<bool, GitHubApiError>> + Send;
}
