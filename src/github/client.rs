//! Octocrab-backed implementation of [`GitHubApi`].
//!
//! Unlike a repository-scoped client, one `OctocrabClient` serves every
//! repository the bot is installed on: each call names its target.

use octocrab::Octocrab;
use octocrab::models::IssueState;
use serde_json::json;

use crate::types::{IssueNumber, RepoId};

use super::api::{GitHubApi, NewLabel};
use super::error::GitHubApiError;

/// Labels listed per page when reading a repository's label set.
const LABELS_PER_PAGE: u8 = 100;

/// A GitHub API client authenticated for the bot's account.
#[derive(Clone)]
pub struct OctocrabClient {
    client: Octocrab,
}

impl OctocrabClient {
    /// Creates a client from a pre-configured Octocrab instance.
    ///
    /// Use this when you need custom authentication (e.g., GitHub App
    /// installation tokens).
    pub fn new(client: Octocrab) -> Self {
        Self { client }
    }

    /// Creates a client authenticated with a personal access token.
    pub fn from_token(token: impl Into<String>) -> Result<Self, GitHubApiError> {
        let client = Octocrab::builder()
            .personal_token(token.into())
            .build()
            .map_err(GitHubApiError::from_octocrab)?;
        Ok(Self::new(client))
    }
}

impl OctocrabClient {
    /// Reads a membership-style endpoint: 204 means present, 404 (or the
    /// 302 GitHub sends to non-members asking about an organization) means
    /// absent. Any other status is an error.
    async fn check_presence(&self, route: String) -> Result<bool, GitHubApiError> {
        let response = self
            .client
            ._get(route)
            .await
            .map_err(GitHubApiError::from_octocrab)?;

        let status = response.status();
        match status.as_u16() {
            204 => Ok(true),
            302 | 404 => Ok(false),
            code => {
                let reason = status.canonical_reason().unwrap_or("unexpected status");
                let message = match self.client.body_to_string(response).await {
                    Ok(body) if !body.trim().is_empty() => body,
                    _ => reason.to_string(),
                };
                Err(GitHubApiError::from_status(code, message))
            }
        }
    }
}

impl std::fmt::Debug for OctocrabClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OctocrabClient").finish_non_exhaustive()
    }
}

fn as_strs(values: &[String]) -> Vec<&str> {
    values.iter().map(String::as_str).collect()
}

impl GitHubApi for OctocrabClient {
    async fn close_issue(&self, repo: &RepoId, issue: IssueNumber) -> Result<(), GitHubApiError> {
        self.client
            .issues(&repo.owner, &repo.repo)
            .update(issue.0)
            .state(IssueState::Closed)
            .send()
            .await
            .map_err(GitHubApiError::from_octocrab)?;
        Ok(())
    }

    async fn add_assignees(
        &self,
        repo: &RepoId,
        issue: IssueNumber,
        assignees: &[String],
    ) -> Result<(), GitHubApiError> {
        self.client
            .issues(&repo.owner, &repo.repo)
            .add_assignees(issue.0, &as_strs(assignees))
            .await
            .map_err(GitHubApiError::from_octocrab)?;
        Ok(())
    }

    async fn remove_assignees(
        &self,
        repo: &RepoId,
        issue: IssueNumber,
        assignees: &[String],
    ) -> Result<(), GitHubApiError> {
        let route = format!(
            "/repos/{}/{}/issues/{}/assignees",
            repo.owner, repo.repo, issue.0
        );
        let _: serde_json::Value = self
            .client
            .delete(route, Some(&json!({ "assignees": assignees })))
            .await
            .map_err(GitHubApiError::from_octocrab)?;
        Ok(())
    }

    async fn add_labels(
        &self,
        repo: &RepoId,
        issue: IssueNumber,
        labels: &[String],
    ) -> Result<(), GitHubApiError> {
        self.client
            .issues(&repo.owner, &repo.repo)
            .add_labels(issue.0, labels)
            .await
            .map_err(GitHubApiError::from_octocrab)?;
        Ok(())
    }

    async fn remove_label(
        &self,
        repo: &RepoId,
        issue: IssueNumber,
        label: &str,
    ) -> Result<(), GitHubApiError> {
        match self
            .client
            .issues(&repo.owner, &repo.repo)
            .remove_label(issue.0, label)
            .await
        {
            Ok(_) => Ok(()),
            Err(err) => {
                let err = GitHubApiError::from_octocrab(err);
                // GitHub answers 404 when the issue does not carry the label.
                if err.is_not_found() { Ok(()) } else { Err(err) }
            }
        }
    }

    async fn list_labels(&self, repo: &RepoId) -> Result<Vec<String>, GitHubApiError> {
        let first_page = self
            .client
            .issues(&repo.owner, &repo.repo)
            .list_labels_for_repo()
            .per_page(LABELS_PER_PAGE)
            .send()
            .await
            .map_err(GitHubApiError::from_octocrab)?;

        let labels = self
            .client
            .all_pages(first_page)
            .await
            .map_err(GitHubApiError::from_octocrab)?;

        Ok(labels.into_iter().map(|label| label.name).collect())
    }

    async fn create_label(&self, repo: &RepoId, label: NewLabel<'_>) -> Result<(), GitHubApiError> {
        self.client
            .issues(&repo.owner, &repo.repo)
            .create_label(label.name, label.color, label.description)
            .await
            .map_err(GitHubApiError::from_octocrab)?;
        Ok(())
    }

    async fn request_reviewers(
        &self,
        repo: &RepoId,
        pr: IssueNumber,
        reviewers: &[String],
    ) -> Result<(), GitHubApiError> {
        let route = format!(
            "/repos/{}/{}/pulls/{}/requested_reviewers",
            repo.owner, repo.repo, pr.0
        );
        let _: serde_json::Value = self
            .client
            .post(route, Some(&json!({ "reviewers": reviewers })))
            .await
            .map_err(GitHubApiError::from_octocrab)?;
        Ok(())
    }

    async fn remove_reviewers(
        &self,
        repo: &RepoId,
        pr: IssueNumber,
        reviewers: &[String],
    ) -> Result<(), GitHubApiError> {
        let route = format!(
            "/repos/{}/{}/pulls/{}/requested_reviewers",
            repo.owner, repo.repo, pr.0
        );
        let _: serde_json::Value = self
            .client
            .delete(route, Some(&json!({ "reviewers": reviewers })))
            .await
            .map_err(GitHubApiError::from_octocrab)?;
        Ok(())
    }

    async fn is_org_member(&self, org: &str, user: &str) -> Result<bool, GitHubApiError> {
        self.check_presence(format!("/orgs/{org}/members/{user}")).await
    }

    async fn is_collaborator(&self, repo: &RepoId, user: &str) -> Result<bool, GitHubApiError> {
        self.check_presence(format!(
            "/repos/{}/{}/collaborators/{}",
            repo.owner, repo.repo, user
        ))
        .await
    }
}
