//! Shared test utilities: command builders, a scripted GitHub mock, and
//! arbitrary generators for property-based testing.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Mutex;

use proptest::prelude::*;

use crate::commands::{Command, CommandContext, CommandHandle, EventKind, EventSource};
use crate::github::{GitHubApi, GitHubApiError, NewLabel};
use crate::types::{IssueNumber, OwnerType, RepoId};

// ─── Command builders ────────────────────────────────────────────────────────

pub const TEST_ORG: &str = "octo-org";
pub const TEST_REPO: &str = "widgets";

pub fn test_repo() -> RepoId {
    RepoId::new(TEST_ORG, TEST_REPO)
}

/// A context on issue #42 of `octo-org/widgets`, opened by `author`, commented
/// on by `actor`.
pub fn test_context(author: &str, actor: &str) -> CommandContext {
    CommandContext {
        repo: test_repo(),
        owner_type: OwnerType::Organization,
        issue: IssueNumber(42),
        author: author.to_string(),
        actor: actor.to_string(),
        source: EventSource {
            kind: EventKind::IssueComment,
            delivery_id: None,
        },
    }
}

/// Builds a command from a single line such as `"/assign @alice"`.
pub fn command(author: &str, actor: &str, line: &str) -> Command {
    command_in(test_context(author, actor), line)
}

pub fn command_in(context: CommandContext, line: &str) -> Command {
    let mut parsed = crate::commands::parse_comment_body(line);
    assert_eq!(parsed.len(), 1, "test line must hold exactly one command");
    Command::new(context, parsed.remove(0))
}

pub fn handle(author: &str, actor: &str, line: &str) -> CommandHandle {
    CommandHandle::new(command(author, actor, line))
}

// ─── Scripted GitHub mock ────────────────────────────────────────────────────

/// One recorded call against [`MockGitHub`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    CloseIssue { repo: RepoId, issue: IssueNumber },
    AddAssignees { repo: RepoId, issue: IssueNumber, users: Vec<String> },
    RemoveAssignees { repo: RepoId, issue: IssueNumber, users: Vec<String> },
    AddLabels { repo: RepoId, issue: IssueNumber, labels: Vec<String> },
    RemoveLabel { repo: RepoId, issue: IssueNumber, label: String },
    ListLabels { repo: RepoId },
    CreateLabel { repo: RepoId, name: String },
    RequestReviewers { repo: RepoId, pr: IssueNumber, users: Vec<String> },
    RemoveReviewers { repo: RepoId, pr: IssueNumber, users: Vec<String> },
    IsOrgMember { org: String, user: String },
    IsCollaborator { repo: RepoId, user: String },
}

impl ApiCall {
    /// True for calls that change something on GitHub.
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            ApiCall::ListLabels { .. } | ApiCall::IsOrgMember { .. } | ApiCall::IsCollaborator { .. }
        )
    }
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<ApiCall>,
    org_members: HashSet<(String, String)>,
    collaborators: HashSet<String>,
    repo_labels: Vec<String>,
    issue_labels: HashMap<IssueNumber, BTreeSet<String>>,
    transient_failures: u32,
    permanent_failures: u32,
    panics: u32,
}

/// An in-memory [`GitHubApi`] that records every call.
///
/// Failures and panics are injected per call: `fail_next(n)` makes the next
/// `n` calls (of any kind) return a transient error.
#[derive(Debug, Default)]
pub struct MockGitHub {
    state: Mutex<MockState>,
}

impl MockGitHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_org_members<'a>(self, org: &str, users: impl IntoIterator<Item = &'a str>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            for user in users {
                state.org_members.insert((org.to_string(), user.to_string()));
            }
        }
        self
    }

    /// Collaborators on every repository.
    pub fn with_collaborators<'a>(self, users: impl IntoIterator<Item = &'a str>) -> Self {
        self.state
            .lock()
            .unwrap()
            .collaborators
            .extend(users.into_iter().map(str::to_string));
        self
    }

    /// Labels defined in every repository.
    pub fn with_labels<'a>(self, labels: impl IntoIterator<Item = &'a str>) -> Self {
        self.state
            .lock()
            .unwrap()
            .repo_labels
            .extend(labels.into_iter().map(str::to_string));
        self
    }

    /// The next `n` calls return a transient (HTTP 502) error.
    pub fn fail_next(&self, n: u32) {
        self.state.lock().unwrap().transient_failures = n;
    }

    /// The next `n` calls return a permanent (HTTP 422) error.
    pub fn fail_permanently_next(&self, n: u32) {
        self.state.lock().unwrap().permanent_failures = n;
    }

    /// The next `n` calls panic.
    pub fn panic_next(&self, n: u32) {
        self.state.lock().unwrap().panics = n;
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn mutations(&self) -> Vec<ApiCall> {
        self.calls().into_iter().filter(ApiCall::is_mutation).collect()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    pub fn repo_labels(&self) -> Vec<String> {
        self.state.lock().unwrap().repo_labels.clone()
    }

    pub fn issue_labels(&self, issue: IssueNumber) -> BTreeSet<String> {
        self.state
            .lock()
            .unwrap()
            .issue_labels
            .get(&issue)
            .cloned()
            .unwrap_or_default()
    }

    /// Records the call, then applies any injected failure.
    fn record(&self, call: ApiCall) -> Result<(), GitHubApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if state.panics > 0 {
            state.panics -= 1;
            drop(state);
            panic!("injected panic");
        }
        if state.transient_failures > 0 {
            state.transient_failures -= 1;
            return Err(GitHubApiError::from_status(502, "Bad Gateway"));
        }
        if state.permanent_failures > 0 {
            state.permanent_failures -= 1;
            return Err(GitHubApiError::from_status(422, "Validation Failed"));
        }
        Ok(())
    }
}

impl GitHubApi for MockGitHub {
    async fn close_issue(&self, repo: &RepoId, issue: IssueNumber) -> Result<(), GitHubApiError> {
        self.record(ApiCall::CloseIssue {
            repo: repo.clone(),
            issue,
        })
    }

    async fn add_assignees(
        &self,
        repo: &RepoId,
        issue: IssueNumber,
        assignees: &[String],
    ) -> Result<(), GitHubApiError> {
        self.record(ApiCall::AddAssignees {
            repo: repo.clone(),
            issue,
            users: assignees.to_vec(),
        })
    }

    async fn remove_assignees(
        &self,
        repo: &RepoId,
        issue: IssueNumber,
        assignees: &[String],
    ) -> Result<(), GitHubApiError> {
        self.record(ApiCall::RemoveAssignees {
            repo: repo.clone(),
            issue,
            users: assignees.to_vec(),
        })
    }

    async fn add_labels(
        &self,
        repo: &RepoId,
        issue: IssueNumber,
        labels: &[String],
    ) -> Result<(), GitHubApiError> {
        self.record(ApiCall::AddLabels {
            repo: repo.clone(),
            issue,
            labels: labels.to_vec(),
        })?;
        self.state
            .lock()
            .unwrap()
            .issue_labels
            .entry(issue)
            .or_default()
            .extend(labels.iter().cloned());
        Ok(())
    }

    async fn remove_label(
        &self,
        repo: &RepoId,
        issue: IssueNumber,
        label: &str,
    ) -> Result<(), GitHubApiError> {
        self.record(ApiCall::RemoveLabel {
            repo: repo.clone(),
            issue,
            label: label.to_string(),
        })?;
        if let Some(labels) = self.state.lock().unwrap().issue_labels.get_mut(&issue) {
            labels.remove(label);
        }
        Ok(())
    }

    async fn list_labels(&self, repo: &RepoId) -> Result<Vec<String>, GitHubApiError> {
        self.record(ApiCall::ListLabels { repo: repo.clone() })?;
        Ok(self.repo_labels())
    }

    async fn create_label(&self, repo: &RepoId, label: NewLabel<'_>) -> Result<(), GitHubApiError> {
        self.record(ApiCall::CreateLabel {
            repo: repo.clone(),
            name: label.name.to_string(),
        })?;
        self.state
            .lock()
            .unwrap()
            .repo_labels
            .push(label.name.to_string());
        Ok(())
    }

    async fn request_reviewers(
        &self,
        repo: &RepoId,
        pr: IssueNumber,
        reviewers: &[String],
    ) -> Result<(), GitHubApiError> {
        self.record(ApiCall::RequestReviewers {
            repo: repo.clone(),
            pr,
            users: reviewers.to_vec(),
        })
    }

    async fn remove_reviewers(
        &self,
        repo: &RepoId,
        pr: IssueNumber,
        reviewers: &[String],
    ) -> Result<(), GitHubApiError> {
        self.record(ApiCall::RemoveReviewers {
            repo: repo.clone(),
            pr,
            users: reviewers.to_vec(),
        })
    }

    async fn is_org_member(&self, org: &str, user: &str) -> Result<bool, GitHubApiError> {
        self.record(ApiCall::IsOrgMember {
            org: org.to_string(),
            user: user.to_string(),
        })?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .org_members
            .contains(&(org.to_string(), user.to_string())))
    }

    async fn is_collaborator(&self, repo: &RepoId, user: &str) -> Result<bool, GitHubApiError> {
        self.record(ApiCall::IsCollaborator {
            repo: repo.clone(),
            user: user.to_string(),
        })?;
        Ok(self.state.lock().unwrap().collaborators.contains(user))
    }
}

// ─── Generators ──────────────────────────────────────────────────────────────

pub fn arb_login() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,15}".prop_map(String::from)
}

/// A single well-formed command line, e.g. `/cc @ab xy`.
pub fn arb_command_line() -> impl Strategy<Value = String> {
    (
        "/[a-z][a-z-]{0,10}",
        prop::collection::vec("@?[a-z0-9]{1,8}", 0..4),
    )
        .prop_map(|(name, args)| {
            if args.is_empty() {
                name
            } else {
                format!("{} {}", name, args.join(" "))
            }
        })
}
