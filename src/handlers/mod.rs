//! Command handlers and the registry that maps command names to them.
//!
//! # Handler Contract
//!
//! Every handler follows the same order:
//!
//! 1. Validate syntax (argument count and shape); malformed input is
//!    [`Outcome::Invalid`]
//! 2. Authorize the actor; a lack of permission is also [`Outcome::Invalid`]
//! 3. Perform one idempotent mutation
//!
//! Handlers return `Err` only for GitHub API failures. [`HandlerKind::run`]
//! maps those to [`Outcome::TransientFailure`] when a retry can help and to
//! [`Outcome::Invalid`] otherwise, so handlers contain no retry logic.
//!
//! Aliases (`/assign` and `/unassign`) share a [`HandlerKind`]; the handler
//! tells them apart by the command name.

mod assign;
mod cc;
mod close;
mod label;
pub mod presets;
mod toggle;

use std::collections::HashMap;

use tracing::{info, warn};

use crate::commands::Command;
use crate::github::{GitHubApi, GitHubApiError, GitHubErrorKind};
use crate::types::RepoId;

pub use presets::{PRESET_LABELS, add_preset_labels};

/// The result of executing one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The command took effect (or was already in effect).
    Handled,

    /// The command was rejected: bad syntax, missing permission, or a request
    /// GitHub refuses. Never retried.
    Invalid,

    /// GitHub could not be reached or asked us to slow down. Retried.
    TransientFailure,
}

/// What a handler returns before API errors are categorized.
pub(crate) type HandlerResult = Result<Outcome, GitHubApiError>;

/// The closed set of command behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    /// `/close`
    Close,
    /// `/assign`, `/unassign`
    Assign,
    /// `/cc`, `/uncc`
    Cc,
    /// `/hold [cancel]`
    Hold,
    /// `/wip [cancel]`
    Wip,
    /// `/lgtm [cancel]`
    Lgtm,
    /// `/kind`, `/area` and their `/remove-` forms
    Label,
}

impl HandlerKind {
    /// Executes the command and categorizes any API failure.
    pub async fn run<G: GitHubApi>(self, github: &G, command: &Command) -> Outcome {
        let result = match self {
            HandlerKind::Close => close::run(github, command).await,
            HandlerKind::Assign => assign::run(github, command).await,
            HandlerKind::Cc => cc::run(github, command).await,
            HandlerKind::Hold => toggle::run(github, command, toggle::HOLD).await,
            HandlerKind::Wip => toggle::run(github, command, toggle::WORK_IN_PROGRESS).await,
            HandlerKind::Lgtm => toggle::run(github, command, toggle::LGTM).await,
            HandlerKind::Label => label::run(github, command).await,
        };

        match result {
            Ok(outcome) => outcome,
            Err(err) => match err.kind {
                GitHubErrorKind::Transient => {
                    warn!(command = %command, error = %err, "Command failed, will retry");
                    Outcome::TransientFailure
                }
                GitHubErrorKind::Permanent => {
                    warn!(command = %command, error = %err, "Command failed permanently");
                    Outcome::Invalid
                }
            },
        }
    }
}

/// Static mapping from command name to handler.
#[derive(Debug, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<&'static str, HandlerKind>,
}

impl HandlerRegistry {
    /// A registry with no commands.
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Every built-in command.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry
            .register("/close", HandlerKind::Close)
            .register("/assign", HandlerKind::Assign)
            .register("/unassign", HandlerKind::Assign)
            .register("/cc", HandlerKind::Cc)
            .register("/uncc", HandlerKind::Cc)
            .register("/hold", HandlerKind::Hold)
            .register("/wip", HandlerKind::Wip)
            .register("/lgtm", HandlerKind::Lgtm)
            .register("/kind", HandlerKind::Label)
            .register("/remove-kind", HandlerKind::Label)
            .register("/area", HandlerKind::Label)
            .register("/remove-area", HandlerKind::Label);
        registry
    }

    pub fn register(&mut self, name: &'static str, kind: HandlerKind) -> &mut Self {
        self.handlers.insert(name, kind);
        self
    }

    /// Looks up a handler by exact command name.
    pub fn lookup(&self, name: &str) -> Option<HandlerKind> {
        self.handlers.get(name).copied()
    }

    /// Registered command names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Logs a rejected command and returns [`Outcome::Invalid`].
pub(crate) fn invalid(command: &Command, reason: &str) -> HandlerResult {
    info!(command = %command, reason, "Command invalid");
    Ok(Outcome::Invalid)
}

/// Logs a completed command and returns [`Outcome::Handled`].
pub(crate) fn handled(command: &Command) -> HandlerResult {
    info!(command = %command, "Command succeeded");
    Ok(Outcome::Handled)
}

/// Checks whether `user` belongs to the owning organization or collaborates on
/// the repository. The collaborator check is skipped for members.
pub(crate) async fn is_member_or_collaborator<G: GitHubApi>(
    github: &G,
    repo: &RepoId,
    user: &str,
) -> Result<bool, GitHubApiError> {
    if github.is_org_member(&repo.owner, user).await? {
        return Ok(true);
    }
    github.is_collaborator(repo, user).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ApiCall, MockGitHub, command};

    #[test]
    fn standard_registry_names() {
        let registry = HandlerRegistry::standard();
        assert_eq!(
            registry.names(),
            vec![
                "/area",
                "/assign",
                "/cc",
                "/close",
                "/hold",
                "/kind",
                "/lgtm",
                "/remove-area",
                "/remove-kind",
                "/unassign",
                "/uncc",
                "/wip",
            ]
        );
    }

    #[test]
    fn aliases_share_a_handler() {
        let registry = HandlerRegistry::standard();
        assert_eq!(registry.lookup("/assign"), registry.lookup("/unassign"));
        assert_eq!(registry.lookup("/cc"), registry.lookup("/uncc"));
        assert_eq!(registry.lookup("/kind"), registry.lookup("/remove-area"));
    }

    #[test]
    fn lookup_is_exact() {
        let registry = HandlerRegistry::standard();
        assert_eq!(registry.lookup("/close"), Some(HandlerKind::Close));
        assert_eq!(registry.lookup("/Close"), None);
        assert_eq!(registry.lookup("close"), None);
        assert_eq!(registry.lookup("/close "), None);
        assert_eq!(registry.lookup("/approve"), None);
    }

    #[test]
    fn register_overrides() {
        let mut registry = HandlerRegistry::empty();
        assert!(registry.is_empty());
        registry
            .register("/x", HandlerKind::Hold)
            .register("/x", HandlerKind::Wip);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("/x"), Some(HandlerKind::Wip));
    }

    #[tokio::test]
    async fn transient_api_error_maps_to_transient_failure() {
        let github = MockGitHub::new();
        github.fail_next(1);

        let outcome = HandlerKind::Hold
            .run(&github, &command("alice", "bob", "/hold"))
            .await;
        assert_eq!(outcome, Outcome::TransientFailure);
    }

    #[tokio::test]
    async fn permanent_api_error_maps_to_invalid() {
        let github = MockGitHub::new();
        github.fail_permanently_next(1);

        let outcome = HandlerKind::Hold
            .run(&github, &command("alice", "bob", "/hold"))
            .await;
        assert_eq!(outcome, Outcome::Invalid);
    }

    #[tokio::test]
    async fn member_check_short_circuits_for_org_members() {
        let github = MockGitHub::new().with_org_members("octo-org", ["carol"]);
        let repo = crate::test_utils::test_repo();

        assert!(is_member_or_collaborator(&github, &repo, "carol").await.unwrap());
        assert_eq!(
            github.calls(),
            vec![ApiCall::IsOrgMember {
                org: "octo-org".to_string(),
                user: "carol".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn member_check_falls_back_to_collaborators() {
        let github = MockGitHub::new().with_collaborators(["dave"]);
        let repo = crate::test_utils::test_repo();

        assert!(is_member_or_collaborator(&github, &repo, "dave").await.unwrap());
        assert!(!is_member_or_collaborator(&github, &repo, "mallory").await.unwrap());
        assert_eq!(github.call_count(), 4);
    }
}
