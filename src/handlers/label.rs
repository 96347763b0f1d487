//! `/kind <value>`, `/area <value>` and their `/remove-` forms.
//!
//! The label is `<family>/<value>`, lower-cased. Commands only apply labels the
//! repository already defines; they never create new ones.

use std::collections::HashSet;

use crate::commands::Command;
use crate::github::{GitHubApi, GitHubApiError};
use crate::types::RepoId;

use super::{HandlerResult, handled, invalid};

pub(super) async fn run<G: GitHubApi>(github: &G, command: &Command) -> HandlerResult {
    let value = match command.args.as_slice() {
        [value] if !value.is_empty() => value,
        _ => return invalid(command, "takes exactly one label value"),
    };

    let Some(verb) = command.name.strip_prefix('/') else {
        return invalid(command, "not a command name");
    };
    let (family, remove) = match verb.strip_prefix("remove-") {
        Some(family) => (family, true),
        None => (verb, false),
    };
    let label = format!("{family}/{value}").to_lowercase();

    if !repo_labels(github, command.repo()).await?.contains(&label) {
        return invalid(command, "label is not defined in the repository");
    }

    if remove {
        github
            .remove_label(command.repo(), command.issue(), &label)
            .await?;
    } else {
        github
            .add_labels(command.repo(), command.issue(), &[label])
            .await?;
    }
    handled(command)
}

/// The repository's label names, lower-cased.
pub(crate) async fn repo_labels<G: GitHubApi>(
    github: &G,
    repo: &RepoId,
) -> Result<HashSet<String>, GitHubApiError> {
    let labels = github.list_labels(repo).await?;
    Ok(labels.into_iter().map(|name| name.to_lowercase()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::Outcome;
    use crate::test_utils::{ApiCall, MockGitHub, command, test_repo};
    use crate::types::IssueNumber;

    fn github() -> MockGitHub {
        MockGitHub::new().with_labels(["kind/bug", "Kind/Feature", "area/api"])
    }

    #[tokio::test]
    async fn adds_known_label() {
        let github = github();
        let outcome = run(&github, &command("alice", "bob", "/kind bug")).await.unwrap();

        assert_eq!(outcome, Outcome::Handled);
        assert_eq!(
            github.mutations(),
            vec![ApiCall::AddLabels {
                repo: test_repo(),
                issue: IssueNumber(42),
                labels: vec!["kind/bug".to_string()],
            }]
        );
    }

    #[tokio::test]
    async fn matching_is_case_insensitive() {
        let github = github();
        let outcome = run(&github, &command("alice", "bob", "/kind FEATURE"))
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Handled);
        assert_eq!(
            github.mutations(),
            vec![ApiCall::AddLabels {
                repo: test_repo(),
                issue: IssueNumber(42),
                labels: vec!["kind/feature".to_string()],
            }]
        );
    }

    #[tokio::test]
    async fn unknown_label_is_invalid_and_not_created() {
        let github = MockGitHub::new().with_labels(["kind/feature"]);
        let outcome = run(&github, &command("alice", "bob", "/kind bug")).await.unwrap();

        assert_eq!(outcome, Outcome::Invalid);
        assert_eq!(github.calls(), vec![ApiCall::ListLabels { repo: test_repo() }]);
    }

    #[tokio::test]
    async fn remove_form_removes() {
        let github = github();
        let outcome = run(&github, &command("alice", "bob", "/remove-area api"))
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Handled);
        assert_eq!(
            github.mutations(),
            vec![ApiCall::RemoveLabel {
                repo: test_repo(),
                issue: IssueNumber(42),
                label: "area/api".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn family_is_taken_from_the_command() {
        let github = github();
        let outcome = run(&github, &command("alice", "bob", "/area bug")).await.unwrap();
        assert_eq!(outcome, Outcome::Invalid);
    }

    #[tokio::test]
    async fn argument_count_is_checked_first() {
        let github = github();
        for line in ["/kind", "/kind bug feature", "/kind  bug"] {
            let outcome = run(&github, &command("alice", "bob", line)).await.unwrap();
            assert_eq!(outcome, Outcome::Invalid, "{line}");
        }
        assert_eq!(github.call_count(), 0);
    }

    #[tokio::test]
    async fn label_listing_failure_is_propagated() {
        let github = github();
        github.fail_next(1);
        assert!(run(&github, &command("alice", "bob", "/kind bug")).await.is_err());
        assert!(github.mutations().is_empty());
    }
}
