//! The preset label set and its reconciliation.
//!
//! Commands such as `/hold` and `/kind bug` rely on labels existing in the
//! repository. [`add_preset_labels`] creates whichever presets are missing. It
//! never edits or deletes existing labels.

use tracing::info;

use crate::github::{GitHubApi, GitHubApiError, NewLabel};
use crate::types::RepoId;

use super::label::repo_labels;

/// Labels every repository served by the bot is expected to define.
pub const PRESET_LABELS: &[NewLabel<'static>] = &[
    NewLabel {
        name: "do-not-merge/hold",
        color: "e11d21",
        description: "Indicates that a PR should not merge because someone has issued a /hold command.",
    },
    NewLabel {
        name: "do-not-merge/work-in-progress",
        color: "e11d21",
        description: "Indicates that a PR should not merge because it is a work in progress.",
    },
    NewLabel {
        name: "lgtm",
        color: "15dd18",
        description: "Indicates that a PR is ready to be merged.",
    },
    NewLabel {
        name: "approved",
        color: "0ffa16",
        description: "Indicates a PR has been approved by an approver from all required OWNERS files.",
    },
    NewLabel {
        name: "kind/bug",
        color: "e11d21",
        description: "Categorizes issue or PR as related to a bug.",
    },
    NewLabel {
        name: "kind/feature",
        color: "c7def8",
        description: "Categorizes issue or PR as related to a new feature.",
    },
    NewLabel {
        name: "kind/documentation",
        color: "c7def8",
        description: "Categorizes issue or PR as related to documentation.",
    },
    NewLabel {
        name: "kind/cleanup",
        color: "c7def8",
        description: "Categorizes issue or PR as related to cleaning up code, process, or technical debt.",
    },
    NewLabel {
        name: "area/test",
        color: "0052cc",
        description: "Issues or PRs related to tests.",
    },
    NewLabel {
        name: "area/ci",
        color: "0052cc",
        description: "Issues or PRs related to continuous integration.",
    },
];

/// Creates every preset label the repository lacks, returning the names
/// created. Stops at the first failed creation.
pub async fn add_preset_labels<G: GitHubApi>(
    github: &G,
    repo: &RepoId,
) -> Result<Vec<&'static str>, GitHubApiError> {
    let existing = repo_labels(github, repo).await?;

    let mut created = Vec::new();
    for preset in PRESET_LABELS {
        if existing.contains(&preset.name.to_lowercase()) {
            continue;
        }
        github.create_label(repo, *preset).await?;
        created.push(preset.name);
    }

    info!(repo = %repo, created = created.len(), "Preset labels added");
    Ok(created)
}
