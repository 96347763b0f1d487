//! `/hold`, `/wip` and `/lgtm`, each optionally followed by `cancel`.
//!
//! The bare form adds a fixed label, `cancel` removes it. `/lgtm` is reserved
//! for organization members and collaborators.

use crate::commands::Command;
use crate::github::GitHubApi;

use super::{HandlerResult, handled, invalid, is_member_or_collaborator};

/// A label toggled on and off by one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Toggle {
    pub label: &'static str,

    /// Whether the actor must be a member or collaborator.
    pub members_only: bool,
}

pub(super) const HOLD: Toggle = Toggle {
    label: "do-not-merge/hold",
    members_only: false,
};

pub(super) const WORK_IN_PROGRESS: Toggle = Toggle {
    label: "do-not-merge/work-in-progress",
    members_only: false,
};

pub(super) const LGTM: Toggle = Toggle {
    label: "lgtm",
    members_only: true,
};

pub(super) async fn run<G: GitHubApi>(github: &G, command: &Command, toggle: Toggle) -> HandlerResult {
    let cancel = match command.args.as_slice() {
        [] => false,
        [arg] if arg == "cancel" => true,
        _ => return invalid(command, "only argument allowed is `cancel`"),
    };

    if toggle.members_only
        && !is_member_or_collaborator(github, command.repo(), command.actor()).await?
    {
        return invalid(command, "actor is neither member nor collaborator");
    }

    if cancel {
        github
            .remove_label(command.repo(), command.issue(), toggle.label)
            .await?;
    } else {
        github
            .add_labels(command.repo(), command.issue(), &[toggle.label.to_string()])
            .await?;
    }
    handled(command)
}
