//! `/assign [@user]` and `/unassign [@user]`.
//!
//! Only meaningful for organization-owned repositories. The target defaults to
//! the actor. An `/assign` target must be an organization member or a
//! repository collaborator; `/unassign` takes anyone, so people who have left
//! the organization can still be removed.

use crate::commands::Command;
use crate::github::GitHubApi;

use super::{HandlerResult, handled, invalid, is_member_or_collaborator};

pub(super) async fn run<G: GitHubApi>(github: &G, command: &Command) -> HandlerResult {
    if command.args.len() > 1 {
        return invalid(command, "takes at most one user");
    }

    if !command.context.owner_type.is_organization() {
        return invalid(command, "repository owner is not an organization");
    }

    // At most one argument, so at most one target.
    let assignees = command.target_users();

    if command.name == "/unassign" {
        github
            .remove_assignees(command.repo(), command.issue(), &assignees)
            .await?;
        return handled(command);
    }

    for assignee in &assignees {
        if !is_member_or_collaborator(github, command.repo(), assignee).await? {
            return invalid(command, "assignee is neither member nor collaborator");
        }
    }

    github
        .add_assignees(command.repo(), command.issue(), &assignees)
        .await?;
    handled(command)
}
