//! `/cc [@user ...]` and `/uncc [@user ...]`: request or withdraw reviews.
//!
//! Targets default to the actor. The pull request author and anyone who is
//! neither an organization member nor a collaborator are skipped; if nobody is
//! left, the command is invalid.

use crate::commands::Command;
use crate::github::GitHubApi;

use super::{HandlerResult, handled, invalid, is_member_or_collaborator};

pub(super) async fn run<G: GitHubApi>(github: &G, command: &Command) -> HandlerResult {
    let mut reviewers = Vec::new();
    for user in command.target_users() {
        if user == command.author() || reviewers.contains(&user) {
            continue;
        }
        if is_member_or_collaborator(github, command.repo(), &user).await? {
            reviewers.push(user);
        }
    }

    if reviewers.is_empty() {
        return invalid(command, "no eligible reviewer");
    }

    if command.name == "/uncc" {
        github
            .remove_reviewers(command.repo(), command.issue(), &reviewers)
            .await?;
    } else {
        github
            .request_reviewers(command.repo(), command.issue(), &reviewers)
            .await?;
    }
    handled(command)
}
