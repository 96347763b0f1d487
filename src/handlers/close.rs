//! `/close`: closes the issue or pull request.
//!
//! Takes no arguments. The author may always close; anyone else must be a
//! repository collaborator.

use crate::commands::Command;
use crate::github::GitHubApi;

use super::{HandlerResult, handled, invalid};

pub(super) async fn run<G: GitHubApi>(github: &G, command: &Command) -> HandlerResult {
    if !command.args.is_empty() {
        return invalid(command, "takes no arguments");
    }

    if !command.actor_is_author() && !github.is_collaborator(command.repo(), command.actor()).await? {
        return invalid(command, "actor is neither author nor collaborator");
    }

    github.close_issue(command.repo(), command.issue()).await?;
    handled(command)
}
