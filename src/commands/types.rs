//! Command types for slash commands found in issue and pull request comments.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::types::{DeliveryId, IssueNumber, OwnerType, RepoId};

/// One line of a command block, before any webhook context is attached.
///
/// `name` always starts with `/` and is never empty; `args` holds the
/// remaining space-separated tokens exactly as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCommand {
    pub name: String,
    pub args: Vec<String>,
}

/// The kind of webhook event a command was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// `issue_comment` (conversation tab of an issue or pull request).
    IssueComment,
    /// `pull_request_review_comment` (inline diff comment).
    ReviewComment,
    /// `pull_request_review` (body of a submitted review).
    Review,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::IssueComment => "issue_comment",
            EventKind::ReviewComment => "pull_request_review_comment",
            EventKind::Review => "pull_request_review",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a command came from. Kept for log context only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSource {
    pub kind: EventKind,
    pub delivery_id: Option<DeliveryId>,
}

/// Context shared by every command extracted from one comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandContext {
    pub repo: RepoId,
    pub owner_type: OwnerType,
    pub issue: IssueNumber,
    /// Login of the issue or pull request author.
    pub author: String,
    /// Login of the user who wrote the command.
    pub actor: String,
    pub source: EventSource,
}

/// A slash command together with the context it was issued in.
///
/// Commands are immutable once built by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub context: CommandContext,
    pub name: String,
    pub args: Vec<String>,
}

impl Command {
    pub fn new(context: CommandContext, parsed: ParsedCommand) -> Self {
        Command {
            context,
            name: parsed.name,
            args: parsed.args,
        }
    }

    pub fn repo(&self) -> &RepoId {
        &self.context.repo
    }

    pub fn issue(&self) -> IssueNumber {
        self.context.issue
    }

    pub fn author(&self) -> &str {
        &self.context.author
    }

    pub fn actor(&self) -> &str {
        &self.context.actor
    }

    /// Returns true when the actor is also the issue author.
    pub fn actor_is_author(&self) -> bool {
        self.context.actor == self.context.author
    }

    /// Users named in the arguments, with one leading `@` stripped and empty
    /// tokens dropped.
    ///
    /// Falls back to the actor when no user is named.
    pub fn target_users(&self) -> Vec<String> {
        let users: Vec<String> = self
            .args
            .iter()
            .map(|arg| arg.strip_prefix('@').unwrap_or(arg))
            .filter(|user| !user.is_empty())
            .map(str::to_string)
            .collect();

        if users.is_empty() {
            vec![self.context.actor.clone()]
        } else {
            users
        }
    }
}

impl fmt::Display for Command {
    /// Renders `[owner/repo #N(author)] actor: /name args`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} {}({})] {}: {}",
            self.context.repo,
            self.context.issue,
            self.context.author,
            self.context.actor,
            self.name
        )?;
        if !self.args.is_empty() {
            write!(f, " {}", self.args.join(" "))?;
        }
        Ok(())
    }
}

/// A shared handle to a queued command, compared by identity.
///
/// Two commands with identical content from two different comments are
/// distinct work items, so equality and hashing use the allocation address
/// rather than the command's fields. Clones of one handle are equal.
#[derive(Debug, Clone)]
pub struct CommandHandle(Arc<Command>);

impl CommandHandle {
    pub fn new(command: Command) -> Self {
        CommandHandle(Arc::new(command))
    }

    pub fn command(&self) -> &Command {
        &self.0
    }
}

impl std::ops::Deref for CommandHandle {
    type Target = Command;

    fn deref(&self) -> &Command {
        &self.0
    }
}

impl PartialEq for CommandHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for CommandHandle {}

impl Hash for CommandHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.0), state);
    }
}
