//! GitHub webhook event types.
//!
//! The bot only cares about events that carry user-written text on an issue or
//! pull request:
//!
//! - `issue_comment` with action `created` (conversation tab comments)
//! - `pull_request_review_comment` with action `created` (inline diff comments)
//! - `pull_request_review` with action `submitted` (review summary text)
//!
//! All three collapse into one [`CommentEvent`]; everything else is ignored.

use serde::{Deserialize, Serialize};

use crate::commands::{CommandContext, EventKind, EventSource};
use crate::types::{DeliveryId, IssueNumber, OwnerType, RepoId};

/// A newly written comment (or review body) that may contain commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentEvent {
    pub kind: EventKind,

    pub repo: RepoId,

    /// Whether the repository belongs to an organization or a user.
    pub owner_type: OwnerType,

    /// The issue or pull request the comment was written on.
    pub issue: IssueNumber,

    /// Login of whoever opened the issue or pull request.
    pub issue_author: String,

    /// Login of the comment author.
    pub commenter: String,

    /// The comment text. Empty when GitHub sends `null` (e.g. a review
    /// approved without a summary).
    pub body: String,
}

impl CommentEvent {
    /// Builds the context attached to every command extracted from this event.
    pub fn command_context(&self, delivery_id: Option<DeliveryId>) -> CommandContext {
        CommandContext {
            repo: self.repo.clone(),
            owner_type: self.owner_type,
            issue: self.issue,
            author: self.issue_author.clone(),
            actor: self.commenter.clone(),
            source: EventSource {
                kind: self.kind,
                delivery_id,
            },
        }
    }
}
