//! GitHub webhook payload parser.
//!
//! This module parses raw webhook JSON payloads into [`CommentEvent`] values.
//!
//! # Parsing Strategy
//!
//! 1. The event type is determined from the `X-GitHub-Event` header
//! 2. The body must be a JSON document, whatever the event type
//! 3. Event types and actions that cannot carry new commands return `Ok(None)`
//! 4. Relevant events with missing fields return `Err`

use serde::Deserialize;
use thiserror::Error;

use crate::commands::EventKind;
use crate::types::{IssueNumber, OwnerType, RepoId};

use super::events::CommentEvent;

/// Error type for webhook parsing failures.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON deserialization failed (includes missing required fields).
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parses a webhook payload into a comment event.
///
/// # Returns
///
/// * `Ok(Some(event))` - A new comment or submitted review
/// * `Ok(None)` - Any other event type or action (ignored, not an error)
/// * `Err(e)` - Malformed payload
///
/// # Examples
///
/// ```
/// use slash_bot::webhooks::parse_webhook;
///
/// let payload = br#"{
///     "action": "created",
///     "comment": { "body": "/hold", "user": { "login": "octocat" } },
///     "issue": { "number": 42, "user": { "login": "hubot" } },
///     "repository": { "name": "repo", "owner": { "login": "org", "type": "Organization" } }
/// }"#;
///
/// let event = parse_webhook("issue_comment", payload).unwrap().unwrap();
/// assert_eq!(event.body, "/hold");
///
/// assert!(parse_webhook("push", b"{}").unwrap().is_none());
/// assert!(parse_webhook("push", b"not json").is_err());
/// ```
pub fn parse_webhook(event_type: &str, payload: &[u8]) -> Result<Option<CommentEvent>, ParseError> {
    let envelope: RawEnvelope = serde_json::from_slice(payload)?;

    let kind = match (event_type, envelope.action.as_deref()) {
        ("issue_comment", Some("created")) => EventKind::IssueComment,
        ("pull_request_review_comment", Some("created")) => EventKind::ReviewComment,
        ("pull_request_review", Some("submitted")) => EventKind::Review,
        _ => return Ok(None),
    };

    let event = match kind {
        EventKind::IssueComment => {
            let raw: RawIssueCommentPayload = serde_json::from_slice(payload)?;
            build_event(kind, raw.repository, raw.issue, raw.comment)
        }
        EventKind::ReviewComment => {
            let raw: RawReviewCommentPayload = serde_json::from_slice(payload)?;
            build_event(kind, raw.repository, raw.pull_request, raw.comment)
        }
        EventKind::Review => {
            let raw: RawReviewPayload = serde_json::from_slice(payload)?;
            build_event(kind, raw.repository, raw.pull_request, raw.review)
        }
    };

    Ok(Some(event))
}

fn build_event(
    kind: EventKind,
    repository: RawRepository,
    target: RawIssue,
    text: RawText,
) -> CommentEvent {
    CommentEvent {
        kind,
        repo: RepoId::new(repository.owner.login, repository.name),
        owner_type: OwnerType::from_api_str(&repository.owner.owner_type),
        issue: IssueNumber(target.number),
        issue_author: target.user.login,
        commenter: text.user.login,
        body: text.body.unwrap_or_default(),
    }
}

// ============================================================================
// Raw payload structures for deserialization
//
// These match GitHub's webhook JSON structure, reduced to the fields we read.
// Unknown fields are ignored.
// ============================================================================

/// Any JSON object; `action` is absent for some event types (e.g. `push`).
#[derive(Debug, Deserialize)]
struct RawEnvelope {
    action: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRepository {
    owner: RawOwner,
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawOwner {
    login: String,
    #[serde(rename = "type")]
    owner_type: String,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    login: String,
}

/// An issue or a pull request; both expose `number` and `user`.
#[derive(Debug, Deserialize)]
struct RawIssue {
    number: u64,
    user: RawUser,
}

/// A comment or review; `body` may be `null`.
#[derive(Debug, Deserialize)]
struct RawText {
    body: Option<String>,
    user: RawUser,
}

#[derive(Debug, Deserialize)]
struct RawIssueCommentPayload {
    comment: RawText,
    issue: RawIssue,
    repository: RawRepository,
}

#[derive(Debug, Deserialize)]
struct RawReviewCommentPayload {
    comment: RawText,
    pull_request: RawIssue,
    repository: RawRepository,
}

#[derive(Debug, Deserialize)]
struct RawReviewPayload {
    review: RawText,
    pull_request: RawIssue,
    repository: RawRepository,
}
