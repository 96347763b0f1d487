//! Newtype wrappers for domain identifiers.
//!
//! These keep issue numbers, delivery IDs and repository coordinates from being
//! mixed up as they travel from the webhook payload into queued commands.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An issue or pull request number within a repository.
///
/// GitHub numbers issues and pull requests from the same sequence, so one
/// type covers both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueNumber(pub u64);

impl fmt::Display for IssueNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A repository identifier (owner/repo format).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    pub owner: String,
    pub repo: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        RepoId {
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// A GitHub webhook delivery ID, taken from the `X-GitHub-Delivery` header.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveryId(pub String);

impl DeliveryId {
    pub fn new(s: impl Into<String>) -> Self {
        DeliveryId(s.into())
    }
}

impl fmt::Display for DeliveryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of account that owns a repository.
///
/// Several commands only make sense for organization-owned repositories,
/// because their authorization rules rely on organization membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OwnerType {
    Organization,
    User,
}

impl OwnerType {
    /// Maps the `owner.type` string of a webhook payload.
    ///
    /// Anything other than `"Organization"` (GitHub also sends `"Bot"` and
    /// `"User"`) is treated as a personal account.
    pub fn from_api_str(s: &str) -> Self {
        if s == "Organization" {
            OwnerType::Organization
        } else {
            OwnerType::User
        }
    }

    pub fn is_organization(&self) -> bool {
        matches!(self, OwnerType::Organization)
    }
}
