//! Core domain types for the slash command bot.

pub mod ids;

pub use ids::{DeliveryId, IssueNumber, OwnerType, RepoId};
