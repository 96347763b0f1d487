//! Slash command parsing.
//!
//! Users drive the bot by commenting a block of slash commands, one per line:
//!
//! ```text
//! /kind bug
//! /assign @octocat
//! /hold
//! ```
//!
//! The parser turns a comment body into [`ParsedCommand`]s. The dispatcher then
//! attaches the webhook context to build full [`Command`]s, and the worker wraps
//! them in [`CommandHandle`]s for queueing.
//!
//! # Example
//!
//! ```
//! use slash_bot::commands::parse_comment_body;
//!
//! let cmds = parse_comment_body("/kind bug\n/assign @octocat");
//! assert_eq!(cmds[0].name, "/kind");
//! assert_eq!(cmds[1].args, vec!["@octocat"]);
//! ```

mod parser;
mod types;

pub use parser::parse_comment_body;
pub use types::{Command, CommandContext, CommandHandle, EventKind, EventSource, ParsedCommand};
