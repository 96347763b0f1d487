//! Parser for slash command blocks in comment text.
//!
//! A comment is either entirely a command block or entirely prose. The parser
//! is pure: no I/O and no knowledge of which commands exist.

use super::types::ParsedCommand;

/// Parses a comment body into its slash commands.
///
/// # Parsing Rules
///
/// - The body must start with `/` exactly (no leading whitespace), otherwise
///   the comment is prose and nothing is returned
/// - Each non-blank line is trimmed and must itself start with `/`; a single
///   prose line anywhere rejects the whole comment
/// - A line is split on single spaces: the first token (with its `/`) is the
///   command name, the rest are its arguments, kept verbatim
/// - Commands are returned in line order
///
/// # Examples
///
/// ```
/// use slash_bot::commands::parse_comment_body;
///
/// let cmds = parse_comment_body("/assign @alice\n/kind bug");
/// assert_eq!(cmds.len(), 2);
/// assert_eq!(cmds[0].name, "/assign");
/// assert_eq!(cmds[0].args, vec!["@alice"]);
///
/// // Prose anywhere rejects the whole block.
/// assert!(parse_comment_body("/close\nthanks!").is_empty());
/// // Not a command block at all.
/// assert!(parse_comment_body("LGTM /close").is_empty());
/// ```
pub fn parse_comment_body(body: &str) -> Vec<ParsedCommand> {
    if !body.starts_with('/') {
        return Vec::new();
    }

    let mut commands = Vec::new();
    for line in body.split('\n') {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !line.starts_with('/') {
            return Vec::new();
        }
        commands.push(parse_line(line));
    }
    commands
}

/// Splits one trimmed command line. The caller guarantees a leading `/`.
fn parse_line(line: &str) -> ParsedCommand {
    let mut tokens = line.split(' ');
    // split always yields at least one item
    let name = tokens.next().unwrap_or(line).to_string();
    ParsedCommand {
        name,
        args: tokens.map(str::to_string).collect(),
    }
}
