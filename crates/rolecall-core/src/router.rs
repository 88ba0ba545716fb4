//! Command parsing and dispatch for inbound chat messages.
//!
//! # Design
//! - Parsing is a pure function over the raw text; lines that do not start
//!   with the prefix are ignored rather than answered.
//! - Command words map to `Command` through one table, so adding a command
//!   touches the table and the dispatch match, never the parser.
//! - The community check runs before any command-specific logic.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::outcome::{Failure, Outcome, Reply, Success};
use crate::policy::Actor;
use crate::service::AllowListService;

/// Character that must open every command.
pub const COMMAND_PREFIX: char = '>';

/// Recognised command words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Show the allow-list.
    List,
    /// Attach an allowed role to yourself.
    Join,
    /// Detach an allowed role from yourself.
    Leave,
    /// Add a role to the allow-list.
    Allow,
    /// Remove a role from the allow-list.
    Disallow,
    /// Show usage text.
    Help,
}

const COMMAND_TABLE: &[(&str, Command)] = &[
    ("list", Command::List),
    ("join", Command::Join),
    ("leave", Command::Leave),
    ("allow", Command::Allow),
    ("disallow", Command::Disallow),
    ("help", Command::Help),
];

impl Command {
    /// Look up a command word; matching is exact and case-sensitive.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        COMMAND_TABLE
            .iter()
            .find(|(word, _)| *word == token)
            .map(|(_, command)| *command)
    }
}

/// A prefixed line split into its command word and argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedCommand<'a> {
    /// Command word following the prefix.
    pub token: &'a str,
    /// Text after the single separating space, up to the end of the line;
    /// empty when absent.
    pub argument: &'a str,
}

/// Split `content` into a command word and argument.
///
/// Returns `None` unless the text starts with [`COMMAND_PREFIX`] immediately
/// followed by a non-whitespace word.
#[must_use]
pub fn parse(content: &str) -> Option<ParsedCommand<'_>> {
    let rest = content.strip_prefix(COMMAND_PREFIX)?;
    let token_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let (token, remainder) = rest.split_at(token_end);
    if token.is_empty() {
        return None;
    }

    let argument = remainder
        .strip_prefix(' ')
        .and_then(|argument| argument.lines().next())
        .unwrap_or_default();
    Some(ParsedCommand { token, argument })
}

/// One inbound chat message as delivered by the platform collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    /// Community the message was posted in; `None` for direct messages.
    #[serde(default)]
    pub community: Option<String>,
    /// Identifier of the member who sent the message.
    pub actor: String,
    /// Whether the platform reports native admin rights for the member in
    /// this community.
    #[serde(default)]
    pub actor_is_admin: bool,
    /// Raw message text.
    pub content: String,
}

/// Stateless per-message router in front of [`AllowListService`].
#[derive(Clone)]
pub struct CommandRouter {
    service: AllowListService,
}

impl CommandRouter {
    /// Route commands to the given service.
    #[must_use]
    pub const fn new(service: AllowListService) -> Self {
        Self { service }
    }

    /// Handle one message; `None` when the text is not a command.
    pub async fn route(&self, message: &InboundMessage) -> Option<Reply> {
        let parsed = parse(&message.content)?;
        let outcome = match message.community.as_deref() {
            Some(community) => self.dispatch(community, message, parsed).await,
            None => Err(Failure::OutsideCommunity),
        };
        debug!(token = parsed.token, ok = outcome.is_ok(), "command handled");
        Some(Reply::from(outcome))
    }

    async fn dispatch(
        &self,
        community: &str,
        message: &InboundMessage,
        parsed: ParsedCommand<'_>,
    ) -> Outcome {
        let Some(command) = Command::from_token(parsed.token) else {
            return Err(Failure::UnknownCommand {
                token: parsed.token.to_string(),
            });
        };

        let actor = Actor::new(message.actor.clone(), message.actor_is_admin);
        let argument = parsed.argument;
        match command {
            Command::List => self.service.list(community),
            Command::Join => self.service.join(community, &actor, argument).await,
            Command::Leave => self.service.leave(community, &actor, argument).await,
            Command::Allow => self.service.allow(community, &actor, argument).await,
            Command::Disallow => self.service.disallow(community, &actor, argument).await,
            Command::Help => Ok(Success::Help),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed<'a>(token: &'a str, argument: &'a str) -> Option<ParsedCommand<'a>> {
        Some(ParsedCommand { token, argument })
    }

    #[test]
    fn parse_requires_leading_prefix() {
        assert_eq!(parse("hello >join scout"), None);
        assert_eq!(parse(" >join scout"), None);
        assert_eq!(parse(">"), None);
        assert_eq!(parse("> join"), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn parse_splits_token_and_argument() {
        assert_eq!(parse(">list"), parsed("list", ""));
        assert_eq!(parse(">join scout"), parsed("join", "scout"));
        assert_eq!(parse(">join space pilot"), parsed("join", "space pilot"));
        assert_eq!(parse(">join "), parsed("join", ""));
    }

    #[test]
    fn parse_argument_stops_at_end_of_line() {
        assert_eq!(parse(">join scout\nextra"), parsed("join", "scout"));
        assert_eq!(parse(">list\nscout"), parsed("list", ""));
    }

    #[test]
    fn parse_ignores_argument_without_single_space() {
        assert_eq!(parse(">join\tscout"), parsed("join", ""));
    }

    #[test]
    fn command_table_is_exact() {
        assert_eq!(Command::from_token("list"), Some(Command::List));
        assert_eq!(Command::from_token("disallow"), Some(Command::Disallow));
        assert_eq!(Command::from_token("help"), Some(Command::Help));
        assert_eq!(Command::from_token("LIST"), None);
        assert_eq!(Command::from_token("dance"), None);
    }

    #[test]
    fn inbound_message_accepts_direct_messages() -> Result<(), serde_json::Error> {
        let message: InboundMessage =
            serde_json::from_str(r#"{"actor":"42","content":">list"}"#)?;
        assert_eq!(message.community, None);
        assert!(!message.actor_is_admin);
        Ok(())
    }
}
