//! Typed command results and the replies rendered from them.
//!
//! # Design
//! - `Display` on `Success`/`Failure` is the exact member-facing wording;
//!   presentation layers decorate it but never rephrase it.
//! - Failures carry the role name they concern so logs and tests can match on
//!   structure instead of text.

use std::fmt::{self, Display, Formatter};

use serde::Serialize;
use thiserror::Error;

/// Version reported by the `help` command.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result of handling one command.
pub type Outcome = Result<Success, Failure>;

/// Allow-list changes that require authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// Adding a role to the allow-list.
    Allow,
    /// Removing a role from the allow-list.
    Disallow,
}

impl Display for Mutation {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => formatter.write_str("allow new roles"),
            Self::Disallow => formatter.write_str("disallow roles"),
        }
    }
}

/// Successful command results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Success {
    /// The community's allow-list, in the order roles were allowed.
    Listed {
        /// Allowed role names.
        roles: Vec<String>,
    },
    /// The role was attached to the member.
    Joined {
        /// Role that was attached.
        role: String,
    },
    /// The role was detached from the member.
    Left {
        /// Role that was detached.
        role: String,
    },
    /// The role was added to the allow-list.
    Allowed {
        /// Role that was allowed.
        role: String,
    },
    /// The role is no longer on the allow-list.
    Disallowed {
        /// Role that was disallowed.
        role: String,
        /// `false` when the role was already absent and nothing was written.
        was_listed: bool,
    },
    /// Usage text was requested.
    Help,
}

impl Display for Success {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Listed { roles } => {
                formatter.write_str("**allowed roles**\n*use `>join` to add one*\n\n")?;
                formatter.write_str(&roles.join("\n"))
            }
            Self::Joined { .. } => formatter.write_str("added role"),
            Self::Left { .. } => formatter.write_str("removed role"),
            Self::Allowed { role } => write!(formatter, "allowed {role}"),
            Self::Disallowed { role, .. } => write!(formatter, "disallowed {role}"),
            Self::Help => write_help(formatter),
        }
    }
}

fn write_help(formatter: &mut Formatter<'_>) -> fmt::Result {
    writeln!(formatter, "**rolecall** v{VERSION}")?;
    writeln!(formatter, "`>list` show the roles you can join")?;
    writeln!(formatter, "`>join <role>` give yourself an allowed role")?;
    writeln!(formatter, "`>leave <role>` remove an allowed role from yourself")?;
    writeln!(formatter, "`>allow <role>` let members join a role (admins)")?;
    writeln!(formatter, "`>disallow <role>` stop members joining a role (admins)")?;
    formatter.write_str("`>help` show this message")
}

/// Command failures, each recovered into a reply for the member.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Failure {
    /// The committed configuration could not be read.
    #[error("unable to read settings")]
    StoreUnavailable,
    /// A configuration change could not be written.
    #[error("unable to save changes")]
    PersistFailed,
    /// The member may not change the allow-list.
    #[error("you do not have permission to {action}")]
    Unauthorized {
        /// The change that was refused.
        action: Mutation,
    },
    /// The community has no configuration entry yet.
    #[error("server not set up")]
    CommunityNotConfigured,
    /// The community exists but nothing is allowed.
    #[error("no roles have been added. a server admin needs to use `>allow`")]
    EmptyAllowList,
    /// The requested role is not on the allow-list.
    #[error("{role} is not an allowed role. use `>list` to view the roles")]
    RoleNotAllowed {
        /// Requested role name.
        role: String,
    },
    /// The role is already on the allow-list.
    #[error("{role} has already been added")]
    AlreadyAllowed {
        /// Requested role name.
        role: String,
    },
    /// The command needs a role name and none was given.
    #[error("no role name given")]
    MissingArgument,
    /// The platform could not resolve the role by name.
    #[error("unable to find role {role}")]
    RoleLookupFailed {
        /// Requested role name.
        role: String,
    },
    /// The platform refused to attach the role.
    #[error("unable to set role. does the bot have the permission?")]
    CannotGrant {
        /// Requested role name.
        role: String,
    },
    /// The platform refused to detach the role.
    #[error("unable to remove role. does the bot have the permission?")]
    CannotRevoke {
        /// Requested role name.
        role: String,
    },
    /// The command word is not recognised.
    #[error("that's not a command")]
    UnknownCommand {
        /// The unrecognised command word.
        token: String,
    },
    /// A command arrived without a community context.
    #[error("you need to be in a server to set roles")]
    OutsideCommunity,
}

/// Whether a reply reports success or failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyStatus {
    /// The command succeeded.
    Success,
    /// The command failed.
    Failure,
}

/// Where the presentation layer should deliver a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyTarget {
    /// The channel the command was posted in.
    Channel,
    /// A direct message to the member who sent the command.
    Author,
}

/// Rendered result of one command, ready for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    /// Success or failure flag, typically mapped to a colour.
    pub status: ReplyStatus,
    /// Delivery target.
    pub target: ReplyTarget,
    /// Member-facing text.
    pub text: String,
}

impl From<Outcome> for Reply {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Ok(success) => Self {
                status: ReplyStatus::Success,
                target: ReplyTarget::Channel,
                text: success.to_string(),
            },
            Err(failure) => Self {
                status: ReplyStatus::Failure,
                target: if failure == Failure::OutsideCommunity {
                    ReplyTarget::Author
                } else {
                    ReplyTarget::Channel
                },
                text: failure.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(name: &str) -> String {
        name.to_string()
    }

    #[test]
    fn success_messages_match_command_table() {
        let listed = Success::Listed {
            roles: vec![role("scout"), role("pilot")],
        };
        assert_eq!(
            listed.to_string(),
            "**allowed roles**\n*use `>join` to add one*\n\nscout\npilot"
        );
        assert_eq!(Success::Joined { role: role("scout") }.to_string(), "added role");
        assert_eq!(Success::Left { role: role("scout") }.to_string(), "removed role");
        assert_eq!(
            Success::Allowed { role: role("pilot") }.to_string(),
            "allowed pilot"
        );
        assert_eq!(
            Success::Disallowed {
                role: role("ghost"),
                was_listed: false
            }
            .to_string(),
            "disallowed ghost"
        );
    }

    #[test]
    fn failure_messages_match_command_table() {
        let cases = [
            (Failure::CommunityNotConfigured, "server not set up"),
            (
                Failure::EmptyAllowList,
                "no roles have been added. a server admin needs to use `>allow`",
            ),
            (Failure::MissingArgument, "no role name given"),
            (
                Failure::RoleNotAllowed { role: role("pilot") },
                "pilot is not an allowed role. use `>list` to view the roles",
            ),
            (
                Failure::RoleLookupFailed { role: role("pilot") },
                "unable to find role pilot",
            ),
            (
                Failure::CannotGrant { role: role("pilot") },
                "unable to set role. does the bot have the permission?",
            ),
            (
                Failure::CannotRevoke { role: role("pilot") },
                "unable to remove role. does the bot have the permission?",
            ),
            (
                Failure::Unauthorized {
                    action: Mutation::Allow,
                },
                "you do not have permission to allow new roles",
            ),
            (
                Failure::Unauthorized {
                    action: Mutation::Disallow,
                },
                "you do not have permission to disallow roles",
            ),
            (
                Failure::AlreadyAllowed { role: role("scout") },
                "scout has already been added",
            ),
            (Failure::PersistFailed, "unable to save changes"),
            (
                Failure::UnknownCommand { token: role("dance") },
                "that's not a command",
            ),
            (
                Failure::OutsideCommunity,
                "you need to be in a server to set roles",
            ),
        ];

        for (failure, message) in cases {
            assert_eq!(failure.to_string(), message);
        }
    }

    #[test]
    fn help_mentions_version_and_every_command() {
        let help = Success::Help.to_string();
        assert!(help.contains(VERSION));
        for token in ["list", "join", "leave", "allow", "disallow", "help"] {
            assert!(help.contains(&format!("`>{token}")), "missing {token}");
        }
    }

    #[test]
    fn replies_route_outside_community_to_author() {
        let reply = Reply::from(Err(Failure::OutsideCommunity));
        assert_eq!(reply.target, ReplyTarget::Author);
        assert_eq!(reply.status, ReplyStatus::Failure);

        let reply = Reply::from(Err(Failure::MissingArgument));
        assert_eq!(reply.target, ReplyTarget::Channel);

        let reply = Reply::from(Ok(Success::Joined { role: role("scout") }));
        assert_eq!(reply.status, ReplyStatus::Success);
        assert_eq!(reply.text, "added role");
    }
}
