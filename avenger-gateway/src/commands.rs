//! Text command parsing.
//!
//! Everything here is independent of the Discord connection so the grammar
//! and the user-facing error replies can be tested directly.

use avenger_ledger::UserId;
use serenity::model::permissions::Permissions;

/// Command names with their one-line help, in help order.
pub const COMMANDS: &[(&str, &str)] = &[
    ("ping", "Check the bot's latency"),
    ("status", "Show uptime, ledger size and connection health"),
    ("leaderboard", "Show the points leaderboard"),
    ("rank", "Show your rank card, or another member's: rank [@user]"),
    ("addpoints", "Add points to a member (admin only): addpoints @user <amount>"),
    (
        "removepoints",
        "Remove points from a member (admin only): removepoints @user <amount>",
    ),
    ("help", "List available commands"),
];

/// A parsed, argument-validated command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ping,
    Status,
    Help,
    Leaderboard,
    Rank { target: Option<UserId> },
    AddPoints { target: UserId, amount: i64 },
    RemovePoints { target: UserId, amount: i64 },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Ping => "ping",
            Command::Status => "status",
            Command::Help => "help",
            Command::Leaderboard => "leaderboard",
            Command::Rank { .. } => "rank",
            Command::AddPoints { .. } => "addpoints",
            Command::RemovePoints { .. } => "removepoints",
        }
    }

    /// Whether the invoking member needs the administrator permission.
    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            Command::AddPoints { .. } | Command::RemovePoints { .. }
        )
    }
}

/// Errors reported back to the invoking user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    NotFound(String),

    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("missing administrator permission")]
    MissingPermission,

    #[error("member not found")]
    MemberNotFound,

    /// The command ran and failed; the payload is the reply shown to the user.
    #[error("{0}")]
    Failed(String),

    #[error("unexpected failure")]
    Unexpected,
}

impl CommandError {
    /// Short human-readable reply for the channel.
    pub fn user_message(&self, prefix: &str) -> String {
        match self {
            CommandError::NotFound(_) => format!(
                "Command not found. Use {prefix}help to see available commands."
            ),
            CommandError::MissingArgument(name) => {
                format!("Missing required argument: {name}")
            }
            CommandError::InvalidArgument(detail) => format!("Invalid argument: {detail}"),
            CommandError::MissingPermission => {
                "You don't have permission to use this command.".to_string()
            }
            CommandError::MemberNotFound => "Member not found.".to_string(),
            CommandError::Failed(reply) => reply.clone(),
            CommandError::Unexpected => {
                "An unexpected error occurred. Please try again later.".to_string()
            }
        }
    }
}

/// Parse a message into a command.
///
/// Returns `None` when the message is not addressed to the bot (no prefix,
/// or a bare prefix).
pub fn parse_command(prefix: &str, content: &str) -> Option<Result<Command, CommandError>> {
    let body = content.trim_start().strip_prefix(prefix)?;
    let mut args = body.split_whitespace();
    // A space right after the prefix ("! ping") is not a command
    if body.starts_with(char::is_whitespace) {
        return None;
    }
    let name = args.next()?.to_lowercase();

    let command = match name.as_str() {
        "ping" => Ok(Command::Ping),
        "status" => Ok(Command::Status),
        "help" => Ok(Command::Help),
        "leaderboard" => Ok(Command::Leaderboard),
        "rank" => match args.next() {
            None => Ok(Command::Rank { target: None }),
            Some(raw) => parse_user_ref(raw).map(|target| Command::Rank {
                target: Some(target),
            }),
        },
        "addpoints" => parse_target_and_amount(&mut args)
            .map(|(target, amount)| Command::AddPoints { target, amount }),
        "removepoints" => parse_target_and_amount(&mut args)
            .map(|(target, amount)| Command::RemovePoints { target, amount }),
        _ => Err(CommandError::NotFound(name)),
    };
    Some(command)
}

fn parse_target_and_amount<'a>(
    args: &mut impl Iterator<Item = &'a str>,
) -> Result<(UserId, i64), CommandError> {
    let target = parse_user_ref(args.next().ok_or(CommandError::MissingArgument("user"))?)?;
    let amount = parse_amount(args.next().ok_or(CommandError::MissingArgument("amount"))?)?;
    Ok((target, amount))
}

/// Accept `<@123>`, `<@!123>` or a bare `123` snowflake.
pub fn parse_user_ref(raw: &str) -> Result<UserId, CommandError> {
    let digits = raw
        .strip_prefix("<@")
        .and_then(|rest| rest.strip_suffix('>'))
        .map(|inner| inner.strip_prefix('!').unwrap_or(inner))
        .unwrap_or(raw);

    match digits.parse::<u64>() {
        Ok(id) if id != 0 => Ok(UserId::from(id)),
        _ => Err(CommandError::InvalidArgument(format!(
            "'{raw}' is not a member mention or user id"
        ))),
    }
}

/// A non-zero signed integer.
pub fn parse_amount(raw: &str) -> Result<i64, CommandError> {
    match raw.parse::<i64>() {
        Ok(0) => Err(CommandError::InvalidArgument(
            "amount must not be zero".to_string(),
        )),
        Ok(amount) => Ok(amount),
        Err(_) => Err(CommandError::InvalidArgument(format!(
            "'{raw}' is not a whole number"
        ))),
    }
}

/// Whether a member holds the administrator permission in a guild.
///
/// The guild owner always does; otherwise any of the @everyone permissions
/// or the member's role permissions must include ADMINISTRATOR.
pub fn is_administrator(
    is_owner: bool,
    everyone: Permissions,
    member_roles: impl IntoIterator<Item = Permissions>,
) -> bool {
    if is_owner {
        return true;
    }
    let combined = member_roles
        .into_iter()
        .fold(everyone, |acc, perms| acc | perms);
    combined.contains(Permissions::ADMINISTRATOR)
}

/// The `help` reply.
pub fn help_text(prefix: &str) -> String {
    let mut lines = Vec::with_capacity(COMMANDS.len() + 1);
    lines.push("**Available commands**".to_string());
    for (name, description) in COMMANDS {
        lines.push(format!("`{prefix}{name}` - {description}"));
    }
    lines.join("\n")
}
