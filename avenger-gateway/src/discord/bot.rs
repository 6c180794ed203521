use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;

use avenger_ledger::{UserId, rank_of, resolve_top_n};
use serenity::async_trait;
use serenity::builder::EditMessage;
use serenity::model::channel::Message;
use serenity::model::event::ResumedEvent;
use serenity::model::gateway::Ready;
use serenity::model::id::GuildId;
use serenity::prelude::*;
use tracing::{debug, error, info, warn};

use crate::commands::{COMMANDS, Command, CommandError, help_text, parse_command};
use crate::render::{
    RankCard, RenderError, fetch_avatar, render_leaderboard_png, render_rank_card_png,
};
use crate::state::{AppState, format_uptime};

use super::members::GuildMembers;
use super::send::{send_fields_embed, send_png, send_text};

const LEADERBOARD_ERROR: &str = "Error generating leaderboard. Please try again later.";
const RANK_CARD_ERROR: &str = "Error generating rank card. Please try again later.";

/// Discord event handler
///
/// Parses prefixed text commands in guild channels and runs them against the
/// shared points ledger.
pub struct Bot {
    state: Arc<AppState>,
}

impl Bot {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    async fn dispatch(
        &self,
        ctx: &Context,
        msg: &Message,
        guild_id: GuildId,
        command: Command,
    ) -> Result<(), CommandError> {
        let members = GuildMembers::new(Arc::clone(&ctx.http), guild_id);

        if command.requires_admin() {
            match members.is_admin(msg.author.id).await {
                Ok(true) => {}
                Ok(false) => {
                    info!(
                        "Denied {} to {} ({}): not an administrator",
                        command.name(),
                        msg.author.name,
                        msg.author.id
                    );
                    return Err(CommandError::MissingPermission);
                }
                Err(e) => return Err(unexpected("Permission check", e)),
            }
        }

        info!(
            "Running {} for {} ({}) in guild {}",
            command.name(),
            msg.author.name,
            msg.author.id,
            guild_id
        );

        match command {
            Command::Ping => self.ping(ctx, msg).await,
            Command::Status => self.status(ctx, msg).await,
            Command::Help => {
                send_text(&ctx.http, msg.channel_id, &help_text(self.state.command_prefix()))
                    .await
                    .map_err(|e| unexpected("Help reply", e))?;
                Ok(())
            }
            Command::Leaderboard => self.leaderboard(ctx, msg, &members).await,
            Command::Rank { target } => self.rank(ctx, msg, &members, target).await,
            Command::AddPoints { target, amount } => {
                self.adjust_points(ctx, msg, &members, target, amount, Adjustment::Add)
                    .await
            }
            Command::RemovePoints { target, amount } => {
                self.adjust_points(ctx, msg, &members, target, amount, Adjustment::Remove)
                    .await
            }
        }
    }

    async fn ping(&self, ctx: &Context, msg: &Message) -> Result<(), CommandError> {
        let started = Instant::now();
        let mut reply = msg
            .channel_id
            .say(&ctx.http, "Pong!")
            .await
            .map_err(|e| unexpected("Ping reply", e))?;
        let latency_ms = started.elapsed().as_millis();

        reply
            .edit(
                ctx,
                EditMessage::new().content(format!("Pong! Latency: {latency_ms}ms")),
            )
            .await
            .map_err(|e| unexpected("Ping edit", e))?;
        debug!("Ping round trip {}ms", latency_ms);
        Ok(())
    }

    async fn status(&self, ctx: &Context, msg: &Message) -> Result<(), CommandError> {
        let last_flush = match self.state.ledger.last_flushed_at().await {
            Some(at) => at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            None => "never".to_string(),
        };
        let fields = vec![
            ("Uptime", format_uptime(self.state.uptime())),
            ("Ledger entries", self.state.ledger.len().await.to_string()),
            ("Reconnects", self.state.reconnects().to_string()),
            ("Last save", last_flush),
        ];
        send_fields_embed(&ctx.http, msg.channel_id, "Bot Status", fields)
            .await
            .map_err(|e| unexpected("Status reply", e))?;
        Ok(())
    }

    async fn leaderboard(
        &self,
        ctx: &Context,
        msg: &Message,
        members: &GuildMembers,
    ) -> Result<(), CommandError> {
        let snapshot = self.state.ledger.snapshot().await;
        let entries =
            resolve_top_n(&snapshot, self.state.settings.leaderboard_size(), members).await;
        let shown = entries.len();

        let png = render_blocking(move || render_leaderboard_png(&entries))
            .await
            .map_err(|e| {
                error!("Error generating leaderboard: {}", e);
                CommandError::Failed(LEADERBOARD_ERROR.to_string())
            })?;

        send_png(&ctx.http, msg.channel_id, png, "leaderboard.png")
            .await
            .map_err(|e| unexpected("Leaderboard upload", e))?;
        info!(
            "Generated leaderboard with {} entries for guild {}",
            shown, members.guild_id()
        );
        Ok(())
    }

    async fn rank(
        &self,
        ctx: &Context,
        msg: &Message,
        members: &GuildMembers,
        target: Option<UserId>,
    ) -> Result<(), CommandError> {
        let (user_id, display_name, avatar_url) = match target {
            Some(user_id) => {
                let member = members
                    .member(&user_id)
                    .await
                    .ok_or(CommandError::MemberNotFound)?;
                (user_id, member.display_name().to_string(), member.face())
            }
            None => {
                let user_id = UserId::from(msg.author.id.get());
                match members.member(&user_id).await {
                    Some(member) => (user_id, member.display_name().to_string(), member.face()),
                    None => {
                        let name = msg
                            .author
                            .global_name
                            .clone()
                            .unwrap_or_else(|| msg.author.name.clone());
                        (user_id, name, msg.author.face())
                    }
                }
            }
        };

        let summary = self
            .state
            .ledger
            .read(|ledger| rank_of(ledger, &user_id))
            .await;

        let avatar = match fetch_avatar(&self.state.http_client, &avatar_url).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("Avatar fetch failed for {}: {}", user_id, e);
                None
            }
        };

        let bot = &self.state.settings.bot;
        let card = RankCard {
            title: format!("{} rank card", bot.name),
            display_name: display_name.clone(),
            balance: summary.balance,
            position: summary.position,
            ledger_size: summary.ledger_size,
            tagline: bot.card_tagline.clone(),
            avatar,
        };

        let png = render_blocking(move || render_rank_card_png(&card))
            .await
            .map_err(|e| {
                error!("Error generating rank card: {}", e);
                CommandError::Failed(RANK_CARD_ERROR.to_string())
            })?;

        send_png(&ctx.http, msg.channel_id, png, "rank_card.png")
            .await
            .map_err(|e| unexpected("Rank card upload", e))?;
        info!(
            "Generated rank card for {} (#{} of {})",
            display_name, summary.position, summary.ledger_size
        );
        Ok(())
    }

    async fn adjust_points(
        &self,
        ctx: &Context,
        msg: &Message,
        members: &GuildMembers,
        target: UserId,
        amount: i64,
        adjustment: Adjustment,
    ) -> Result<(), CommandError> {
        let member = members
            .member(&target)
            .await
            .ok_or(CommandError::MemberNotFound)?;
        let name = member.display_name().to_string();

        let ledger = &self.state.ledger;
        let (total, reply) = match adjustment {
            Adjustment::Add => {
                let total = ledger.add(&target, amount).await;
                (
                    total,
                    format!("Added {amount} points to {name}. Total points: {total}"),
                )
            }
            Adjustment::Remove => {
                let total = ledger.remove(&target, amount).await;
                (
                    total,
                    format!("Removed {amount} points from {name}. Total points: {total}"),
                )
            }
        };
        info!(
            "{} {} {} points for {} ({}), total {}",
            msg.author.name,
            adjustment.verb(),
            amount,
            name,
            target,
            total
        );

        if self.state.settings.ledger.flush_on_write {
            // Failures are logged by the store; the next periodic flush retries
            let _ = ledger.flush().await;
        }

        send_text(&ctx.http, msg.channel_id, &reply)
            .await
            .map_err(|e| unexpected("Points reply", e))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Adjustment {
    Add,
    Remove,
}

impl Adjustment {
    fn verb(self) -> &'static str {
        match self {
            Adjustment::Add => "added",
            Adjustment::Remove => "removed",
        }
    }
}

fn unexpected(what: &str, err: impl Display) -> CommandError {
    error!("{} failed: {}", what, err);
    CommandError::Unexpected
}

/// Run a CPU-bound render off the async runtime.
async fn render_blocking<F>(render: F) -> Result<Vec<u8>, String>
where
    F: FnOnce() -> Result<Vec<u8>, RenderError> + Send + 'static,
{
    match tokio::task::spawn_blocking(render).await {
        Ok(Ok(png)) => Ok(png),
        Ok(Err(e)) => Err(e.to_string()),
        Err(e) => Err(format!("render task failed: {e}")),
    }
}

#[async_trait]
impl EventHandler for Bot {
    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        // Commands are guild-only
        let Some(guild_id) = msg.guild_id else {
            return;
        };

        let prefix = self.state.command_prefix();
        let Some(parsed) = parse_command(prefix, &msg.content) else {
            return;
        };

        let result = match parsed {
            Ok(command) => self.dispatch(&ctx, &msg, guild_id, command).await,
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            debug!("Command from {} failed: {}", msg.author.id, e);
            if let Err(send_err) = msg.channel_id.say(&ctx.http, e.user_message(prefix)).await {
                warn!("Failed to send error reply: {}", send_err);
            }
        }
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("Logged in as {} (ID: {})", ready.user.name, ready.user.id);
        info!("Command prefix: {}", self.state.command_prefix());
        let names: Vec<&str> = COMMANDS.iter().map(|(name, _)| *name).collect();
        info!("Available commands: {}", names.join(", "));
    }

    async fn resume(&self, _ctx: Context, _event: ResumedEvent) {
        let count = self.state.record_reconnect();
        warn!("Gateway session resumed (reconnects={})", count);
    }
}
