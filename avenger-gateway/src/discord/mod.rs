mod bot;
mod members;
mod send;

use std::sync::Arc;

use serenity::prelude::*;
use tracing::info;

pub use bot::Bot;

/// Build the Discord client with the command handler attached.
///
/// The client is not connected yet; call `start()` on it.
pub async fn start_discord_bot(
    token: &str,
    state: Arc<crate::state::AppState>,
) -> Result<Client, DiscordError> {
    info!("Starting Discord bot...");

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let bot = Bot::new(state);

    Client::builder(token, intents)
        .event_handler(bot)
        .await
        .map_err(|e| DiscordError::ClientError(e.to_string()))
}

/// Discord-related errors
#[derive(Debug, thiserror::Error)]
pub enum DiscordError {
    #[error("Failed to create Discord client: {0}")]
    ClientError(String),

    #[error("Discord client stopped: {0}")]
    ClientStopped(String),
}
