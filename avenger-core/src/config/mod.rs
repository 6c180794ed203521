//! Configuration management for Event Avenger.
//!
//! Secrets come from environment variables, settings from a TOML file.
//!
//! # Configuration Sources
//!
//! ## Secrets (Environment Variables)
//! - `DISCORD_TOKEN` - Discord bot token (required)
//!
//! ## Settings (TOML File)
//! Located at `~/.config/event-avenger/config.toml`
//! (or `$AVENGER_CONFIG_DIR/config.toml`):
//! ```toml
//! [bot]
//! command_prefix = "!"
//!
//! [ledger]
//! path = "points.json"
//! flush_interval_seconds = 300
//!
//! [keep_alive]
//! port = 5000
//! ```

mod secrets;
mod settings;

pub use secrets::{DISCORD_TOKEN_ENV, Secrets, SecretsError};
pub use settings::{
    BotSettings, CONFIG_DIR_ENV, KeepAliveSettings, LeaderboardSettings, LedgerSettings,
    LoggingSettings, MAX_LEADERBOARD_SIZE, Settings, SettingsError,
};

/// Combined configuration containing both secrets and settings.
#[derive(Debug, Clone)]
pub struct Config {
    /// Secrets loaded from environment variables
    pub secrets: Secrets,
    /// Settings loaded from TOML configuration file
    pub settings: Settings,
}

/// Errors that can occur when loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Secrets error: {0}")]
    Secrets(#[from] SecretsError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if `DISCORD_TOKEN` is missing or an existing TOML
    /// file cannot be read or parsed. A config file that cannot be created
    /// falls back to defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let secrets = Secrets::from_env()?;
        let settings = Settings::load()?;

        Ok(Self { secrets, settings })
    }

    /// Get the Discord bot token.
    pub fn discord_token(&self) -> &str {
        &self.secrets.discord_token
    }
}

/// Load `.env` into the process environment if present.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}
