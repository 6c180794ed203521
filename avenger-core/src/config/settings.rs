//! Settings configuration loaded from TOML files.
//!
//! This module handles non-sensitive configuration stored in TOML format
//! in the XDG config directory (~/.config/event-avenger/config.toml).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable overriding the configuration directory.
pub const CONFIG_DIR_ENV: &str = "AVENGER_CONFIG_DIR";

/// Hard cap on rendered leaderboard rows.
pub const MAX_LEADERBOARD_SIZE: usize = 10;

/// Default TOML configuration file content
const DEFAULT_CONFIG_TOML: &str = r#"# Event Avenger configuration file
# Located at: ~/.config/event-avenger/config.toml
#
# This file contains non-sensitive configuration.
# The bot token is loaded from the DISCORD_TOKEN environment variable.

[bot]
command_prefix = "!"
name = "Event Avenger"
card_tagline = "Make your friends join Event Avengers too for fun competition!"

[ledger]
# Points snapshot, rewritten whole on every flush
path = "points.json"
flush_interval_seconds = 300
# Also flush right after every addpoints/removepoints
flush_on_write = true
shutdown_flush_timeout_seconds = 5

[leaderboard]
# At most 10
size = 10

[keep_alive]
enabled = true
host = "0.0.0.0"
port = 5000

[logging]
level = "info"
file_enabled = false
file_dir = "logs"
"#;

/// Settings loaded from TOML configuration file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    /// Chat bot behaviour
    #[serde(default)]
    pub bot: BotSettings,

    /// Points ledger persistence
    #[serde(default)]
    pub ledger: LedgerSettings,

    /// Leaderboard rendering
    #[serde(default)]
    pub leaderboard: LeaderboardSettings,

    /// Keep-alive HTTP endpoint
    #[serde(default)]
    pub keep_alive: KeepAliveSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Bot settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotSettings {
    /// Prefix that marks a message as a command
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,

    /// Name shown on rendered cards
    #[serde(default = "default_bot_name")]
    pub name: String,

    /// Footer line on the rank card
    #[serde(default = "default_card_tagline")]
    pub card_tagline: String,
}

/// Ledger persistence settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LedgerSettings {
    /// Path of the JSON snapshot
    #[serde(default = "default_ledger_path")]
    pub path: PathBuf,

    /// Seconds between unconditional flushes
    #[serde(default = "default_flush_interval_seconds")]
    pub flush_interval_seconds: u64,

    /// Flush immediately after each add/remove command
    #[serde(default = "default_true")]
    pub flush_on_write: bool,

    /// Upper bound on the final flush during shutdown
    #[serde(default = "default_shutdown_flush_timeout_seconds")]
    pub shutdown_flush_timeout_seconds: u64,
}

/// Leaderboard settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LeaderboardSettings {
    /// Number of rows to render (clamped to [`MAX_LEADERBOARD_SIZE`])
    #[serde(default = "default_leaderboard_size")]
    pub size: usize,
}

/// Keep-alive HTTP server settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeepAliveSettings {
    /// Whether to serve the keep-alive endpoint
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Host to bind to
    #[serde(default = "default_keep_alive_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_keep_alive_port")]
    pub port: u16,
}

/// Logging settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to also log to a daily-rolling file
    #[serde(default)]
    pub file_enabled: bool,

    /// Directory of the log file (if file_enabled is true)
    #[serde(default = "default_log_file_dir")]
    pub file_dir: PathBuf,
}

// Default value functions

fn default_true() -> bool {
    true
}

fn default_command_prefix() -> String {
    "!".to_string()
}

fn default_bot_name() -> String {
    "Event Avenger".to_string()
}

fn default_card_tagline() -> String {
    "Make your friends join Event Avengers too for fun competition!".to_string()
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("points.json")
}

fn default_flush_interval_seconds() -> u64 {
    300
}

fn default_shutdown_flush_timeout_seconds() -> u64 {
    5
}

fn default_leaderboard_size() -> usize {
    MAX_LEADERBOARD_SIZE
}

fn default_keep_alive_host() -> String {
    "0.0.0.0".to_string()
}

fn default_keep_alive_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file_dir() -> PathBuf {
    PathBuf::from("logs")
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            command_prefix: default_command_prefix(),
            name: default_bot_name(),
            card_tagline: default_card_tagline(),
        }
    }
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            path: default_ledger_path(),
            flush_interval_seconds: default_flush_interval_seconds(),
            flush_on_write: true,
            shutdown_flush_timeout_seconds: default_shutdown_flush_timeout_seconds(),
        }
    }
}

impl Default for LeaderboardSettings {
    fn default() -> Self {
        Self {
            size: default_leaderboard_size(),
        }
    }
}

impl Default for KeepAliveSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_keep_alive_host(),
            port: default_keep_alive_port(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_enabled: false,
            file_dir: default_log_file_dir(),
        }
    }
}

/// Errors that can occur when loading settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    ConfigDirNotFound,

    #[error("Command prefix must not be empty")]
    EmptyPrefix,
}

impl Settings {
    /// Load settings from the TOML configuration file.
    ///
    /// Falls back to defaults when there is no config directory at all.
    pub fn load() -> Result<Self, SettingsError> {
        match Self::config_path() {
            Ok(config_path) => Self::load_from_path(&config_path),
            Err(e) => {
                tracing::warn!("{}; using default settings", e);
                Ok(Self::default())
            }
        }
    }

    /// Load settings from `path`, writing a commented default file first if
    /// none exists.
    ///
    /// A default file that cannot be written is not fatal: the defaults are
    /// used as-is. A file that exists but fails to parse is an error.
    pub fn load_from_path(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            tracing::info!("Creating default configuration at {:?}", path);
            if let Err(e) = Self::create_default_config(path) {
                tracing::warn!(
                    "Could not write default configuration at {:?} ({}); using default settings",
                    path,
                    e
                );
                return Ok(Self::default());
            }
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse settings from TOML content.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(content)?;
        if settings.bot.command_prefix.trim().is_empty() {
            return Err(SettingsError::EmptyPrefix);
        }
        Ok(settings)
    }

    /// Serialize settings to TOML content.
    pub fn to_toml(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Get the configuration file path.
    ///
    /// Uses `$AVENGER_CONFIG_DIR/config.toml` when set, otherwise the XDG
    /// config directory: `~/.config/event-avenger/config.toml`
    pub fn config_path() -> Result<PathBuf, SettingsError> {
        if let Ok(override_dir) = std::env::var(CONFIG_DIR_ENV) {
            let dir = PathBuf::from(override_dir);
            return Ok(dir.join("config.toml"));
        }

        let config_dir = dirs::config_dir()
            .ok_or(SettingsError::ConfigDirNotFound)?
            .join("event-avenger");

        Ok(config_dir.join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, DEFAULT_CONFIG_TOML)?;

        Ok(())
    }

    /// Save settings to a specific file path.
    pub fn save_to_path(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = self.to_toml()?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the keep-alive bind address.
    pub fn keep_alive_addr(&self) -> String {
        format!("{}:{}", self.keep_alive.host, self.keep_alive.port)
    }

    /// Interval between periodic ledger flushes (never zero).
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.ledger.flush_interval_seconds.max(1))
    }

    /// Bound on the final shutdown flush.
    pub fn shutdown_flush_timeout(&self) -> Duration {
        Duration::from_secs(self.ledger.shutdown_flush_timeout_seconds)
    }

    /// Leaderboard size, clamped to the rendered maximum.
    pub fn leaderboard_size(&self) -> usize {
        self.leaderboard.size.clamp(1, MAX_LEADERBOARD_SIZE)
    }
}
