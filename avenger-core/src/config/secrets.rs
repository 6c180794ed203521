//! Secrets configuration loaded from environment variables only.
//!
//! The bot token is the only secret. It is never written to disk and never
//! read from the TOML settings file.

use std::env;

/// Environment variable holding the Discord bot token.
pub const DISCORD_TOKEN_ENV: &str = "DISCORD_TOKEN";

/// Secrets loaded exclusively from environment variables.
#[derive(Clone, Default)]
pub struct Secrets {
    /// Discord bot token (env: DISCORD_TOKEN)
    pub discord_token: String,
}

// The token must never end up in a log line.
impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("discord_token", &"[redacted]")
            .finish()
    }
}

/// Errors that can occur when loading secrets
#[derive(Debug, thiserror::Error)]
pub enum SecretsError {
    #[error("Missing required secret: {0}")]
    MissingSecret(String),
}

impl Secrets {
    /// Load secrets from environment variables.
    ///
    /// Loads a `.env` file first if one is present (development convenience);
    /// production deployments set the variable directly.
    pub fn from_env() -> Result<Self, SecretsError> {
        let _ = dotenvy::dotenv();

        Self::from_env_inner()
    }

    /// Internal method to load from environment without loading .env
    pub(crate) fn from_env_inner() -> Result<Self, SecretsError> {
        let discord_token = env::var(DISCORD_TOKEN_ENV)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SecretsError::MissingSecret(DISCORD_TOKEN_ENV.to_string()))?;

        Ok(Self { discord_token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Tests that modify environment variables must not run concurrently
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_token_from_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { env::set_var(DISCORD_TOKEN_ENV, "  token-abc  ") };

        let secrets = Secrets::from_env_inner().unwrap();
        assert_eq!(secrets.discord_token, "token-abc");

        unsafe { env::remove_var(DISCORD_TOKEN_ENV) };
    }

    #[test]
    fn test_missing_token_error() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { env::remove_var(DISCORD_TOKEN_ENV) };

        let result = Secrets::from_env_inner();
        assert!(matches!(result, Err(SecretsError::MissingSecret(name)) if name == DISCORD_TOKEN_ENV));
    }

    #[test]
    fn test_empty_token_is_missing() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { env::set_var(DISCORD_TOKEN_ENV, "   ") };

        assert!(Secrets::from_env_inner().is_err());

        unsafe { env::remove_var(DISCORD_TOKEN_ENV) };
    }

    #[test]
    fn test_debug_redacts_token() {
        let secrets = Secrets {
            discord_token: "super-secret".to_string(),
        };
        let rendered = format!("{:?}", secrets);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("[redacted]"));
    }
}
