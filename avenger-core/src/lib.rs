pub mod config;

pub use config::{
    Config, ConfigError, Secrets, SecretsError, Settings, SettingsError, load_dotenv,
};
