use std::{fmt, io, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};
use serenity::all::Permissions;
use thiserror::Error;

use crate::bot::{commands::Forest, db::config::GroupStore, handler::handler::ChatClient};

pub struct AppState {
    pub settings: Arc<Settings>,
    pub forest: Forest,
    pub store: GroupStore,
    pub chat_client: Arc<dyn ChatClient>,
}

/// Process settings, read once from the environment.
#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub commands_file: Option<String>,
    pub default_prefix: String,
    pub default_locale: Locale,
    pub bot_user_id: Option<u64>,
    pub console_group: String,
    pub console_permissions: Permissions,
}

/// Per-group row. The dispatcher only reads `command_prefix`,
/// `shortcuts_enabled` and `locale`; the rest belongs to the handlers.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct GroupConfig {
    #[serde(default = "default_prefix")]
    pub command_prefix: String,
    #[serde(default)]
    pub shortcuts_enabled: bool,
    #[serde(default)]
    pub locale: Locale,
    /// Root commands turned off with `config disable`.
    #[serde(default)]
    pub disabled_commands: Vec<String>,
    #[serde(default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

pub(crate) fn default_prefix() -> String {
    "!".into()
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Cs,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Cs => "cs",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "cs" => Ok(Locale::Cs),
            other => Err(BotError::Custom(format!("Unknown locale: {other}"))),
        }
    }
}

#[derive(Debug, Error)]
pub enum BotError {
    #[error("JSON deserialization error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("{0}")]
    Custom(String),
}
