use serenity::all::Permissions;

use crate::bot::{commands::commands::BotResult, permissions::permissions::parse_permission_list, state::def::{default_prefix, BotError, GroupConfig, Locale, Settings}};

impl Settings {
    pub fn from_env() -> BotResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| dotenvy::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> BotResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default_locale = match lookup("DEFAULT_LOCALE") {
            Some(raw) => raw.parse().map_err(|_| BotError::Config(format!("DEFAULT_LOCALE: unknown locale `{raw}`")))?,
            None => Locale::default(),
        };

        let bot_user_id = match lookup("BOT_USER_ID") {
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|e| BotError::Config(format!("BOT_USER_ID: {e}")))?),
            None => None,
        };

        let console_permissions = match lookup("CONSOLE_PERMISSIONS") {
            Some(raw) => parse_permission_list(&raw).map_err(|e| BotError::Config(format!("CONSOLE_PERMISSIONS: {e}")))?,
            None => Permissions::ADMINISTRATOR,
        };

        let default_prefix = lookup("DEFAULT_PREFIX").unwrap_or_else(default_prefix);
        if default_prefix.trim().is_empty() {
            return Err(BotError::Config("DEFAULT_PREFIX must not be empty".into()));
        }

        Ok(Settings {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| "sqlite:dispatch.db?mode=rwc".into()),
            commands_file: lookup("COMMANDS_FILE"),
            default_prefix,
            default_locale,
            bot_user_id,
            console_group: lookup("CONSOLE_GROUP").unwrap_or_else(|| "local".into()),
            console_permissions,
        })
    }
}

impl GroupConfig {
    pub fn new(settings: &Settings) -> Self {
        GroupConfig {
            command_prefix: settings.default_prefix.clone(),
            shortcuts_enabled: false,
            locale: settings.default_locale,
            disabled_commands: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }
}

impl Default for GroupConfig {
    fn default() -> Self {
        GroupConfig {
            command_prefix: default_prefix(),
            shortcuts_enabled: false,
            locale: Locale::default(),
            disabled_commands: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings(vars: &[(&str, &str)]) -> BotResult<Settings> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.default_prefix, "!");
        assert_eq!(s.default_locale, Locale::En);
        assert_eq!(s.bot_user_id, None);
        assert_eq!(s.console_permissions, Permissions::ADMINISTRATOR);
        assert!(s.commands_file.is_none());
    }

    #[test]
    fn reads_overrides() {
        let s = settings(&[
            ("DEFAULT_PREFIX", "?"),
            ("DEFAULT_LOCALE", "cs"),
            ("BOT_USER_ID", "1234"),
            ("CONSOLE_PERMISSIONS", "SEND_MESSAGES"),
        ])
        .unwrap();
        assert_eq!(s.default_prefix, "?");
        assert_eq!(s.default_locale, Locale::Cs);
        assert_eq!(s.bot_user_id, Some(1234));
        assert_eq!(s.console_permissions, Permissions::SEND_MESSAGES);

        let group = GroupConfig::new(&s);
        assert_eq!(group.command_prefix, "?");
        assert_eq!(group.locale, Locale::Cs);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(settings(&[("BOT_USER_ID", "abc")]), Err(BotError::Config(_))));
        assert!(matches!(settings(&[("DEFAULT_LOCALE", "xx")]), Err(BotError::Config(_))));
        assert!(matches!(settings(&[("CONSOLE_PERMISSIONS", "FLY")]), Err(BotError::Config(_))));
        assert!(matches!(settings(&[("DEFAULT_PREFIX", " ")]), Err(BotError::Config(_))));
    }

    #[test]
    fn group_config_fills_missing_fields() {
        let cfg: GroupConfig = serde_json::from_str(r#"{"shortcuts_enabled": true}"#).unwrap();
        assert_eq!(cfg.command_prefix, "!");
        assert!(cfg.shortcuts_enabled);
        assert_eq!(cfg.locale, Locale::En);
    }
}
