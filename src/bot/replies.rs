use crate::bot::{dispatcher::resolver::Outcome, permissions::permissions::PermissionNames, state::def::Locale};

pub struct Replies;

impl Replies {
    pub fn unknown_command(locale: Locale, prefix: &str, name: &str) -> String {
        match locale {
            Locale::En => format!("❓ Unknown command `{prefix}{name}`. Try `{prefix}help` 💜"),
            Locale::Cs => format!("❓ Neznámý příkaz `{prefix}{name}`. Zkus `{prefix}help` 💜"),
        }
    }

    pub fn permission_denied(locale: Locale, required: &str) -> String {
        match locale {
            Locale::En => format!("❌ You need {required} to use this command"),
            Locale::Cs => format!("❌ Na tento příkaz potřebuješ {required}"),
        }
    }

    pub fn refused(locale: Locale, reason: Option<&str>) -> String {
        match (locale, reason) {
            (_, Some(reason)) => format!("❌ {reason}"),
            (Locale::En, None) => "❌ You can't use this command right now".to_string(),
            (Locale::Cs, None) => "❌ Tento příkaz teď nemůžeš použít".to_string(),
        }
    }

    pub fn missing_subcommand(locale: Locale, prefix: &str, path: &str, choices: &[String]) -> String {
        let choices = choices.join(" | ");
        match locale {
            Locale::En => format!("📋 `{prefix}{path}` needs a subcommand: {choices}"),
            Locale::Cs => format!("📋 `{prefix}{path}` potřebuje podpříkaz: {choices}"),
        }
    }

    pub fn missing_argument(locale: Locale, position: usize, usage: &str) -> String {
        let position = position + 1;
        match locale {
            Locale::En => format!("❌ Argument {position} is missing. Usage: {usage}"),
            Locale::Cs => format!("❌ Chybí argument {position}. Použití: {usage}"),
        }
    }

    pub fn type_mismatch(locale: Locale, position: usize, token: &str, usage: &str) -> String {
        let position = position + 1;
        match locale {
            Locale::En => format!("❌ `{token}` is not valid for argument {position}. Usage: {usage}"),
            Locale::Cs => format!("❌ `{token}` není platná hodnota argumentu {position}. Použití: {usage}"),
        }
    }

    pub fn help_header(locale: Locale) -> String {
        match locale {
            Locale::En => "📋 Commands:".to_string(),
            Locale::Cs => "📋 Příkazy:".to_string(),
        }
    }

    pub fn help_subcommands(locale: Locale) -> &'static str {
        match locale {
            Locale::En => "subcommands",
            Locale::Cs => "podpříkazy",
        }
    }

    pub fn pong(locale: Locale) -> String {
        match locale {
            Locale::En => "🏓 Pong!".to_string(),
            Locale::Cs => "🏓 Pong! 💜".to_string(),
        }
    }

    pub fn countdown(locale: Locale, days: i64) -> String {
        match (locale, days) {
            (Locale::En, d) if d < 0 => format!("⏳ That was {} day(s) ago", -d),
            (Locale::En, 0) => "⏳ That's today! 🥳".to_string(),
            (Locale::En, d) => format!("⏳ {d} day(s) to go"),
            (Locale::Cs, d) if d < 0 => format!("⏳ To bylo před {} dny", -d),
            (Locale::Cs, 0) => "⏳ To je dnes! 🥳".to_string(),
            (Locale::Cs, d) => format!("⏳ Zbývá {d} dní"),
        }
    }

    pub fn command_disabled(locale: Locale, name: &str) -> String {
        match locale {
            Locale::En => format!("`{name}` is turned off in this group"),
            Locale::Cs => format!("`{name}` je v této skupině vypnutý"),
        }
    }

    pub fn roll(locale: Locale, result: u64, sides: u64) -> String {
        match locale {
            Locale::En => format!("🎲 You rolled {result} (d{sides})"),
            Locale::Cs => format!("🎲 Padlo {result} (d{sides})"),
        }
    }

    pub fn config_updated(locale: Locale, key: &str, value: &str) -> String {
        match locale {
            Locale::En => format!("✅ `{key}` is now `{value}`"),
            Locale::Cs => format!("✅ `{key}` je teď `{value}`"),
        }
    }

    pub fn config_show(locale: Locale, prefix: &str, shortcuts: bool, current: Locale) -> String {
        match locale {
            Locale::En => format!("📋 prefix: `{prefix}`, shortcuts: {shortcuts}, locale: {current}"),
            Locale::Cs => format!("📋 prefix: `{prefix}`, zkratky: {shortcuts}, jazyk: {current}"),
        }
    }

    pub fn invalid_value(locale: Locale, value: &str) -> String {
        match locale {
            Locale::En => format!("❌ `{value}` is not a valid value"),
            Locale::Cs => format!("❌ `{value}` není platná hodnota"),
        }
    }

    /// Reply for a terminal outcome. `Handled` needs none.
    pub fn for_outcome(outcome: &Outcome, locale: Locale, prefix: &str, head: &str, usage: impl Fn(&[String]) -> String) -> Option<String> {
        match outcome {
            Outcome::Handled => None,
            Outcome::NotFound => Some(Self::unknown_command(locale, prefix, head)),
            Outcome::PermissionDenied { required, .. } => {
                Some(Self::permission_denied(locale, &PermissionNames(*required).to_string()))
            }
            Outcome::Refused { reason, .. } => Some(Self::refused(locale, reason.as_deref())),
            Outcome::MissingSubcommand { path, choices } => {
                Some(Self::missing_subcommand(locale, prefix, &path.join(" "), choices))
            }
            Outcome::MissingArgument { path, position } => Some(Self::missing_argument(locale, *position, &usage(path))),
            Outcome::ArgumentTypeMismatch { path, position, token } => {
                Some(Self::type_mismatch(locale, *position, token, &usage(path)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serenity::all::Permissions;

    use super::*;

    fn usage(path: &[String]) -> String {
        format!("!{}", path.join(" "))
    }

    #[test]
    fn handled_has_no_reply() {
        assert_eq!(Replies::for_outcome(&Outcome::Handled, Locale::En, "!", "ping", usage), None);
    }

    #[test]
    fn unknown_command_names_the_head() {
        let reply = Replies::for_outcome(&Outcome::NotFound, Locale::En, "?", "pnig", usage).unwrap();
        assert!(reply.contains("`?pnig`"));
    }

    #[test]
    fn positions_are_one_based_in_replies() {
        let outcome = Outcome::ArgumentTypeMismatch { path: vec!["roll".into()], position: 0, token: "abc".into() };
        let reply = Replies::for_outcome(&outcome, Locale::En, "!", "roll", usage).unwrap();
        assert!(reply.contains("argument 1"));
        assert!(reply.contains("!roll"));
    }

    #[test]
    fn permission_reply_is_localized() {
        let outcome = Outcome::PermissionDenied { path: vec!["config".into()], required: Permissions::MANAGE_GUILD };
        let en = Replies::for_outcome(&outcome, Locale::En, "!", "config", usage).unwrap();
        let cs = Replies::for_outcome(&outcome, Locale::Cs, "!", "config", usage).unwrap();
        assert!(en.contains("MANAGE_GUILD"));
        assert!(cs.contains("MANAGE_GUILD"));
        assert_ne!(en, cs);
    }
}
