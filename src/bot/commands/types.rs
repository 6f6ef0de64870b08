use std::{collections::HashMap, fmt, sync::Arc};

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use regex::Regex;
use serenity::all::{ChannelId, RoleId, UserId};

use crate::bot::commands::commands::{ArgType, ArgValue};

lazy_static::lazy_static! {
    static ref CHANNEL_MENTION: Regex = Regex::new(r"^<#(\d+)>$").unwrap();
    static ref ROLE_MENTION: Regex = Regex::new(r"^<@&(\d+)>$").unwrap();
    static ref USER_MENTION: Regex = Regex::new(r"^<@!?(\d+)>$").unwrap();
    static ref SNOWFLAKE: Regex = Regex::new(r"^\d{1,20}$").unwrap();
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").unwrap();
    static ref RELATIVE: Regex = Regex::new(r"^\+(?P<amount>\d{1,6})(?P<unit>[dhm])$").unwrap();
}

pub type TypeResolver = Arc<dyn Fn(&str) -> Option<ArgValue> + Send + Sync>;

/// Parsers for argument types beyond text, number and boolean, keyed by
/// type name.
#[derive(Clone, Default)]
pub struct TypeResolvers {
    resolvers: HashMap<String, TypeResolver>,
}

impl TypeResolvers {
    pub fn new() -> Self {
        Self::default()
    }

    /// `date`, `identifier`, `channel`, `role` and `user`.
    pub fn with_defaults() -> Self {
        let mut resolvers = Self::new();
        resolvers.insert("date", |token| parse_date(token, Utc::now()).map(ArgValue::Date));
        resolvers.insert("identifier", |token| IDENTIFIER.is_match(token).then(|| ArgValue::Text(token.to_string())));
        resolvers.insert("channel", |token| parse_snowflake(token, &CHANNEL_MENTION).map(|id| ArgValue::Channel(ChannelId::new(id))));
        resolvers.insert("role", |token| parse_snowflake(token, &ROLE_MENTION).map(|id| ArgValue::Role(RoleId::new(id))));
        resolvers.insert("user", |token| parse_snowflake(token, &USER_MENTION).map(|id| ArgValue::User(UserId::new(id))));
        resolvers
    }

    pub fn insert<F>(&mut self, name: &str, resolver: F)
    where
        F: Fn(&str) -> Option<ArgValue> + Send + Sync + 'static,
    {
        self.resolvers.insert(name.to_ascii_lowercase(), Arc::new(resolver));
    }

    pub fn resolve(&self, name: &str, token: &str) -> Option<ArgValue> {
        self.resolvers.get(name).and_then(|resolver| resolver(token))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolvers.contains_key(name)
    }

    /// Whether an argument of this type can be coerced at all.
    pub fn knows(&self, ty: &ArgType) -> bool {
        match ty {
            ArgType::Extended(name) => self.contains(name),
            _ => true,
        }
    }
}

impl fmt::Debug for TypeResolvers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.resolvers.keys().collect();
        names.sort();
        f.debug_struct("TypeResolvers").field("names", &names).finish()
    }
}

/// Mention form or a bare id. Zero is never a valid id.
fn parse_snowflake(token: &str, mention: &Regex) -> Option<u64> {
    let digits = match mention.captures(token) {
        Some(caps) => caps.get(1)?.as_str(),
        None if SNOWFLAKE.is_match(token) => token,
        None => return None,
    };
    digits.parse::<u64>().ok().filter(|id| *id != 0)
}

/// `YYYY-MM-DD`, RFC 3339, `today`, `tomorrow` or `+<n><d|h|m>` relative to `now`.
pub fn parse_date(token: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let lower = token.to_ascii_lowercase();
    let midnight = |date: NaiveDate| date.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt));

    match lower.as_str() {
        "today" => return midnight(now.date_naive()),
        "tomorrow" => return midnight(now.date_naive().succ_opt()?),
        _ => {}
    }

    if let Some(caps) = RELATIVE.captures(&lower) {
        let amount: i64 = caps["amount"].parse().ok()?;
        let delta = match &caps["unit"] {
            "d" => Duration::days(amount),
            "h" => Duration::hours(amount),
            _ => Duration::minutes(amount),
        };
        return now.checked_add_signed(delta);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(token) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(token, "%Y-%m-%d").ok().and_then(midnight)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 15, 30, 0).unwrap()
    }

    #[test]
    fn dates_in_every_supported_form() {
        assert_eq!(parse_date("2024-12-24", now()), Some(Utc.with_ymd_and_hms(2024, 12, 24, 0, 0, 0).unwrap()));
        assert_eq!(parse_date("today", now()), Some(Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap()));
        assert_eq!(parse_date("Tomorrow", now()), Some(Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap()));
        assert_eq!(parse_date("+2d", now()), Some(Utc.with_ymd_and_hms(2024, 3, 12, 15, 30, 0).unwrap()));
        assert_eq!(parse_date("+90m", now()), Some(Utc.with_ymd_and_hms(2024, 3, 10, 17, 0, 0).unwrap()));
        assert_eq!(
            parse_date("2024-05-01T12:00:00+02:00", now()),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap())
        );
        assert_eq!(parse_date("2024-02-30", now()), None);
        assert_eq!(parse_date("soon", now()), None);
    }

    #[test]
    fn mentions_and_raw_ids() {
        let types = TypeResolvers::with_defaults();
        assert_eq!(types.resolve("channel", "<#42>"), Some(ArgValue::Channel(ChannelId::new(42))));
        assert_eq!(types.resolve("role", "<@&7>"), Some(ArgValue::Role(RoleId::new(7))));
        assert_eq!(types.resolve("user", "<@!9>"), Some(ArgValue::User(UserId::new(9))));
        assert_eq!(types.resolve("user", "<@9>"), Some(ArgValue::User(UserId::new(9))));
        assert_eq!(types.resolve("user", "123"), Some(ArgValue::User(UserId::new(123))));
        assert_eq!(types.resolve("user", "<#9>"), None);
        assert_eq!(types.resolve("role", "0"), None);
        assert_eq!(types.resolve("channel", "general"), None);
    }

    #[test]
    fn identifiers_and_unknown_types() {
        let types = TypeResolvers::with_defaults();
        assert_eq!(types.resolve("identifier", "my_sound-2"), Some(ArgValue::Text("my_sound-2".into())));
        assert_eq!(types.resolve("identifier", "2fast"), None);
        assert_eq!(types.resolve("colour", "red"), None);
        assert!(types.knows(&ArgType::Number));
        assert!(types.knows(&ArgType::Extended("date".into())));
        assert!(!types.knows(&ArgType::Extended("colour".into())));
    }
}
