use std::{fmt, str::FromStr, sync::Arc};

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serenity::all::{ChannelId, Permissions, RoleId, UserId};

use crate::bot::{chat_event::chat_event::ChatEvent, permissions::permissions::{CapabilitySource, PermissionScope, RequiredPermission}, state::def::{BotError, GroupConfig, Locale}};

pub type BotResult<T> = Result<T, BotError>;

pub type CommandHandler = Arc<dyn Fn(Invocation) -> BoxFuture<'static, BotResult<()>> + Send + Sync>;

pub type CanExecute = Arc<dyn Fn(&Invoker, &GroupConfig, Locale) -> Check + Send + Sync>;

/// Result of a `can_execute` pre-check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    Allow,
    Deny(Option<String>),
}

/// Who sent the message, and what they are allowed to do.
#[derive(Clone)]
pub struct Invoker {
    pub event: ChatEvent,
    pub capabilities: Arc<dyn CapabilitySource>,
}

impl Invoker {
    pub fn from_event(event: ChatEvent) -> Self {
        let capabilities = Arc::new(event.user.permissions);
        Self { event, capabilities }
    }
}

impl fmt::Debug for Invoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invoker").field("event", &self.event).finish_non_exhaustive()
    }
}

/// Everything a leaf handler receives.
#[derive(Clone, Debug)]
pub struct Invocation {
    pub invoker: Arc<Invoker>,
    pub group: Arc<GroupConfig>,
    pub locale: Locale,
    pub path: Vec<String>,
    pub args: Vec<ArgValue>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArgType {
    Text,
    Number,
    Boolean,
    /// Resolved through the `TypeResolvers` table by name.
    Extended(String),
}

impl ArgType {
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "text" | "string" => ArgType::Text,
            "number" => ArgType::Number,
            "boolean" | "bool" => ArgType::Boolean,
            other => ArgType::Extended(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ArgType::Text => "text",
            ArgType::Number => "number",
            ArgType::Boolean => "boolean",
            ArgType::Extended(name) => name,
        }
    }
}

impl FromStr for ArgType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ArgType::from_name(s))
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ArgValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
    Channel(ChannelId),
    Role(RoleId),
    User(UserId),
    Sequence(Vec<ArgValue>),
}

impl ArgValue {
    /// Name of the argument type that produces this kind of value.
    pub fn type_name(&self) -> &'static str {
        match self {
            ArgValue::Text(_) => "text",
            ArgValue::Number(_) => "number",
            ArgValue::Boolean(_) => "boolean",
            ArgValue::Date(_) => "date",
            ArgValue::Channel(_) => "channel",
            ArgValue::Role(_) => "role",
            ArgValue::User(_) => "user",
            ArgValue::Sequence(_) => "sequence",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ArgValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ArgValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            ArgValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[ArgValue]> {
        match self {
            ArgValue::Sequence(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Text(s) => f.write_str(s),
            ArgValue::Number(n) => write!(f, "{n}"),
            ArgValue::Boolean(b) => write!(f, "{b}"),
            ArgValue::Date(d) => write!(f, "{}", d.to_rfc3339()),
            ArgValue::Channel(id) => write!(f, "<#{id}>"),
            ArgValue::Role(id) => write!(f, "<@&{id}>"),
            ArgValue::User(id) => write!(f, "<@{id}>"),
            ArgValue::Sequence(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                f.write_str(&parts.join(" "))
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArgumentSpec {
    pub accepted_types: Vec<ArgType>,
    pub default: Option<ArgValue>,
    pub is_variadic: bool,
}

impl ArgumentSpec {
    pub fn new(accepted_types: impl IntoIterator<Item = ArgType>) -> Self {
        Self {
            accepted_types: accepted_types.into_iter().collect(),
            default: None,
            is_variadic: false,
        }
    }

    pub fn text() -> Self { Self::new([ArgType::Text]) }
    pub fn number() -> Self { Self::new([ArgType::Number]) }
    pub fn boolean() -> Self { Self::new([ArgType::Boolean]) }
    pub fn extended(name: &str) -> Self { Self::new([ArgType::Extended(name.to_string())]) }

    pub fn default(mut self, value: ArgValue) -> Self {
        self.default = Some(value);
        self
    }

    pub fn variadic(mut self) -> Self {
        self.is_variadic = true;
        self
    }
}

/// A node of the command forest.
#[derive(Clone)]
pub struct Command {
    pub name: String,
    pub shortcut: Option<String>,
    pub description: String,
    pub usage: String,
    pub permission: Option<RequiredPermission>,
    pub arguments: Vec<ArgumentSpec>,
    pub subcommands: Vec<Command>,
    pub can_execute: Option<CanExecute>,
    pub handler: Option<CommandHandler>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shortcut: None,
            description: String::new(),
            usage: String::new(),
            permission: None,
            arguments: Vec::new(),
            subcommands: Vec::new(),
            can_execute: None,
            handler: None,
        }
    }

    pub fn shortcut(mut self, shortcut: impl Into<String>) -> Self {
        self.shortcut = Some(shortcut.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    pub fn permission(mut self, capability: Permissions, scope: PermissionScope) -> Self {
        self.permission = Some(RequiredPermission { capability, scope });
        self
    }

    pub fn argument(mut self, spec: ArgumentSpec) -> Self {
        self.arguments.push(spec);
        self
    }

    pub fn subcommand(mut self, command: Command) -> Self {
        self.subcommands.push(command);
        self
    }

    pub fn can_execute<F>(mut self, check: F) -> Self
    where
        F: Fn(&Invoker, &GroupConfig, Locale) -> Check + Send + Sync + 'static,
    {
        self.can_execute = Some(Arc::new(check));
        self
    }

    pub fn handler<F>(mut self, func: F) -> Self
    where
        F: Fn(Invocation) -> BoxFuture<'static, BotResult<()>> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(func));
        self
    }

    pub fn matches(&self, head: &str, shortcuts_enabled: bool) -> bool {
        self.name == head || (shortcuts_enabled && self.shortcut.as_deref() == Some(head))
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("shortcut", &self.shortcut)
            .field("permission", &self.permission)
            .field("arguments", &self.arguments)
            .field("subcommands", &self.subcommands)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}
