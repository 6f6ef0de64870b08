use std::{collections::HashMap, path::Path};

use serde::Deserialize;
use tracing::info;

use crate::bot::{
    commands::{commands::{ArgType, ArgValue, ArgumentSpec, BotResult, Command, CommandHandler}, validator::DeclarationError, CommandRegistry},
    permissions::permissions::{parse_permission, PermissionScope, RequiredPermission},
};

/// Handlers a declaration file may refer to by key.
pub type HandlerTable = HashMap<String, CommandHandler>;

/// One command as written in a declaration file. Every field is optional so
/// that a malformed entry is rejected by us, not by the JSON parser.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct CommandDecl {
    pub name: Option<String>,
    pub shortcut: Option<String>,
    pub description: Option<String>,
    pub usage: Option<String>,
    pub permission: Option<String>,
    pub scope: Option<String>,
    pub handler: Option<String>,
    pub arguments: Vec<ArgumentDecl>,
    pub subcommands: Vec<CommandDecl>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ArgumentDecl {
    pub types: Vec<String>,
    pub default: Option<serde_json::Value>,
    pub variadic: bool,
}

/// Parses a JSON array of declarations and registers each root. Returns how
/// many roots were accepted.
pub fn load_declarations(json: &str, handlers: &HandlerTable, registry: &mut CommandRegistry) -> BotResult<usize> {
    let decls: Vec<CommandDecl> = serde_json::from_str(json)?;
    let mut accepted = 0;

    for decl in decls {
        match build_command(decl, handlers, "") {
            Ok(command) => {
                if registry.register(command) {
                    accepted += 1;
                }
            }
            Err(e) => registry.reject(e),
        }
    }

    Ok(accepted)
}

pub async fn load_declarations_file(path: impl AsRef<Path>, handlers: &HandlerTable, registry: &mut CommandRegistry) -> BotResult<usize> {
    let path = path.as_ref();
    let json = tokio::fs::read_to_string(path).await?;
    let accepted = load_declarations(&json, handlers, registry)?;
    info!("Loaded {accepted} command(s) from {}", path.display());
    Ok(accepted)
}

fn build_command(decl: CommandDecl, handlers: &HandlerTable, parent: &str) -> Result<Command, DeclarationError> {
    let Some(name) = decl.name.filter(|n| !n.is_empty()) else {
        return Err(DeclarationError::MissingName { path: parent.to_string() });
    };
    let path = if parent.is_empty() { name.clone() } else { format!("{parent} {name}") };

    let mut command = Command::new(name);
    command.shortcut = decl.shortcut;
    command.description = decl.description.unwrap_or_default();
    command.usage = decl.usage.unwrap_or_default();

    if let Some(key) = decl.handler {
        let handler = handlers
            .get(&key)
            .cloned()
            .ok_or_else(|| DeclarationError::UnknownHandler { path: path.clone(), handler: key.clone() })?;
        command.handler = Some(handler);
    }

    command.permission = match (decl.permission, decl.scope) {
        (None, _) => None,
        (Some(permission), scope) => {
            let capability = parse_permission(&permission)
                .ok_or_else(|| DeclarationError::UnknownPermission { path: path.clone(), permission: permission.clone() })?;
            let scope = match scope.as_deref().map(str::to_ascii_lowercase).as_deref() {
                None | Some("channel") => PermissionScope::Channel,
                Some("global") => PermissionScope::Global,
                Some(other) => return Err(DeclarationError::UnknownScope { path, scope: other.to_string() }),
            };
            Some(RequiredPermission { capability, scope })
        }
    };

    for (position, arg) in decl.arguments.into_iter().enumerate() {
        let mut spec = ArgumentSpec::new(arg.types.iter().map(|t| ArgType::from_name(t)));
        spec.is_variadic = arg.variadic;
        if let Some(raw) = arg.default {
            spec.default = Some(json_to_value(raw).ok_or_else(|| DeclarationError::InvalidDefault { path: path.clone(), position })?);
        }
        command.arguments.push(spec);
    }

    for child in decl.subcommands {
        command.subcommands.push(build_command(child, handlers, &path)?);
    }

    Ok(command)
}

fn json_to_value(raw: serde_json::Value) -> Option<ArgValue> {
    match raw {
        serde_json::Value::String(s) => Some(ArgValue::Text(s)),
        serde_json::Value::Bool(b) => Some(ArgValue::Boolean(b)),
        serde_json::Value::Number(n) => n.as_f64().map(ArgValue::Number),
        _ => None,
    }
}
