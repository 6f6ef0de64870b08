use std::collections::HashSet;

use serenity::all::Permissions;
use thiserror::Error;

use crate::bot::commands::{commands::{ArgType, ArgValue, ArgumentSpec, Command}, types::TypeResolvers};

/// Why a declaration was rejected. `path` is the space separated command
/// path down to the offending node.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeclarationError {
    #[error("command is missing a name (under `{path}`)")]
    MissingName { path: String },
    #[error("`{path}`: name must be a single token")]
    InvalidName { path: String },
    #[error("`{path}`: needs a handler or at least one subcommand")]
    NotExecutable { path: String },
    #[error("`{path}`: required permission is not a valid capability")]
    InvalidPermission { path: String },
    #[error("`{path}`: `{name}` is declared twice among siblings")]
    DuplicateName { path: String, name: String },
    #[error("`{path}`: argument {position} declares no accepted types")]
    NoAcceptedTypes { path: String, position: usize },
    #[error("`{path}`: argument {position} uses unknown type `{ty}`")]
    UnknownType { path: String, position: usize, ty: String },
    #[error("`{path}`: only the last argument may be variadic (argument {position})")]
    VariadicNotLast { path: String, position: usize },
    #[error("`{path}`: default of argument {position} does not fit its accepted types")]
    DefaultMismatch { path: String, position: usize },
    #[error("`{path}`: unknown handler `{handler}`")]
    UnknownHandler { path: String, handler: String },
    #[error("`{path}`: unknown permission `{permission}`")]
    UnknownPermission { path: String, permission: String },
    #[error("`{path}`: unknown permission scope `{scope}`")]
    UnknownScope { path: String, scope: String },
    #[error("`{path}`: invalid default value for argument {position}")]
    InvalidDefault { path: String, position: usize },
}

/// Checks a whole subtree; the first problem found rejects it.
/// `Ok` means the declaration may be registered.
pub fn validate(node: &Command, types: &TypeResolvers) -> Result<(), DeclarationError> {
    validate_at(node, types, "")
}

fn validate_at(node: &Command, types: &TypeResolvers, parent: &str) -> Result<(), DeclarationError> {
    if node.name.is_empty() {
        return Err(DeclarationError::MissingName { path: parent.to_string() });
    }

    let path = if parent.is_empty() { node.name.clone() } else { format!("{parent} {}", node.name) };

    if !is_token(&node.name) || node.shortcut.as_deref().is_some_and(|s| !is_token(s)) {
        return Err(DeclarationError::InvalidName { path });
    }

    if node.handler.is_none() && node.subcommands.is_empty() {
        return Err(DeclarationError::NotExecutable { path });
    }

    if let Some(required) = node.permission {
        let capability = required.capability;
        if capability.is_empty() || Permissions::from_bits(capability.bits()).is_none() {
            return Err(DeclarationError::InvalidPermission { path });
        }
    }

    validate_arguments(&node.arguments, types, &path)?;

    let mut seen = HashSet::new();
    for child in &node.subcommands {
        for ident in std::iter::once(&child.name).chain(child.shortcut.as_ref()) {
            if !ident.is_empty() && !seen.insert(ident.as_str()) {
                return Err(DeclarationError::DuplicateName { path, name: ident.clone() });
            }
        }
    }

    for child in &node.subcommands {
        validate_at(child, types, &path)?;
    }

    Ok(())
}

fn validate_arguments(specs: &[ArgumentSpec], types: &TypeResolvers, path: &str) -> Result<(), DeclarationError> {
    let last = specs.len().saturating_sub(1);

    for (position, spec) in specs.iter().enumerate() {
        if spec.accepted_types.is_empty() {
            return Err(DeclarationError::NoAcceptedTypes { path: path.to_string(), position });
        }

        if let Some(unknown) = spec.accepted_types.iter().find(|ty| !types.knows(ty)) {
            return Err(DeclarationError::UnknownType { path: path.to_string(), position, ty: unknown.to_string() });
        }

        if spec.is_variadic && position != last {
            return Err(DeclarationError::VariadicNotLast { path: path.to_string(), position });
        }

        if let Some(default) = &spec.default {
            if spec.is_variadic || !default_fits(default, &spec.accepted_types) {
                return Err(DeclarationError::DefaultMismatch { path: path.to_string(), position });
            }
        }
    }

    Ok(())
}

fn default_fits(default: &ArgValue, accepted: &[ArgType]) -> bool {
    accepted.iter().any(|ty| match (ty, default) {
        (ArgType::Text, ArgValue::Text(_)) => true,
        (ArgType::Number, ArgValue::Number(n)) => n.is_finite(),
        (ArgType::Boolean, ArgValue::Boolean(_)) => true,
        // identifiers resolve to text
        (ArgType::Extended(name), ArgValue::Text(_)) => name == "identifier",
        (ArgType::Extended(name), value) => name == value.type_name(),
        _ => false,
    })
}

fn is_token(ident: &str) -> bool {
    !ident.is_empty() && !ident.chars().any(char::is_whitespace)
}
