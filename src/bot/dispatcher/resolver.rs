use std::sync::Arc;

use serenity::all::Permissions;
use tracing::{debug, error};

use crate::bot::{
    commands::{commands::{ArgValue, Check, Command, CommandHandler, Invocation, Invoker}, types::TypeResolvers, Forest},
    dispatcher::coercer::{fill_arguments, ArgumentError},
    permissions::permissions::check_permission,
    state::def::GroupConfig,
};

/// Result of one dispatch. Everything except `NotFound` and `Handled` is a
/// terminal error the caller reports back to the invoker.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    NotFound,
    Handled,
    PermissionDenied { path: Vec<String>, required: Permissions },
    Refused { path: Vec<String>, reason: Option<String> },
    MissingSubcommand { path: Vec<String>, choices: Vec<String> },
    MissingArgument { path: Vec<String>, position: usize },
    ArgumentTypeMismatch { path: Vec<String>, position: usize, token: String },
}

/// A matched leaf with its arguments bound, ready to run.
pub struct Prepared {
    pub handler: CommandHandler,
    pub path: Vec<String>,
    pub args: Vec<ArgValue>,
}

enum Step {
    NotFound,
    Stop(Outcome),
    Run(Prepared),
}

/// Walks the forest without running anything.
pub fn plan(tokens: &[String], forest: &Forest, group: &GroupConfig, invoker: &Invoker) -> Result<Prepared, Outcome> {
    let mut path = Vec::new();
    match walk(tokens, forest.roots(), group, invoker, forest.types(), &mut path) {
        Step::NotFound => Err(Outcome::NotFound),
        Step::Stop(outcome) => Err(outcome),
        Step::Run(prepared) => Ok(prepared),
    }
}

fn walk(tokens: &[String], nodes: &[Command], group: &GroupConfig, invoker: &Invoker, types: &TypeResolvers, path: &mut Vec<String>) -> Step {
    let Some((head, rest)) = tokens.split_first() else {
        return Step::NotFound;
    };

    // First match in declaration order is final, even when it is refused.
    let Some(node) = nodes.iter().find(|n| n.matches(head, group.shortcuts_enabled)) else {
        return Step::NotFound;
    };
    path.push(node.name.clone());

    if !check_permission(invoker.capabilities.as_ref(), node) {
        let required = node.permission.map(|p| p.capability).unwrap_or_else(Permissions::empty);
        return Step::Stop(Outcome::PermissionDenied { path: path.clone(), required });
    }

    if let Some(check) = &node.can_execute {
        if let Check::Deny(reason) = check(invoker, group, group.locale) {
            return Step::Stop(Outcome::Refused { path: path.clone(), reason });
        }
    }

    if !node.subcommands.is_empty() {
        match walk(rest, &node.subcommands, group, invoker, types, path) {
            Step::NotFound => {}
            found => return found,
        }
    }

    let Some(handler) = node.handler.clone() else {
        let choices = node.subcommands.iter().map(|c| c.name.clone()).collect();
        return Step::Stop(Outcome::MissingSubcommand { path: path.clone(), choices });
    };

    match fill_arguments(&node.arguments, rest, types) {
        Ok(args) => Step::Run(Prepared { handler, path: path.clone(), args }),
        Err(ArgumentError::Missing { position }) => Step::Stop(Outcome::MissingArgument { path: path.clone(), position }),
        Err(ArgumentError::Mismatch { position, token }) => {
            Step::Stop(Outcome::ArgumentTypeMismatch { path: path.clone(), position, token })
        }
    }
}

/// Resolves `tokens` and, on a match, awaits the leaf handler. Handler
/// failures are logged; the outcome stays `Handled`.
pub async fn resolve(tokens: &[String], forest: &Forest, group: Arc<GroupConfig>, invoker: Arc<Invoker>) -> Outcome {
    let Prepared { handler, path, args } = match plan(tokens, forest, &group, &invoker) {
        Ok(prepared) => prepared,
        Err(outcome) => return outcome,
    };

    debug!("Running `{}` with {} argument(s)", path.join(" "), args.len());
    let command = path.join(" ");
    let invocation = Invocation { invoker, locale: group.locale, group, path, args };

    if let Err(e) = handler(invocation).await {
        error!("Command `{command}` failed: {e}");
    }

    Outcome::Handled
}
