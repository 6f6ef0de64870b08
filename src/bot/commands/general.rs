use std::sync::Arc;

use chrono::Utc;
use once_cell::sync::OnceCell;
use rand::Rng;

use crate::bot::{
    commands::{commands::{ArgValue, ArgumentSpec, Check, Command, Invocation, Invoker}, Forest},
    handler::handler::{reply, ChatClient},
    permissions::permissions::check_permission,
    replies::Replies,
    state::def::{GroupConfig, Locale},
};

/// `help` needs the finished forest, which only exists after every command
/// (help included) is registered.
pub type ForestCell = Arc<OnceCell<Forest>>;

/// Commands a group may switch off. `help` and `config` always stay on.
pub const TOGGLEABLE: &[&str] = &["ping", "echo", "countdown", "roll"];

const MAX_SIDES: f64 = 1_000_000.0;

pub fn general_commands(client: Arc<dyn ChatClient>, forest: ForestCell) -> Vec<Command> {
    vec![
        ping_command(client.clone()),
        echo_command(client.clone()),
        countdown_command(client.clone()),
        roll_command(client.clone()),
        help_command(client, forest),
    ]
}

/// Refuses `name` in groups that turned it off.
pub fn enabled_in_group(name: &str) -> impl Fn(&Invoker, &GroupConfig, Locale) -> Check + Send + Sync + 'static {
    let name = name.to_string();
    move |_: &Invoker, group: &GroupConfig, locale: Locale| {
        if group.disabled_commands.contains(&name) {
            Check::Deny(Some(Replies::command_disabled(locale, &name)))
        } else {
            Check::Allow
        }
    }
}

pub fn ping_command(client: Arc<dyn ChatClient>) -> Command {
    Command::new("ping")
        .shortcut("p")
        .description("Check that the bot is alive")
        .usage("ping")
        .can_execute(enabled_in_group("ping"))
        .handler(move |inv| {
            let client = client.clone();
            Box::pin(async move { reply(client.as_ref(), &inv, &Replies::pong(inv.locale)).await })
        })
}

pub fn echo_command(client: Arc<dyn ChatClient>) -> Command {
    Command::new("echo")
        .description("Repeat the given text")
        .usage("echo <text...>")
        .argument(ArgumentSpec::text().variadic())
        .can_execute(enabled_in_group("echo"))
        .handler(move |inv| {
            let client = client.clone();
            Box::pin(async move {
                let text = inv.args.first().map(ToString::to_string).unwrap_or_default();
                if text.is_empty() {
                    return Ok(());
                }
                reply(client.as_ref(), &inv, &text).await
            })
        })
}

pub fn countdown_command(client: Arc<dyn ChatClient>) -> Command {
    Command::new("countdown")
        .shortcut("cd")
        .description("Days left until a date")
        .usage("countdown <YYYY-MM-DD|today|tomorrow|+3d>")
        .argument(ArgumentSpec::extended("date"))
        .can_execute(enabled_in_group("countdown"))
        .handler(move |inv| {
            let client = client.clone();
            Box::pin(async move {
                let Some(date) = inv.args.first().and_then(ArgValue::as_date) else {
                    return Ok(());
                };
                let days = (date.date_naive() - Utc::now().date_naive()).num_days();
                reply(client.as_ref(), &inv, &Replies::countdown(inv.locale, days)).await
            })
        })
}

pub fn roll_command(client: Arc<dyn ChatClient>) -> Command {
    Command::new("roll")
        .description("Roll a die, six-sided unless told otherwise")
        .argument(ArgumentSpec::number().default(ArgValue::Number(6.0)))
        .can_execute(enabled_in_group("roll"))
        .handler(move |inv| {
            let client = client.clone();
            Box::pin(async move {
                let sides = inv.args.first().and_then(ArgValue::as_number).unwrap_or(6.0);
                if sides < 1.0 || sides > MAX_SIDES || sides.fract() != 0.0 {
                    return reply(client.as_ref(), &inv, &Replies::invalid_value(inv.locale, &sides.to_string())).await;
                }

                let sides = sides as u64;
                let result = rand::thread_rng().gen_range(1..=sides);
                reply(client.as_ref(), &inv, &Replies::roll(inv.locale, result, sides)).await
            })
        })
}

pub fn help_command(client: Arc<dyn ChatClient>, forest: ForestCell) -> Command {
    Command::new("help")
        .shortcut("h")
        .description("List commands, or show how to use one")
        .usage("help [command...]")
        .argument(ArgumentSpec::text().variadic())
        .handler(move |inv| {
            let client = client.clone();
            let forest = forest.clone();
            Box::pin(async move {
                let Some(forest) = forest.get() else {
                    return Ok(());
                };
                reply(client.as_ref(), &inv, &help_text(forest, &inv)).await
            })
        })
}

pub fn help_text(forest: &Forest, inv: &Invocation) -> String {
    let prefix = &inv.group.command_prefix;
    let path: Vec<String> = inv
        .args
        .first()
        .and_then(ArgValue::as_sequence)
        .unwrap_or_default()
        .iter()
        .map(ToString::to_string)
        .collect();

    if path.is_empty() {
        let mut lines = vec![Replies::help_header(inv.locale)];
        for cmd in forest.roots() {
            if !check_permission(inv.invoker.capabilities.as_ref(), cmd) {
                continue;
            }
            let mut line = format!("`{prefix}{}`", cmd.name);
            if let (true, Some(shortcut)) = (inv.group.shortcuts_enabled, &cmd.shortcut) {
                line.push_str(&format!(" (`{prefix}{shortcut}`)"));
            }
            if !cmd.description.is_empty() {
                line.push_str(&format!(" - {}", cmd.description));
            }
            lines.push(line);
        }
        return lines.join("\n");
    }

    let Some((cmd, names)) = forest.lookup(&path, inv.group.shortcuts_enabled) else {
        return Replies::unknown_command(inv.locale, prefix, &path.join(" "));
    };

    let mut lines = vec![format!("`{}`", usage_line(forest, prefix, &names))];
    if !cmd.description.is_empty() {
        lines.push(cmd.description.clone());
    }
    if !cmd.subcommands.is_empty() {
        let names: Vec<&str> = cmd.subcommands.iter().map(|c| c.name.as_str()).collect();
        lines.push(format!("{}: {}", Replies::help_subcommands(inv.locale), names.join(", ")));
    }
    lines.join("\n")
}

/// Declared usage when there is one, otherwise built from the argument specs.
pub fn usage_line(forest: &Forest, prefix: &str, path: &[String]) -> String {
    let Some(cmd) = forest.find(path) else {
        return format!("{prefix}{}", path.join(" "));
    };
    if !cmd.usage.is_empty() {
        return format!("{prefix}{}", cmd.usage);
    }

    let mut parts = vec![format!("{prefix}{}", path.join(" "))];
    for spec in &cmd.arguments {
        let types: Vec<&str> = spec.accepted_types.iter().map(|t| t.name()).collect();
        let types = types.join("|");
        parts.push(match (spec.is_variadic, spec.default.is_some()) {
            (true, _) => format!("[{types}...]"),
            (false, true) => format!("[{types}]"),
            (false, false) => format!("<{types}>"),
        });
    }
    if cmd.arguments.is_empty() && !cmd.subcommands.is_empty() {
        let names: Vec<&str> = cmd.subcommands.iter().map(|c| c.name.as_str()).collect();
        parts.push(format!("<{}>", names.join("|")));
    }
    parts.join(" ")
}
