use std::sync::Arc;

use serenity::all::Permissions;

use crate::bot::{
    commands::{commands::{ArgValue, ArgumentSpec, Command}, general::TOGGLEABLE},
    db::config::GroupStore,
    handler::handler::{reply, ChatClient},
    permissions::permissions::PermissionScope,
    replies::Replies,
    state::def::Locale,
};

pub fn config_commands(client: Arc<dyn ChatClient>, store: GroupStore) -> Command {
    Command::new("config")
        .shortcut("cfg")
        .description("Show or change this group's settings")
        .permission(Permissions::MANAGE_GUILD, PermissionScope::Global)
        .subcommand(show_command(client.clone()))
        .subcommand(prefix_command(client.clone(), store.clone()))
        .subcommand(shortcuts_command(client.clone(), store.clone()))
        .subcommand(locale_command(client.clone(), store.clone()))
        .subcommand(toggle_command("enable", client.clone(), store.clone()))
        .subcommand(toggle_command("disable", client, store))
}

fn show_command(client: Arc<dyn ChatClient>) -> Command {
    Command::new("show")
        .description("Print the current settings")
        .handler(move |inv| {
            let client = client.clone();
            Box::pin(async move {
                let group = &inv.group;
                let text = Replies::config_show(inv.locale, &group.command_prefix, group.shortcuts_enabled, group.locale);
                reply(client.as_ref(), &inv, &text).await
            })
        })
}

fn prefix_command(client: Arc<dyn ChatClient>, store: GroupStore) -> Command {
    Command::new("prefix")
        .description("Set the command prefix")
        .usage("config prefix <text>")
        .argument(ArgumentSpec::text())
        .handler(move |inv| {
            let client = client.clone();
            let store = store.clone();
            Box::pin(async move {
                let Some(prefix) = inv.args.first().and_then(ArgValue::as_text).map(str::to_owned) else {
                    return Ok(());
                };

                let group_id = inv.invoker.event.group_id();
                let value = prefix.clone();
                store.update(&group_id, move |cfg| cfg.command_prefix = value).await?;

                reply(client.as_ref(), &inv, &Replies::config_updated(inv.locale, "prefix", &prefix)).await
            })
        })
}

fn shortcuts_command(client: Arc<dyn ChatClient>, store: GroupStore) -> Command {
    Command::new("shortcuts")
        .description("Turn command shortcuts on or off")
        .usage("config shortcuts <true|false>")
        .argument(ArgumentSpec::boolean())
        .handler(move |inv| {
            let client = client.clone();
            let store = store.clone();
            Box::pin(async move {
                let Some(enabled) = inv.args.first().and_then(ArgValue::as_bool) else {
                    return Ok(());
                };

                store.update(&inv.invoker.event.group_id(), |cfg| cfg.shortcuts_enabled = enabled).await?;
                reply(client.as_ref(), &inv, &Replies::config_updated(inv.locale, "shortcuts", &enabled.to_string())).await
            })
        })
}

fn locale_command(client: Arc<dyn ChatClient>, store: GroupStore) -> Command {
    Command::new("locale")
        .description("Change the reply language (en, cs)")
        .usage("config locale <en|cs>")
        .argument(ArgumentSpec::text())
        .handler(move |inv| {
            let client = client.clone();
            let store = store.clone();
            Box::pin(async move {
                let Some(raw) = inv.args.first().and_then(ArgValue::as_text) else {
                    return Ok(());
                };

                let Ok(locale) = raw.parse::<Locale>() else {
                    return reply(client.as_ref(), &inv, &Replies::invalid_value(inv.locale, raw)).await;
                };

                store.update(&inv.invoker.event.group_id(), |cfg| cfg.locale = locale).await?;
                // Confirm in the new language.
                reply(client.as_ref(), &inv, &Replies::config_updated(locale, "locale", locale.as_str())).await
            })
        })
}

/// `config enable <command>` and `config disable <command>`.
fn toggle_command(verb: &'static str, client: Arc<dyn ChatClient>, store: GroupStore) -> Command {
    Command::new(verb)
        .description(format!("Turn one of {} {}", TOGGLEABLE.join(", "), if verb == "enable" { "on" } else { "off" }))
        .usage(format!("config {verb} <command>"))
        .argument(ArgumentSpec::extended("identifier"))
        .handler(move |inv| {
            let client = client.clone();
            let store = store.clone();
            Box::pin(async move {
                let Some(name) = inv.args.first().and_then(ArgValue::as_text).map(str::to_owned) else {
                    return Ok(());
                };
                if !TOGGLEABLE.contains(&name.as_str()) {
                    return reply(client.as_ref(), &inv, &Replies::invalid_value(inv.locale, &name)).await;
                }

                let enable = inv.path.last().is_some_and(|verb| verb == "enable");
                let target = name.clone();
                store
                    .update(&inv.invoker.event.group_id(), move |cfg| {
                        cfg.disabled_commands.retain(|c| c != &target);
                        if !enable {
                            cfg.disabled_commands.push(target);
                        }
                    })
                    .await?;

                let state = if enable { "on" } else { "off" };
                reply(client.as_ref(), &inv, &Replies::config_updated(inv.locale, &name, state)).await
            })
        })
}
