use std::sync::Arc;

use tracing::info;

use crate::bot::{
    chat_event::chat_event::ChatEvent,
    commands::{commands::{BotResult, Invoker}, general::usage_line},
    dispatcher::{resolver::{resolve, Outcome}, tokenizer::tokenize},
    replies::Replies,
    state::def::AppState,
};

/// Returns the command text when the message is addressed to the bot,
/// either by the group prefix or by a leading mention of the bot user.
pub fn strip_invocation<'m>(message: &'m str, prefix: &str, bot_user_id: Option<u64>) -> Option<&'m str> {
    let message = message.trim_start();

    if !prefix.is_empty() {
        if let Some(rest) = message.strip_prefix(prefix) {
            return Some(rest);
        }
    }

    let id = bot_user_id?;
    [format!("<@{id}>"), format!("<@!{id}>")]
        .iter()
        .find_map(|mention| message.strip_prefix(mention.as_str()))
}

/// Returns `None` when the message was not meant for the bot.
pub async fn dispatch_message(state: Arc<AppState>, event: &ChatEvent) -> BotResult<Option<Outcome>> {
    let group_id = event.group_id();
    let group = state.store.snapshot(&group_id).await;

    let Some(body) = strip_invocation(&event.message, &group.command_prefix, state.settings.bot_user_id) else {
        return Ok(None);
    };

    let tokens = tokenize(body);
    let Some(head) = tokens.first().cloned() else {
        return Ok(None);
    };

    let invoker = Arc::new(Invoker::from_event(event.clone()));
    let outcome = resolve(&tokens, &state.forest, group.clone(), invoker).await;
    let user = &event.user;
    info!("{group_id} #{} {} ({}): `{head}` -> {outcome:?}", event.channel, user.name.display, user.identity.platform_user_id);

    let prefix = group.command_prefix.as_str();
    let usage = |path: &[String]| usage_line(&state.forest, prefix, path);
    if let Some(reply) = Replies::for_outcome(&outcome, group.locale, prefix, &head, usage) {
        state.chat_client.send_message(&group_id, &event.channel, &reply).await?;
    }

    Ok(Some(outcome))
}

#[cfg(test)]
mod tests {
    use once_cell::sync::OnceCell;
    use serenity::all::Permissions;

    use super::*;
    use crate::bot::{
        chat_event::chat_event::{ChatUser, DisplayName, Platform, UserIdentity},
        commands::{config::config_commands, general::general_commands, types::TypeResolvers, CommandRegistry},
        db::{config::GroupStore, memory_pool},
        handler::handler::{testing::RecordingClient, ChatClient},
        permissions::permissions::MemberPermissions,
        state::def::Settings,
    };

    #[test]
    fn prefix_or_mention_addresses_the_bot() {
        assert_eq!(strip_invocation("!ping", "!", None), Some("ping"));
        assert_eq!(strip_invocation("  ?? ping", "??", None), Some(" ping"));
        assert_eq!(strip_invocation("ping", "!", None), None);
        assert_eq!(strip_invocation("<@42> ping", "!", Some(42)), Some(" ping"));
        assert_eq!(strip_invocation("<@!42> ping", "!", Some(42)), Some(" ping"));
        assert_eq!(strip_invocation("<@43> ping", "!", Some(42)), None);
        assert_eq!(strip_invocation("<@42> ping", "!", None), None);
    }

    async fn state(permissions: Permissions) -> (Arc<AppState>, Arc<RecordingClient>, ChatEvent) {
        let settings = Arc::new(Settings::from_lookup(|key| (key == "BOT_USER_ID").then(|| "42".to_string())).unwrap());
        let store = GroupStore::load(memory_pool().await, settings.clone()).await.unwrap();
        let recorder = Arc::new(RecordingClient::default());
        let client: Arc<dyn ChatClient> = recorder.clone();

        let cell = Arc::new(OnceCell::new());
        let mut registry = CommandRegistry::new(TypeResolvers::with_defaults());
        for cmd in general_commands(client.clone(), cell.clone()) {
            registry.register(cmd);
        }
        registry.register(config_commands(client.clone(), store.clone()));
        let forest = registry.finish();
        let _ = cell.set(forest.clone());

        let event = ChatEvent {
            platform: Platform::Discord,
            group: "guild".into(),
            channel: "general".into(),
            user: ChatUser {
                identity: UserIdentity { platform: Platform::Discord, platform_user_id: "7".into() },
                name: DisplayName { login: "someone".into(), display: "Someone".into() },
                permissions: MemberPermissions::uniform(permissions),
            },
            message: String::new(),
        };

        (Arc::new(AppState { settings, forest, store, chat_client: client }), recorder, event)
    }

    fn say(event: &ChatEvent, text: &str) -> ChatEvent {
        ChatEvent { message: text.into(), ..event.clone() }
    }

    #[tokio::test]
    async fn plain_chat_is_ignored() {
        let (state, client, event) = state(Permissions::SEND_MESSAGES).await;
        assert_eq!(dispatch_message(state.clone(), &say(&event, "hello there")).await.unwrap(), None);
        assert_eq!(dispatch_message(state, &say(&event, "!   ")).await.unwrap(), None);
        assert!(client.messages().is_empty());
    }

    #[tokio::test]
    async fn unknown_command_gets_a_reply() {
        let (state, client, event) = state(Permissions::SEND_MESSAGES).await;
        let outcome = dispatch_message(state, &say(&event, "!pnig")).await.unwrap();
        assert_eq!(outcome, Some(Outcome::NotFound));
        assert_eq!(client.messages(), vec!["❓ Unknown command `!pnig`. Try `!help` 💜".to_string()]);
    }

    #[tokio::test]
    async fn mention_works_like_a_prefix() {
        let (state, client, event) = state(Permissions::SEND_MESSAGES).await;
        let outcome = dispatch_message(state, &say(&event, "<@42> ping")).await.unwrap();
        assert_eq!(outcome, Some(Outcome::Handled));
        assert_eq!(client.messages(), vec!["🏓 Pong!".to_string()]);
    }

    #[tokio::test]
    async fn argument_errors_quote_usage() {
        let (state, client, event) = state(Permissions::SEND_MESSAGES).await;
        dispatch_message(state, &say(&event, "!roll many")).await.unwrap();
        assert_eq!(client.messages(), vec!["❌ `many` is not valid for argument 1. Usage: !roll [number]".to_string()]);
    }

    #[tokio::test]
    async fn group_settings_change_later_dispatches() {
        let (state, client, event) = state(Permissions::MANAGE_GUILD).await;

        assert_eq!(dispatch_message(state.clone(), &say(&event, "!p")).await.unwrap(), Some(Outcome::NotFound));
        dispatch_message(state.clone(), &say(&event, "!config shortcuts 1")).await.unwrap();
        dispatch_message(state.clone(), &say(&event, "!config prefix $")).await.unwrap();

        assert_eq!(dispatch_message(state.clone(), &say(&event, "!p")).await.unwrap(), None);
        assert_eq!(dispatch_message(state, &say(&event, "$p")).await.unwrap(), Some(Outcome::Handled));
        assert_eq!(client.messages().last().map(String::as_str), Some("🏓 Pong!"));
    }

    #[tokio::test]
    async fn switched_off_commands_are_refused_in_the_group_language() {
        let (state, client, event) = state(Permissions::MANAGE_GUILD).await;

        dispatch_message(state.clone(), &say(&event, "!config disable echo")).await.unwrap();
        let outcome = dispatch_message(state.clone(), &say(&event, "!echo hello")).await.unwrap();
        assert_eq!(
            outcome,
            Some(Outcome::Refused { path: vec!["echo".into()], reason: Some("`echo` is turned off in this group".into()) })
        );

        dispatch_message(state.clone(), &say(&event, "!config locale cs")).await.unwrap();
        dispatch_message(state.clone(), &say(&event, "!echo hello")).await.unwrap();
        dispatch_message(state.clone(), &say(&event, "!config enable echo")).await.unwrap();
        dispatch_message(state, &say(&event, "!echo hello")).await.unwrap();

        assert_eq!(
            client.messages(),
            vec![
                "✅ `echo` is now `off`".to_string(),
                "❌ `echo` is turned off in this group".to_string(),
                "✅ `locale` je teď `cs`".to_string(),
                "❌ `echo` je v této skupině vypnutý".to_string(),
                "✅ `echo` je teď `on`".to_string(),
                "hello".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn denied_config_is_reported() {
        let (state, client, event) = state(Permissions::SEND_MESSAGES).await;
        let outcome = dispatch_message(state, &say(&event, "!config prefix ?")).await.unwrap();
        assert!(matches!(outcome, Some(Outcome::PermissionDenied { .. })));
        assert_eq!(client.messages(), vec!["❌ You need MANAGE_GUILD to use this command".to_string()]);
    }
}
