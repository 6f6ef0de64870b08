use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::debug;

use crate::bot::{chat_event::chat_event::ChatEvent, commands::commands::{BotResult, Invocation}, db::GroupId, dispatcher::{dispatcher::dispatch_message, resolver::Outcome}, state::def::AppState};

/// Outbound side of a chat platform.
pub trait ChatClient: Send + Sync {
    fn send_message<'a>(&'a self, group: &'a GroupId, channel: &'a str, message: &'a str) -> BoxFuture<'a, BotResult<()>>;
}

/// Answers in the channel the invocation came from.
pub async fn reply(client: &dyn ChatClient, invocation: &Invocation, message: &str) -> BotResult<()> {
    let event = &invocation.invoker.event;
    client.send_message(&event.group_id(), &event.channel, message).await
}

pub async fn handle_event(event: &ChatEvent, state: Arc<AppState>) -> BotResult<Option<Outcome>> {
    debug!("Event in {} #{} from {}", event.group_id(), event.channel, event.user.name.login);
    dispatch_message(state, event).await
}
