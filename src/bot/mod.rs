use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;

use crate::bot::{chat_event::chat_event::ChatEvent, commands::commands::BotResult, handler::handler::handle_event, state::def::AppState};

pub mod state;
pub mod chat_event;
pub mod dispatcher;
pub mod commands;
pub mod platforms;
pub mod permissions;
pub mod db;
pub mod handler;
pub mod replies;

pub async fn run_event_loop(state: Arc<AppState>, mut rx: UnboundedReceiver<ChatEvent>) -> BotResult<()> {
    while let Some(event) = rx.recv().await {
        if let Err(e) = handle_event(&event, state.clone()).await {
            tracing::error!("Event error: {e:?}");
        }
    }

    Ok(())
}
