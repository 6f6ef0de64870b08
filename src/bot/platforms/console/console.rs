use futures::{future::BoxFuture, FutureExt};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::bot::{
    chat_event::chat_event::{ChatEvent, ChatUser, DisplayName, Platform, UserIdentity},
    commands::commands::BotResult,
    db::GroupId,
    handler::handler::ChatClient,
    permissions::permissions::MemberPermissions,
    state::def::Settings,
};

pub const CONSOLE_CHANNEL: &str = "console";
pub const CONSOLE_USER: &str = "operator";

pub fn map_line(line: &str, settings: &Settings) -> ChatEvent {
    ChatEvent {
        platform: Platform::Console,
        group: settings.console_group.clone(),
        channel: CONSOLE_CHANNEL.to_string(),
        message: line.to_string(),
        user: ChatUser {
            identity: UserIdentity {
                platform: Platform::Console,
                platform_user_id: CONSOLE_USER.to_string(),
            },
            name: DisplayName {
                login: CONSOLE_USER.to_string(),
                display: CONSOLE_USER.to_string(),
            },
            permissions: MemberPermissions::uniform(settings.console_permissions),
        },
    }
}

/// Writes replies as `[group #channel] message` lines.
pub struct ConsoleClient<W> {
    out: Mutex<W>,
}

impl ConsoleClient<tokio::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W: AsyncWrite + Unpin + Send> ConsoleClient<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl<W: AsyncWrite + Unpin + Send> ChatClient for ConsoleClient<W> {
    fn send_message<'a>(&'a self, group: &'a GroupId, channel: &'a str, message: &'a str) -> BoxFuture<'a, BotResult<()>> {
        async move {
            let mut out = self.out.lock().await;
            out.write_all(format!("[{} #{channel}] {message}\n", group.group()).as_bytes()).await?;
            out.flush().await?;
            Ok(())
        }
        .boxed()
    }
}
