use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

use crate::bot::{chat_event::chat_event::ChatEvent, commands::commands::BotResult, platforms::console::console::map_line, state::def::Settings};

pub async fn run_console_loop(tx: UnboundedSender<ChatEvent>, settings: Arc<Settings>) -> BotResult<()> {
    info!("Reading commands from stdin as group `{}`", settings.console_group);
    forward_lines(BufReader::new(tokio::io::stdin()), tx, &settings).await
}

/// Stops at end of input or once the receiving side is gone.
pub async fn forward_lines<R>(input: R, tx: UnboundedSender<ChatEvent>, settings: &Settings) -> BotResult<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        if tx.send(map_line(&line, settings)).is_err() {
            break;
        }
    }
    info!("Console input closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc::unbounded_channel;

    use super::*;

    #[tokio::test]
    async fn every_non_blank_line_is_forwarded() {
        let settings = Settings::from_lookup(|_| None).unwrap();
        let (tx, mut rx) = unbounded_channel();

        forward_lines(&b"!ping\n\n   \n!echo hi there\n"[..], tx, &settings).await.unwrap();

        assert_eq!(rx.recv().await.map(|e| e.message), Some("!ping".to_string()));
        assert_eq!(rx.recv().await.map(|e| e.message), Some("!echo hi there".to_string()));
        assert!(rx.recv().await.is_none());
    }
}
