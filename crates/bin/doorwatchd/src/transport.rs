//! Line-based command transport.
//!
//! Each input line is `<origin> <command text>`, e.g.
//! `+15551234567 open i`. Lines without both parts are skipped.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

use doorwatch_app::command_loop::InboundCommand;
use doorwatch_domain::subscription::Recipient;

/// Split one input line into an inbound command.
#[must_use]
pub fn parse_line(line: &str) -> Option<InboundCommand> {
    let (origin, text) = line.trim().split_once(char::is_whitespace)?;
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let origin = Recipient::new(origin).ok()?;
    Some(InboundCommand {
        origin,
        text: text.to_string(),
    })
}

/// Forward every well-formed line of `reader` to the command loop until the
/// input ends or the loop goes away.
pub async fn read_commands<R>(reader: R, commands: mpsc::Sender<InboundCommand>)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let Some(inbound) = parse_line(&line) else {
                    if !line.trim().is_empty() {
                        tracing::warn!(line, "ignoring malformed command line");
                    }
                    continue;
                };
                if commands.send(inbound).await.is_err() {
                    tracing::debug!("command loop stopped, closing transport");
                    return;
                }
            }
            Ok(None) => {
                tracing::info!("command input closed");
                return;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to read command input");
                return;
            }
        }
    }
}
