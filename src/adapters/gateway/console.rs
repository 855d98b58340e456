//! Console messaging gateway.
//!
//! Drives a conversation from a terminal: outgoing messages are written as
//! lines, choices are listed in brackets, and delivered artifacts are copied
//! into an outbox directory. Uploads are local file paths.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::info;

use crate::domain::conversation::{ChatRef, EventPayload, InboundEvent, IncomingDocument};
use crate::domain::foundation::{ChatId, MessageId};
use crate::ports::{GatewayError, MessagingGateway};

/// Prefix marking a line as a file upload (`@path/to/file.json`).
pub const UPLOAD_PREFIX: char = '@';

/// Turns one console line into an inbound event.
///
/// `/command` lines are commands, `@path` lines upload a local file and
/// anything else is text. Blank lines yield `None`.
pub fn parse_console_line(
    chat_id: ChatId,
    message_id: MessageId,
    line: &str,
) -> Option<InboundEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let payload = match line.strip_prefix(UPLOAD_PREFIX) {
        Some(path) => {
            let path = path.trim();
            if path.is_empty() {
                return None;
            }
            EventPayload::Document(IncomingDocument {
                file_id: path.to_string(),
                file_name: Path::new(path)
                    .file_name()
                    .and_then(|name| name.to_str())
                    .map(str::to_string),
                size_bytes: std::fs::metadata(path).ok().map(|m| m.len()),
            })
        }
        None => EventPayload::from_text(line),
    };

    Some(InboundEvent::new(chat_id, message_id, payload))
}

/// Messaging gateway writing to a terminal (or any async writer).
pub struct ConsoleGateway<W = tokio::io::Stdout> {
    out: Mutex<W>,
    outbox: PathBuf,
}

impl ConsoleGateway {
    /// Gateway printing to stdout and delivering into `outbox`.
    pub fn stdout(outbox: impl Into<PathBuf>) -> Self {
        Self::new(tokio::io::stdout(), outbox)
    }
}

impl<W: AsyncWrite + Unpin + Send> ConsoleGateway<W> {
    pub fn new(out: W, outbox: impl Into<PathBuf>) -> Self {
        Self {
            out: Mutex::new(out),
            outbox: outbox.into(),
        }
    }

    pub fn outbox(&self) -> &Path {
        &self.outbox
    }

    /// Consumes the gateway, returning the writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    async fn write_line(&self, line: &str) -> Result<(), GatewayError> {
        let mut out = self.out.lock().await;
        out.write_all(line.as_bytes()).await?;
        out.write_all(b"\n").await?;
        out.flush().await?;
        Ok(())
    }

    fn render(text: &str, choices: &[String]) -> String {
        if choices.is_empty() {
            text.to_string()
        } else {
            format!("{text}\n  [{}]", choices.join("] ["))
        }
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> MessagingGateway for ConsoleGateway<W> {
    async fn prompt(
        &self,
        chat: ChatId,
        text: &str,
        choices: &[String],
    ) -> Result<(), GatewayError> {
        self.write_line(&format!("[{chat}] bot: {}", Self::render(text, choices)))
            .await
    }

    async fn reply(
        &self,
        chat: &ChatRef,
        text: &str,
        choices: &[String],
    ) -> Result<(), GatewayError> {
        self.write_line(&format!(
            "[{}] bot (re #{}): {}",
            chat.chat_id,
            chat.message_id,
            Self::render(text, choices)
        ))
        .await
    }

    async fn edit(&self, chat: ChatId, text: &str) -> Result<(), GatewayError> {
        self.write_line(&format!("[{chat}] bot (edited): {text}")).await
    }

    async fn deliver_artifact(
        &self,
        chat: ChatId,
        path: &Path,
        display_name: &str,
    ) -> Result<(), GatewayError> {
        tokio::fs::create_dir_all(&self.outbox).await?;
        let destination = self.outbox.join(display_name);
        let bytes = tokio::fs::copy(path, &destination).await?;
        info!(chat = %chat, file = %destination.display(), bytes, "Artifact delivered");
        self.write_line(&format!(
            "[{chat}] bot sent a file: {}",
            destination.display()
        ))
        .await
    }

    async fn download_document(
        &self,
        document: &IncomingDocument,
        destination: &Path,
        max_bytes: u64,
    ) -> Result<u64, GatewayError> {
        let source = Path::new(&document.file_id);
        if !source.is_file() {
            return Err(GatewayError::DocumentNotFound {
                file_id: document.file_id.clone(),
            });
        }
        let size = tokio::fs::metadata(source).await?.len();
        if size > max_bytes {
            return Err(GatewayError::TooLarge {
                size,
                limit: max_bytes,
            });
        }
        Ok(tokio::fs::copy(source, destination).await?)
    }
}
