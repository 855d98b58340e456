//! Messaging Gateway Port - Chat transport interface.
//!
//! The conversation engine talks to users exclusively through this port.
//! Inbound events are pushed to the engine by the transport; this trait
//! covers everything flowing back out, plus fetching uploaded content.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

use crate::domain::conversation::{ChatRef, IncomingDocument};
use crate::domain::foundation::ChatId;

/// Port for sending messages and files to a chat.
///
/// # Contract
///
/// - `prompt` sends a plain message to the chat, with optional choice
///   buttons (an empty slice means free-form input is expected).
/// - `reply` sends a message anchored to the triggering user message.
/// - `edit` replaces the text of the bot's most recent message in the chat
///   and removes its buttons.
/// - `deliver_artifact` uploads a file under `display_name`. The caller
///   keeps ownership of `path` and deletes it afterwards.
/// - `download_document` writes an uploaded document to `destination`
///   and returns the number of bytes written. Documents larger than
///   `max_bytes` are refused with [`GatewayError::TooLarge`] and nothing
///   is written.
///
/// Calls complete before the engine commits the next stage, so the user has
/// seen the prompt before the next event can arrive.
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    async fn prompt(&self, chat: ChatId, text: &str, choices: &[String])
        -> Result<(), GatewayError>;

    async fn reply(&self, chat: &ChatRef, text: &str, choices: &[String])
        -> Result<(), GatewayError>;

    async fn edit(&self, chat: ChatId, text: &str) -> Result<(), GatewayError>;

    async fn deliver_artifact(
        &self,
        chat: ChatId,
        path: &Path,
        display_name: &str,
    ) -> Result<(), GatewayError>;

    async fn download_document(
        &self,
        document: &IncomingDocument,
        destination: &Path,
        max_bytes: u64,
    ) -> Result<u64, GatewayError>;
}

/// Errors from the messaging gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("chat {0} is unreachable")]
    ChatUnreachable(ChatId),

    #[error("document {file_id} not found")]
    DocumentNotFound { file_id: String },

    #[error("document is {size} bytes, limit is {limit}")]
    TooLarge { size: u64, limit: u64 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    pub fn transport(message: impl Into<String>) -> Self {
        GatewayError::Transport(message.into())
    }
}
