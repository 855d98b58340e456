//! In-memory messaging gateway for testing.
//!
//! Records every outgoing message and delivery so tests can assert on what
//! a user would have seen, and serves uploads registered up front.
//!
//! # Panics
//!
//! This adapter is for **testing only**. It uses `.expect()` on lock
//! operations, which panics if a lock is poisoned.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::domain::conversation::{ChatRef, IncomingDocument};
use crate::domain::foundation::{ChatId, MessageId};
use crate::ports::{GatewayError, MessagingGateway};

/// One thing the engine sent to a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    Prompt {
        chat: ChatId,
        text: String,
        choices: Vec<String>,
    },
    Reply {
        chat: ChatId,
        reply_to: MessageId,
        text: String,
        choices: Vec<String>,
    },
    Edit {
        chat: ChatId,
        text: String,
    },
    Delivery {
        chat: ChatId,
        display_name: String,
        /// Where the artifact lived when it was handed over.
        path: PathBuf,
        content: Vec<u8>,
    },
}

impl Outgoing {
    pub fn chat(&self) -> ChatId {
        match self {
            Outgoing::Prompt { chat, .. }
            | Outgoing::Reply { chat, .. }
            | Outgoing::Edit { chat, .. }
            | Outgoing::Delivery { chat, .. } => *chat,
        }
    }

    /// Text of a message; `None` for deliveries.
    pub fn text(&self) -> Option<&str> {
        match self {
            Outgoing::Prompt { text, .. }
            | Outgoing::Reply { text, .. }
            | Outgoing::Edit { text, .. } => Some(text),
            Outgoing::Delivery { .. } => None,
        }
    }

    pub fn choices(&self) -> &[String] {
        match self {
            Outgoing::Prompt { choices, .. } | Outgoing::Reply { choices, .. } => choices,
            _ => &[],
        }
    }

    pub fn is_reply(&self) -> bool {
        matches!(self, Outgoing::Reply { .. })
    }
}

/// Messaging gateway that keeps everything in memory.
///
/// # Example
///
/// ```ignore
/// let gateway = Arc::new(RecordingGateway::new());
/// gateway.add_document("doc-1", br#"{"a": 1}"#.to_vec());
///
/// dispatcher.handle(event).await;
///
/// assert_eq!(gateway.deliveries(chat).len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct RecordingGateway {
    sent: RwLock<Vec<Outgoing>>,
    documents: RwLock<HashMap<String, Vec<u8>>>,
    unreachable: RwLock<HashSet<ChatId>>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `file_id` downloadable with the given content.
    pub fn add_document(&self, file_id: impl Into<String>, content: Vec<u8>) {
        self.documents
            .write()
            .expect("RecordingGateway: documents lock poisoned")
            .insert(file_id.into(), content);
    }

    /// Fails every subsequent delivery to `chat`.
    pub fn fail_deliveries_to(&self, chat: ChatId) {
        self.unreachable
            .write()
            .expect("RecordingGateway: unreachable lock poisoned")
            .insert(chat);
    }

    // === Test Helpers ===

    /// Everything sent, in order.
    pub fn sent(&self) -> Vec<Outgoing> {
        self.sent
            .read()
            .expect("RecordingGateway: sent lock poisoned")
            .clone()
    }

    /// Everything sent to one chat, in order.
    pub fn sent_to(&self, chat: ChatId) -> Vec<Outgoing> {
        self.sent().into_iter().filter(|o| o.chat() == chat).collect()
    }

    /// Message texts sent to one chat (deliveries excluded).
    pub fn texts(&self, chat: ChatId) -> Vec<String> {
        self.sent_to(chat)
            .iter()
            .filter_map(|o| o.text().map(str::to_string))
            .collect()
    }

    /// Deliveries to one chat.
    pub fn deliveries(&self, chat: ChatId) -> Vec<Outgoing> {
        self.sent_to(chat)
            .into_iter()
            .filter(|o| matches!(o, Outgoing::Delivery { .. }))
            .collect()
    }

    /// Last thing sent to `chat`.
    pub fn last(&self, chat: ChatId) -> Option<Outgoing> {
        self.sent_to(chat).pop()
    }

    /// Forgets everything sent so far.
    pub fn clear(&self) {
        self.sent
            .write()
            .expect("RecordingGateway: sent lock poisoned")
            .clear();
    }

    fn record(&self, outgoing: Outgoing) {
        self.sent
            .write()
            .expect("RecordingGateway: sent lock poisoned")
            .push(outgoing);
    }
}

#[async_trait]
impl MessagingGateway for RecordingGateway {
    async fn prompt(
        &self,
        chat: ChatId,
        text: &str,
        choices: &[String],
    ) -> Result<(), GatewayError> {
        self.record(Outgoing::Prompt {
            chat,
            text: text.to_string(),
            choices: choices.to_vec(),
        });
        Ok(())
    }

    async fn reply(
        &self,
        chat: &ChatRef,
        text: &str,
        choices: &[String],
    ) -> Result<(), GatewayError> {
        self.record(Outgoing::Reply {
            chat: chat.chat_id,
            reply_to: chat.message_id,
            text: text.to_string(),
            choices: choices.to_vec(),
        });
        Ok(())
    }

    async fn edit(&self, chat: ChatId, text: &str) -> Result<(), GatewayError> {
        self.record(Outgoing::Edit {
            chat,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn deliver_artifact(
        &self,
        chat: ChatId,
        path: &Path,
        display_name: &str,
    ) -> Result<(), GatewayError> {
        let unreachable = self
            .unreachable
            .read()
            .expect("RecordingGateway: unreachable lock poisoned")
            .contains(&chat);
        if unreachable {
            return Err(GatewayError::ChatUnreachable(chat));
        }

        let content = tokio::fs::read(path).await?;
        self.record(Outgoing::Delivery {
            chat,
            display_name: display_name.to_string(),
            path: path.to_path_buf(),
            content,
        });
        Ok(())
    }

    async fn download_document(
        &self,
        document: &IncomingDocument,
        destination: &Path,
        max_bytes: u64,
    ) -> Result<u64, GatewayError> {
        let content = self
            .documents
            .read()
            .expect("RecordingGateway: documents lock poisoned")
            .get(&document.file_id)
            .cloned()
            .ok_or_else(|| GatewayError::DocumentNotFound {
                file_id: document.file_id.clone(),
            })?;

        let size = content.len() as u64;
        if size > max_bytes {
            return Err(GatewayError::TooLarge {
                size,
                limit: max_bytes,
            });
        }
        tokio::fs::write(destination, &content).await?;
        Ok(content.len() as u64)
    }
}
