//! Inbound chat events.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{ChatId, MessageId};

const EXIT_KEYWORD: &str = "exit";

/// Addresses a message within a chat: the chat for broadcasts, plus the
/// triggering message for anchored replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

impl ChatRef {
    pub fn new(chat_id: ChatId, message_id: MessageId) -> Self {
        Self {
            chat_id,
            message_id,
        }
    }
}

/// The user who sent an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub first_name: String,
    pub last_name: Option<String>,
}

impl Sender {
    /// "First Last", or just the first name.
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) if !last.trim().is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        }
    }
}

/// Bot commands understood by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotCommand {
    Start,
    Help,
    Cancel,
    /// Starts the file conversation.
    Convert,
    /// Starts the webpage conversation.
    Url,
    /// Starts the media-link conversation.
    Youtube,
    Unknown(String),
}

impl BotCommand {
    /// Parses `/name` or `/name@botname`. Returns `None` for non-commands.
    pub fn parse(text: &str) -> Option<Self> {
        let body = text.trim().strip_prefix('/')?;
        let word = body.split_whitespace().next().unwrap_or_default();
        let name = word.split('@').next().unwrap_or_default().to_ascii_lowercase();
        if name.is_empty() {
            return None;
        }

        Some(match name.as_str() {
            "start" => BotCommand::Start,
            "help" => BotCommand::Help,
            "cancel" => BotCommand::Cancel,
            "convert" => BotCommand::Convert,
            "url" => BotCommand::Url,
            "youtube" => BotCommand::Youtube,
            _ => BotCommand::Unknown(name),
        })
    }

    pub fn as_str(&self) -> &str {
        match self {
            BotCommand::Start => "start",
            BotCommand::Help => "help",
            BotCommand::Cancel => "cancel",
            BotCommand::Convert => "convert",
            BotCommand::Url => "url",
            BotCommand::Youtube => "youtube",
            BotCommand::Unknown(name) => name,
        }
    }
}

impl fmt::Display for BotCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.as_str())
    }
}

/// A file sent by the user, not yet downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingDocument {
    /// Transport-specific handle used to download the content.
    pub file_id: String,
    pub file_name: Option<String>,
    pub size_bytes: Option<u64>,
}

/// What the user sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum EventPayload {
    Command(BotCommand),
    Text(String),
    /// A button selection.
    Choice(String),
    Document(IncomingDocument),
    /// A compressed photo (as opposed to an image sent as a document).
    Photo(IncomingDocument),
}

impl EventPayload {
    /// Interprets typed text: commands become `Command`, the rest `Text`.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        match BotCommand::parse(&text) {
            Some(command) => EventPayload::Command(command),
            None => EventPayload::Text(text),
        }
    }
}

/// One inbound event for a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub sender: Option<Sender>,
    pub payload: EventPayload,
}

impl InboundEvent {
    pub fn new(chat_id: ChatId, message_id: MessageId, payload: EventPayload) -> Self {
        Self {
            chat_id,
            message_id,
            sender: None,
            payload,
        }
    }

    pub fn with_sender(mut self, sender: Sender) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn chat_ref(&self) -> ChatRef {
        ChatRef::new(self.chat_id, self.message_id)
    }

    pub fn command(&self) -> Option<&BotCommand> {
        match &self.payload {
            EventPayload::Command(command) => Some(command),
            _ => None,
        }
    }

    /// Typed text or a button selection.
    pub fn answer(&self) -> Option<&str> {
        match &self.payload {
            EventPayload::Text(text) | EventPayload::Choice(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Uploaded document or photo.
    pub fn document(&self) -> Option<&IncomingDocument> {
        match &self.payload {
            EventPayload::Document(doc) | EventPayload::Photo(doc) => Some(doc),
            _ => None,
        }
    }

    /// `/cancel`, or a message that is exactly `exit`.
    pub fn is_cancel(&self) -> bool {
        match &self.payload {
            EventPayload::Command(BotCommand::Cancel) => true,
            EventPayload::Text(text) => text == EXIT_KEYWORD,
            _ => false,
        }
    }
}
