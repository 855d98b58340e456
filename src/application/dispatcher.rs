//! Routes inbound chat events to the right conversation.
//!
//! Global commands (`/start`, `/help`) are answered directly. Entry commands
//! (`/convert`, `/url`, `/youtube`) start a conversation, replacing any
//! conversation already running in the chat. Everything else goes to the
//! chat's active conversation, or is ignored when there is none.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use super::engine::ConversationEngine;
use super::handlers::{FileConversation, MediaConversation, UrlConversation};
use super::messages::help_text;
use super::session_registry::{ActiveConversation, ConversationKind, SessionRegistry};
use crate::domain::conversation::{BotCommand, InboundEvent};
use crate::domain::foundation::ChatId;
use crate::ports::MessagingGateway;

/// What the dispatcher did with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The help text was sent.
    Help,
    /// A new conversation started (possibly replacing another).
    Started(ConversationKind),
    /// The active conversation handled the event and now rests at `stage`.
    Continued {
        kind: ConversationKind,
        stage: String,
    },
    /// The active conversation handled the event and is over.
    Finished(ConversationKind),
    /// Nothing to do: no conversation and not a command.
    Ignored,
}

/// Entry point for every inbound event.
pub struct Dispatcher {
    gateway: Arc<dyn MessagingGateway>,
    file: ConversationEngine<FileConversation>,
    url: ConversationEngine<UrlConversation>,
    media: ConversationEngine<MediaConversation>,
    sessions: SessionRegistry,
}

impl Dispatcher {
    pub fn new(
        gateway: Arc<dyn MessagingGateway>,
        file: FileConversation,
        url: UrlConversation,
        media: MediaConversation,
    ) -> Self {
        Self {
            file: ConversationEngine::new(file, gateway.clone()),
            url: ConversationEngine::new(url, gateway.clone()),
            media: ConversationEngine::new(media, gateway.clone()),
            gateway,
            sessions: SessionRegistry::new(),
        }
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Handles one inbound event to completion.
    ///
    /// Events for the same chat are serialized; other chats are unaffected.
    pub async fn handle(&self, event: &InboundEvent) -> DispatchOutcome {
        if let Some(BotCommand::Start | BotCommand::Help) = event.command() {
            let help = help_text(event.sender.as_ref());
            if let Err(e) = self.gateway.prompt(event.chat_id, &help, &[]).await {
                warn!(chat = %event.chat_id, error = %e, "Failed to send help");
            }
            return DispatchOutcome::Help;
        }

        let mut active = self.sessions.lock(event.chat_id).await;

        let entry = match event.command() {
            Some(BotCommand::Convert) => Some(ConversationKind::File),
            Some(BotCommand::Url) => Some(ConversationKind::Url),
            Some(BotCommand::Youtube) => Some(ConversationKind::Media),
            _ => None,
        };

        let outcome = match entry {
            Some(kind) => {
                if let Some(previous) = active.as_mut() {
                    info!(chat = %event.chat_id, previous = %previous.kind(), next = %kind, "Replacing active conversation");
                    self.discard(previous);
                }
                *active = Some(self.start(kind, event).await);
                DispatchOutcome::Started(kind)
            }
            None => match active.as_mut() {
                Some(conversation) => self.continue_with(conversation, event).await,
                None => {
                    debug!(chat = %event.chat_id, "No active conversation, ignoring event");
                    DispatchOutcome::Ignored
                }
            },
        };

        // Finished and never-started conversations free their slot
        if active.as_ref().is_some_and(ActiveConversation::is_terminated) {
            *active = None;
        }
        let finished = active.is_none();
        drop(active);
        if finished {
            self.sessions.prune(event.chat_id).await;
        }

        outcome
    }

    /// Inspects a chat's active conversation.
    pub async fn inspect<R>(&self, chat: ChatId, f: impl FnOnce(Option<&ActiveConversation>) -> R) -> R {
        match self.sessions.find(chat).await {
            Some(slot) => f(slot.lock().await.as_ref()),
            None => f(None),
        }
    }

    /// Ends conversations idle longer than `idle`, deleting their sources.
    ///
    /// Returns how many were evicted.
    pub async fn evict_idle(&self, idle: Duration) -> usize {
        let evicted = self.sessions.evict_idle(Utc::now(), idle).await;
        let count = evicted.len();
        for (chat, mut conversation) in evicted {
            info!(chat = %chat, kind = %conversation.kind(), stage = %conversation.stage_name(), "Evicting idle conversation");
            self.discard(&mut conversation);
        }
        count
    }

    async fn start(&self, kind: ConversationKind, event: &InboundEvent) -> ActiveConversation {
        match kind {
            ConversationKind::File => ActiveConversation::File(self.file.start(event).await),
            ConversationKind::Url => ActiveConversation::Url(self.url.start(event).await),
            ConversationKind::Media => ActiveConversation::Media(self.media.start(event).await),
        }
    }

    async fn continue_with(
        &self,
        conversation: &mut ActiveConversation,
        event: &InboundEvent,
    ) -> DispatchOutcome {
        match conversation {
            ActiveConversation::File(session) => self.file.handle(session, event).await,
            ActiveConversation::Url(session) => self.url.handle(session, event).await,
            ActiveConversation::Media(session) => self.media.handle(session, event).await,
        }

        let kind = conversation.kind();
        if conversation.is_terminated() {
            DispatchOutcome::Finished(kind)
        } else {
            DispatchOutcome::Continued {
                kind,
                stage: conversation.stage_name(),
            }
        }
    }

    fn discard(&self, conversation: &mut ActiveConversation) {
        match conversation {
            ActiveConversation::File(session) => self.file.discard(session),
            ActiveConversation::Url(session) => self.url.discard(session),
            ActiveConversation::Media(session) => self.media.discard(session),
        }
    }
}
