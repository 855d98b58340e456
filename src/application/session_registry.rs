//! Per-chat session storage.
//!
//! Each chat owns one slot guarded by its own async mutex: events for one
//! chat are processed one at a time while different chats proceed in
//! parallel. The map lock is only held to look up or remove slots.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::domain::conversation::{
    FileSession, FileStage, MediaSession, MediaStage, Session, UrlSession, UrlStage,
};
use crate::domain::foundation::ChatId;

/// Which conversation a chat is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversationKind {
    File,
    Url,
    Media,
}

impl fmt::Display for ConversationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConversationKind::File => "file",
            ConversationKind::Url => "url",
            ConversationKind::Media => "media",
        };
        f.write_str(name)
    }
}

/// The session record of whichever conversation a chat is in.
#[derive(Debug)]
pub enum ActiveConversation {
    File(Session<FileStage, FileSession>),
    Url(Session<UrlStage, UrlSession>),
    Media(Session<MediaStage, MediaSession>),
}

impl ActiveConversation {
    pub fn kind(&self) -> ConversationKind {
        match self {
            ActiveConversation::File(_) => ConversationKind::File,
            ActiveConversation::Url(_) => ConversationKind::Url,
            ActiveConversation::Media(_) => ConversationKind::Media,
        }
    }

    /// Current stage, as its snake_case name.
    pub fn stage_name(&self) -> String {
        match self {
            ActiveConversation::File(s) => s.stage().to_string(),
            ActiveConversation::Url(s) => s.stage().to_string(),
            ActiveConversation::Media(s) => s.stage().to_string(),
        }
    }

    pub fn is_terminated(&self) -> bool {
        match self {
            ActiveConversation::File(s) => s.is_terminated(),
            ActiveConversation::Url(s) => s.is_terminated(),
            ActiveConversation::Media(s) => s.is_terminated(),
        }
    }

    pub fn is_idle(&self, now: DateTime<Utc>, idle: Duration) -> bool {
        match self {
            ActiveConversation::File(s) => s.is_idle(now, idle),
            ActiveConversation::Url(s) => s.is_idle(now, idle),
            ActiveConversation::Media(s) => s.is_idle(now, idle),
        }
    }

    pub fn as_file(&self) -> Option<&Session<FileStage, FileSession>> {
        match self {
            ActiveConversation::File(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_url(&self) -> Option<&Session<UrlStage, UrlSession>> {
        match self {
            ActiveConversation::Url(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_media(&self) -> Option<&Session<MediaStage, MediaSession>> {
        match self {
            ActiveConversation::Media(s) => Some(s),
            _ => None,
        }
    }
}

/// Slot holding a chat's conversation, if any.
pub type SessionSlot = Arc<Mutex<Option<ActiveConversation>>>;

/// All chats' session slots.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    slots: RwLock<HashMap<ChatId, SessionSlot>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The slot for `chat`, created empty on first use.
    pub async fn slot(&self, chat: ChatId) -> SessionSlot {
        if let Some(slot) = self.slots.read().await.get(&chat) {
            return slot.clone();
        }
        self.slots
            .write()
            .await
            .entry(chat)
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone()
    }

    /// The slot for `chat`, if one exists.
    pub async fn find(&self, chat: ChatId) -> Option<SessionSlot> {
        self.slots.read().await.get(&chat).cloned()
    }

    /// Locks the slot for `chat`, creating it if needed.
    ///
    /// The returned guard belongs to the slot currently registered for the
    /// chat: a slot pruned or evicted while we waited is retried.
    pub async fn lock(&self, chat: ChatId) -> OwnedMutexGuard<Option<ActiveConversation>> {
        loop {
            let slot = self.slot(chat).await;
            let guard = slot.clone().lock_owned().await;
            let registered = self
                .slots
                .read()
                .await
                .get(&chat)
                .is_some_and(|current| Arc::ptr_eq(current, &slot));
            if registered {
                return guard;
            }
        }
    }

    /// Number of chats with a slot.
    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.slots.read().await.is_empty()
    }

    /// Drops the slot for `chat` if it is empty and nobody is using it.
    pub async fn prune(&self, chat: ChatId) {
        let mut slots = self.slots.write().await;
        let unused = slots
            .get(&chat)
            .and_then(|slot| slot.try_lock().ok().map(|guard| guard.is_none()))
            .unwrap_or(false);
        if unused {
            slots.remove(&chat);
        }
    }

    /// Removes conversations idle for longer than `idle` and returns them.
    ///
    /// Slots busy with an event are skipped; they are active by definition.
    pub async fn evict_idle(
        &self,
        now: DateTime<Utc>,
        idle: Duration,
    ) -> Vec<(ChatId, ActiveConversation)> {
        let mut slots = self.slots.write().await;
        let mut evicted = Vec::new();
        let mut emptied = Vec::new();

        for (chat, slot) in slots.iter() {
            let Ok(mut guard) = slot.try_lock() else {
                continue;
            };
            let expired = guard
                .as_ref()
                .map(|conversation| conversation.is_idle(now, idle))
                .unwrap_or(true);
            if expired {
                if let Some(conversation) = guard.take() {
                    evicted.push((*chat, conversation));
                }
                emptied.push(*chat);
            }
        }

        for chat in emptied {
            slots.remove(&chat);
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_session(last_activity: DateTime<Utc>) -> ActiveConversation {
        let mut session = Session::new();
        session.set_last_activity(last_activity);
        ActiveConversation::File(session)
    }

    #[tokio::test]
    async fn test_slot_is_shared_per_chat() {
        let registry = SessionRegistry::new();
        let a = registry.slot(ChatId::new(1)).await;
        let b = registry.slot(ChatId::new(1)).await;
        let other = registry.slot(ChatId::new(2)).await;

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &other));
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn test_prune_removes_only_empty_slots() {
        let registry = SessionRegistry::new();
        let slot = registry.slot(ChatId::new(1)).await;
        *slot.lock().await = Some(file_session(Utc::now()));
        registry.slot(ChatId::new(2)).await;

        registry.prune(ChatId::new(1)).await;
        registry.prune(ChatId::new(2)).await;

        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_evict_idle_takes_only_stale_conversations() {
        let registry = SessionRegistry::new();
        let now = Utc::now();
        *registry.slot(ChatId::new(1)).await.lock().await =
            Some(file_session(now - Duration::hours(2)));
        *registry.slot(ChatId::new(2)).await.lock().await = Some(file_session(now));

        let evicted = registry.evict_idle(now, Duration::minutes(30)).await;

        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].0, ChatId::new(1));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_evict_skips_busy_slots() {
        let registry = SessionRegistry::new();
        let now = Utc::now();
        let slot = registry.slot(ChatId::new(1)).await;
        let mut guard = slot.lock().await;
        *guard = Some(file_session(now - Duration::hours(2)));

        let evicted = registry.evict_idle(now, Duration::minutes(30)).await;

        assert!(evicted.is_empty());
        assert!(guard.is_some());
    }

    #[tokio::test]
    async fn test_lock_recreates_an_evicted_slot() {
        let registry = SessionRegistry::new();
        let stale = registry.slot(ChatId::new(1)).await;
        registry.prune(ChatId::new(1)).await;

        let mut guard = registry.lock(ChatId::new(1)).await;
        *guard = Some(file_session(Utc::now()));
        drop(guard);

        assert!(stale.lock().await.is_none());
        let current = registry.find(ChatId::new(1)).await.unwrap();
        assert!(current.lock().await.is_some());
    }

    #[tokio::test]
    async fn test_find_does_not_create_slots() {
        let registry = SessionRegistry::new();
        assert!(registry.find(ChatId::new(9)).await.is_none());
        assert!(registry.is_empty().await);
    }

    #[test]
    fn stage_name_uses_snake_case() {
        let conversation = file_session(Utc::now());
        assert_eq!(conversation.stage_name(), "awaiting_input");
        assert_eq!(conversation.kind(), ConversationKind::File);
        assert!(conversation.as_url().is_none());
    }
}
