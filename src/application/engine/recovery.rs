//! Top-level handling of typed stage errors.
//!
//! Every `StageError` raised by a flow ends up here exactly once:
//!
//! 1. log it with its cause chain
//! 2. show its message (anchored reply or broadcast, as the error says)
//! 3. on termination, follow up with the help text as a closing message
//! 4. release the session's source artifact
//! 5. move the session to the error's recovery stage

use std::sync::Arc;

use tracing::{error, warn};

use crate::application::messages::help_text;
use crate::domain::conversation::{
    ConversationSession, ConversationStage, InboundEvent, ReplyMode, Session, StageError,
};
use crate::ports::MessagingGateway;

/// Applies the error recovery steps to a session.
#[derive(Clone)]
pub struct ErrorRecovery {
    gateway: Arc<dyn MessagingGateway>,
}

impl ErrorRecovery {
    pub fn new(gateway: Arc<dyn MessagingGateway>) -> Self {
        Self { gateway }
    }

    pub async fn recover<S, D>(
        &self,
        flow: &'static str,
        session: &mut Session<S, D>,
        event: &InboundEvent,
        err: StageError<S>,
    ) where
        S: ConversationStage,
        D: ConversationSession,
    {
        let stage = session.stage();
        let cause = err.cause_chain().unwrap_or_default();
        if err.kind().is_user_recoverable() {
            warn!(
                flow,
                chat = %event.chat_id,
                stage = %stage,
                kind = ?err.kind(),
                recovery_stage = %err.recovery_stage(),
                cause = %cause,
                "{}",
                err.message()
            );
        } else {
            error!(
                flow,
                chat = %event.chat_id,
                stage = %stage,
                kind = ?err.kind(),
                recovery_stage = %err.recovery_stage(),
                cause = %cause,
                "{}",
                err.message()
            );
        }

        let next = match stage.transition_to(err.recovery_stage()) {
            Ok(next) => next,
            Err(defect) => {
                error!(flow, error = %defect, "Recovery stage is not reachable, terminating");
                S::terminated()
            }
        };

        let sent = match err.reply_mode() {
            ReplyMode::Anchored => self.gateway.reply(&event.chat_ref(), err.message(), &[]).await,
            ReplyMode::Broadcast => self.gateway.prompt(event.chat_id, err.message(), &[]).await,
        };
        if let Err(e) = sent {
            warn!(flow, chat = %event.chat_id, error = %e, "Failed to send error message");
        }

        if next.is_terminated() {
            let closing = help_text(event.sender.as_ref());
            if let Err(e) = self.gateway.prompt(event.chat_id, &closing, &[]).await {
                warn!(flow, chat = %event.chat_id, error = %e, "Failed to send closing message");
            }
        }

        release_source(flow, session);

        if next == S::initial() || next.is_terminated() {
            session.data_mut().reset();
        }
        session.set_stage(next);
    }
}

/// Deletes the session's source artifact, if it holds one.
pub(crate) fn release_source<S, D>(flow: &'static str, session: &mut Session<S, D>)
where
    S: ConversationStage,
    D: ConversationSession,
{
    if let Some(artifact) = session.data_mut().take_source() {
        let path = artifact.path().display().to_string();
        if let Err(e) = artifact.close() {
            warn!(flow, path = %path, error = %e, "Failed to delete source artifact");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::gateway::{Outgoing, RecordingGateway};
    use crate::adapters::storage::TempArtifactFactory;
    use crate::domain::conversation::{
        EventPayload, FileConversationError, FileSession, FileStage, SourceDocument, UrlSession,
        UrlStage,
    };
    use crate::domain::foundation::{ChatId, MessageId};
    use crate::domain::formats::FileFormat;
    use crate::ports::ArtifactFactory;
    use tempfile::TempDir;

    fn event() -> InboundEvent {
        InboundEvent::new(
            ChatId::new(5),
            MessageId::new(50),
            EventPayload::Text("x".to_string()),
        )
    }

    fn setup() -> (Arc<RecordingGateway>, ErrorRecovery) {
        let gateway = Arc::new(RecordingGateway::new());
        let recovery = ErrorRecovery::new(gateway.clone());
        (gateway, recovery)
    }

    fn session_with_source(root: &TempDir) -> (Session<FileStage, FileSession>, std::path::PathBuf) {
        let factory = TempArtifactFactory::new(root.path());
        let artifact = factory.create("upload", "json").unwrap();
        let path = artifact.path().to_path_buf();
        let mut session: Session<FileStage, FileSession> = Session::new();
        session
            .data_mut()
            .attach_source(SourceDocument::new(artifact, Some("upload.json".to_string())));
        (session, path)
    }

    #[tokio::test]
    async fn test_anchored_error_replies_once_and_rests_at_recovery_stage() {
        let (gateway, recovery) = setup();
        let mut session: Session<UrlStage, UrlSession> = Session::new();
        session.set_stage(UrlStage::ValidatingInput);

        let err = StageError::validation("the url x is invalid", UrlStage::ValidatingInput);
        recovery.recover("url", &mut session, &event(), err).await;

        assert_eq!(session.stage(), UrlStage::ValidatingInput);
        let sent = gateway.sent();
        assert_eq!(sent.len(), 1);
        assert!(matches!(
            &sent[0],
            Outgoing::Reply { reply_to, .. } if *reply_to == MessageId::new(50)
        ));
    }

    #[tokio::test]
    async fn test_terminal_error_sends_message_then_closing_help() {
        let root = TempDir::new().unwrap();
        let (gateway, recovery) = setup();
        let (mut session, source) = session_with_source(&root);
        session.set_stage(FileStage::Converting);
        session.data_mut().set_source_format(FileFormat::Json);

        let err: StageError<FileStage> = FileConversationError::ConversionFailed {
            source_format: FileFormat::Json,
            target_format: FileFormat::Yml,
        }
        .into();
        recovery.recover("file", &mut session, &event(), err).await;

        assert_eq!(session.stage(), FileStage::Terminated);
        assert!(session.data().source_format().is_none());
        assert!(!source.exists());

        let texts = gateway.texts(ChatId::new(5));
        assert_eq!(texts.len(), 2);
        assert!(texts[0].starts_with("Error when converting"));
        assert!(texts[1].contains("This bot supports the following commands"));
        assert!(gateway.sent().iter().all(|o| !o.is_reply()));
    }

    #[tokio::test]
    async fn test_classification_error_deletes_source_and_resets() {
        let root = TempDir::new().unwrap();
        let (_gateway, recovery) = setup();
        let (mut session, source) = session_with_source(&root);
        session.set_stage(FileStage::ClassifyingInput);

        let err: StageError<FileStage> = FileConversationError::FileTypeNotSupported {
            detected: "image/gif".to_string(),
        }
        .into();
        recovery.recover("file", &mut session, &event(), err).await;

        assert_eq!(session.stage(), FileStage::AwaitingInput);
        assert!(session.data().source().is_none());
        assert!(!source.exists());
    }

    #[tokio::test]
    async fn test_unreachable_recovery_stage_terminates() {
        let (gateway, recovery) = setup();
        let mut session: Session<FileStage, FileSession> = Session::new();
        session.set_stage(FileStage::Converting);

        // Converting cannot go back to ChoosingTarget
        let err = StageError::validation("bad", FileStage::ChoosingTarget);
        recovery.recover("file", &mut session, &event(), err).await;

        assert_eq!(session.stage(), FileStage::Terminated);
        assert_eq!(gateway.texts(ChatId::new(5)).len(), 2);
    }
}
