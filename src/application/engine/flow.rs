//! The contract each conversation implements.

use async_trait::async_trait;

use crate::domain::conversation::{
    ChatRef, ConversationSession, ConversationStage, ErrorKind, InboundEvent, ReplyMode,
    StageError, StageResult, INTERNAL_ERROR_MESSAGE,
};
use crate::ports::GatewayError;

/// One conversation's stage handlers.
///
/// The engine owns the session record and the transition bookkeeping; a
/// flow only decides, for the current stage and event, which stage comes
/// next and which gateway calls happen on the way. Gateway calls complete
/// before the returned stage is committed.
#[async_trait]
pub trait ConversationFlow: Send + Sync {
    type Stage: ConversationStage;
    type Data: ConversationSession;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Prompts for the first input and returns the stage to wait in.
    async fn start(&self, chat: &ChatRef) -> StageResult<Self::Stage>;

    /// Handles `event` at `stage`.
    ///
    /// Returning a transient stage makes the engine run it immediately with
    /// the same event.
    async fn handle(
        &self,
        stage: Self::Stage,
        data: &mut Self::Data,
        event: &InboundEvent,
    ) -> StageResult<Self::Stage>;
}

/// Answer to a yes/no question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YesNo {
    Yes,
    No,
}

impl YesNo {
    pub fn parse(answer: &str) -> Option<Self> {
        match answer.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" => Some(YesNo::Yes),
            "no" | "n" => Some(YesNo::No),
            _ => None,
        }
    }
}

/// A gateway call failed mid-turn: nothing sensible can be shown in the
/// chat, so the conversation ends.
pub fn transport_failure<S: ConversationStage>(err: GatewayError) -> StageError<S> {
    StageError::new(
        ErrorKind::Delivery,
        INTERNAL_ERROR_MESSAGE,
        S::terminated(),
        ReplyMode::Broadcast,
    )
    .with_cause(err)
}
