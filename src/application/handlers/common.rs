//! Pieces shared by the conversation flows.

use crate::application::engine::transport_failure;
use crate::domain::conversation::{ConversationStage, InboundEvent, StageError};
use crate::domain::formats::{labels, FormatTag};
use crate::ports::MessagingGateway;

/// The user's pick among `offered`, if the answer names one of them.
pub(crate) fn chosen_format<T: FormatTag>(event: &InboundEvent, offered: &[T]) -> Option<T> {
    let format = event.answer()?.parse::<T>().ok()?;
    offered.contains(&format).then_some(format)
}

/// Re-states what is expected, anchored to the rejected message.
pub(crate) async fn reprompt<S: ConversationStage>(
    gateway: &dyn MessagingGateway,
    event: &InboundEvent,
    text: &str,
    choices: &[String],
) -> Result<(), StageError<S>> {
    gateway
        .reply(&event.chat_ref(), text, choices)
        .await
        .map_err(transport_failure::<S>)
}

/// Re-prompt for a format choice outside the offered set.
pub(crate) async fn reprompt_choice<S: ConversationStage, T: FormatTag>(
    gateway: &dyn MessagingGateway,
    event: &InboundEvent,
    offered: &[T],
) -> Result<(), StageError<S>> {
    let text = format!(
        "Please choose one of the following formats: {}",
        labels(offered).join(", ")
    );
    reprompt::<S>(gateway, event, &text, &labels(offered)).await
}
