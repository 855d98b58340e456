//! Drives one conversation flow for one session at a time.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::flow::ConversationFlow;
use super::recovery::{release_source, ErrorRecovery};
use crate::application::messages::help_text;
use crate::domain::conversation::{
    ConversationSession, ConversationStage, InboundEvent, Session, StageError,
};
use crate::domain::foundation::StateMachine;
use crate::ports::MessagingGateway;

/// Transient stages chained within one turn before the flow is considered
/// broken.
const MAX_TRANSIENT_HOPS: usize = 8;

/// Session record driven by flow `F`.
pub type FlowSession<F> =
    Session<<F as ConversationFlow>::Stage, <F as ConversationFlow>::Data>;

/// Runs a [`ConversationFlow`]: validates every stage change, executes
/// transient stages in the same turn, and routes failures through
/// [`ErrorRecovery`].
///
/// Holds no per-session state; callers serialize events per session.
pub struct ConversationEngine<F: ConversationFlow> {
    flow: F,
    gateway: Arc<dyn MessagingGateway>,
    recovery: ErrorRecovery,
}

impl<F: ConversationFlow> ConversationEngine<F> {
    pub fn new(flow: F, gateway: Arc<dyn MessagingGateway>) -> Self {
        let recovery = ErrorRecovery::new(gateway.clone());
        Self {
            flow,
            gateway,
            recovery,
        }
    }

    pub fn flow(&self) -> &F {
        &self.flow
    }

    /// Starts a fresh conversation in response to `event`.
    pub async fn start(&self, event: &InboundEvent) -> FlowSession<F> {
        let mut session = FlowSession::<F>::new();
        info!(flow = self.flow.name(), chat = %event.chat_id, "Conversation started");

        match self.flow.start(&event.chat_ref()).await {
            Ok(stage) => {
                self.commit(&mut session, stage, event).await;
            }
            Err(err) => self.recovery.recover(self.flow.name(), &mut session, event, err).await,
        }
        session
    }

    /// Feeds one event to the session.
    ///
    /// Cancellation is honoured in every non-terminal stage. Events reaching
    /// a terminated session are ignored.
    pub async fn handle(&self, session: &mut FlowSession<F>, event: &InboundEvent) {
        if session.is_terminated() {
            debug!(flow = self.flow.name(), chat = %event.chat_id, "Ignoring event for finished conversation");
            return;
        }
        session.touch();

        if event.is_cancel() {
            self.cancel(session, event).await;
            return;
        }

        let mut hops = 0;
        loop {
            let current = session.stage();
            let next = match self.flow.handle(current, session.data_mut(), event).await {
                Ok(next) => next,
                Err(err) => {
                    self.recovery
                        .recover(self.flow.name(), session, event, err)
                        .await;
                    return;
                }
            };

            if !self.commit(session, next, event).await {
                return;
            }
            if next == current || !next.is_transient() {
                return;
            }

            hops += 1;
            if hops > MAX_TRANSIENT_HOPS {
                let err = StageError::configuration(format!(
                    "{} chained more than {MAX_TRANSIENT_HOPS} transient stages",
                    self.flow.name()
                ));
                self.recovery
                    .recover(self.flow.name(), session, event, err)
                    .await;
                return;
            }
        }
    }

    /// Cancels the conversation: deletes the source, shows the help text and
    /// terminates.
    pub async fn cancel(&self, session: &mut FlowSession<F>, event: &InboundEvent) {
        info!(flow = self.flow.name(), chat = %event.chat_id, stage = %session.stage(), "Conversation cancelled");
        self.discard(session);

        let help = help_text(event.sender.as_ref());
        if let Err(e) = self.gateway.prompt(event.chat_id, &help, &[]).await {
            warn!(flow = self.flow.name(), chat = %event.chat_id, error = %e, "Failed to send help after cancel");
        }
    }

    /// Ends the conversation without telling the user (re-entry, eviction).
    pub fn discard(&self, session: &mut FlowSession<F>) {
        release_source(self.flow.name(), session);
        session.data_mut().reset();
        session.set_stage(F::Stage::terminated());
    }

    /// Moves the session to `next` if the transition is valid.
    ///
    /// An invalid transition is a defect in the flow: it is reported through
    /// recovery and the session terminates. Reaching `Terminated` clears the
    /// session data.
    async fn commit(&self, session: &mut FlowSession<F>, next: F::Stage, event: &InboundEvent) -> bool {
        let current = session.stage();
        if let Err(defect) = current.transition_to(next) {
            error!(flow = self.flow.name(), error = %defect, "Flow produced an invalid transition");
            let err = StageError::configuration(defect.to_string());
            self.recovery
                .recover(self.flow.name(), session, event, err)
                .await;
            return false;
        }

        debug!(flow = self.flow.name(), chat = %event.chat_id, from = %current, to = %next, "Stage transition");
        session.set_stage(next);

        if next.is_terminated() {
            release_source(self.flow.name(), session);
            session.data_mut().reset();
            info!(flow = self.flow.name(), chat = %event.chat_id, "Conversation finished");
        }
        true
    }
}
