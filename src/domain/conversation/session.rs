//! The per-chat session record.

use chrono::{DateTime, Duration, Utc};

use super::stage::{ConversationSession, ConversationStage};

/// One ongoing interaction: the current stage plus typed session data.
///
/// The stage is always a member of `S`; it is only changed by the engine
/// after the transition has been validated.
#[derive(Debug)]
pub struct Session<S, D> {
    stage: S,
    data: D,
    last_activity: DateTime<Utc>,
}

impl<S: ConversationStage, D: ConversationSession> Session<S, D> {
    /// Creates a fresh session at the domain's initial stage.
    pub fn new() -> Self {
        Self {
            stage: S::initial(),
            data: D::default(),
            last_activity: Utc::now(),
        }
    }

    pub fn stage(&self) -> S {
        self.stage
    }

    pub fn data(&self) -> &D {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut D {
        &mut self.data
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    pub fn is_terminated(&self) -> bool {
        self.stage.is_terminated()
    }

    /// Records activity at the current time.
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Returns true when no activity happened within `idle` before `now`.
    pub fn is_idle(&self, now: DateTime<Utc>, idle: Duration) -> bool {
        now - self.last_activity > idle
    }

    /// Clears the data and returns to the initial stage.
    pub fn reset(&mut self) {
        self.data.reset();
        self.stage = S::initial();
    }

    pub(crate) fn set_stage(&mut self, stage: S) {
        self.stage = stage;
    }

    #[cfg(test)]
    pub(crate) fn set_last_activity(&mut self, at: DateTime<Utc>) {
        self.last_activity = at;
    }
}

impl<S: ConversationStage, D: ConversationSession> Default for Session<S, D> {
    fn default() -> Self {
        Self::new()
    }
}
