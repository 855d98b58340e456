//! Typed stage errors and the recovery policy they carry.

use std::error::Error as StdError;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::stage::ConversationStage;

/// Boxed underlying cause attached to a stage error.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Message shown for defects that are not the user's fault.
pub const INTERNAL_ERROR_MESSAGE: &str =
    "Something went wrong on our side, please start the conversion again";

/// Classification of stage failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The input could not be classified or is unsupported.
    InputClassification,
    /// The input is malformed or does not resolve.
    Validation,
    /// The conversion operation failed.
    Conversion,
    /// Routing tables or session bookkeeping are inconsistent.
    Configuration,
    /// The result could not be handed to the messaging gateway.
    Delivery,
}

impl ErrorKind {
    /// Returns true for kinds the user can fix by answering again.
    pub fn is_user_recoverable(&self) -> bool {
        matches!(self, ErrorKind::InputClassification | ErrorKind::Validation)
    }
}

/// How the error message reaches the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyMode {
    /// Reply attached to the message that triggered the error.
    Anchored,
    /// Plain message to the chat.
    Broadcast,
}

/// A failure raised by a stage handler.
///
/// The raise site decides where the session resumes (`recovery_stage`) and
/// how the message is shown (`reply_mode`); the central handler only
/// executes that decision.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct StageError<S: ConversationStage> {
    kind: ErrorKind,
    message: String,
    recovery_stage: S,
    reply_mode: ReplyMode,
    #[source]
    cause: Option<BoxError>,
}

/// `Ok(next_stage)` or a typed failure.
pub type StageResult<S> = Result<S, StageError<S>>;

impl<S: ConversationStage> StageError<S> {
    pub fn new(
        kind: ErrorKind,
        message: impl Into<String>,
        recovery_stage: S,
        reply_mode: ReplyMode,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            recovery_stage,
            reply_mode,
            cause: None,
        }
    }

    /// Unclassifiable input; anchored reply, resume at `recovery_stage`.
    pub fn input_classification(message: impl Into<String>, recovery_stage: S) -> Self {
        Self::new(
            ErrorKind::InputClassification,
            message,
            recovery_stage,
            ReplyMode::Anchored,
        )
    }

    /// Malformed input; anchored reply, resume at `recovery_stage`.
    pub fn validation(message: impl Into<String>, recovery_stage: S) -> Self {
        Self::new(
            ErrorKind::Validation,
            message,
            recovery_stage,
            ReplyMode::Anchored,
        )
    }

    /// Failed conversion; broadcast, session terminates.
    pub fn conversion(message: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::Conversion,
            message,
            S::terminated(),
            ReplyMode::Broadcast,
        )
    }

    /// Internal inconsistency. The user sees a generic message; `detail`
    /// is kept as the cause for the logs.
    pub fn configuration(detail: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::Configuration,
            INTERNAL_ERROR_MESSAGE,
            S::terminated(),
            ReplyMode::Broadcast,
        )
        .with_cause(detail.into())
    }

    /// The gateway refused a delivery; broadcast, session terminates.
    pub fn delivery(file_name: &str) -> Self {
        Self::new(
            ErrorKind::Delivery,
            format!("Unable to send {file_name}, please try again later"),
            S::terminated(),
            ReplyMode::Broadcast,
        )
    }

    /// Attaches the underlying failure.
    pub fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The user-visible message.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn recovery_stage(&self) -> S {
        self.recovery_stage
    }

    pub fn reply_mode(&self) -> ReplyMode {
        self.reply_mode
    }

    /// The wrapped cause, if any.
    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    /// Renders the cause chain as `a: b: c` for logging.
    pub fn cause_chain(&self) -> Option<String> {
        let mut current: Option<&(dyn StdError + 'static)> =
            self.cause.as_deref().map(|c| c as &(dyn StdError + 'static));
        let mut parts = Vec::new();
        while let Some(err) = current {
            parts.push(err.to_string());
            current = err.source();
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(": "))
        }
    }

    /// Returns true when recovery ends the session.
    pub fn is_terminal(&self) -> bool {
        self.recovery_stage.is_terminated()
    }
}
