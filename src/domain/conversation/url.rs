//! Webpage conversation: stages, session data and errors.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use url::Url;

use super::error::StageError;
use super::stage::{ConversationSession, ConversationStage};
use crate::domain::artifact::ScopedArtifact;
use crate::domain::formats::WebpageFormat;
use crate::domain::foundation::{OutputName, StateMachine};

/// Stages of the webpage conversation.
///
/// `ValidatingInput` is transient on the way in, but it is also the resting
/// stage after an invalid URL so the next message is validated directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlStage {
    AwaitingInput,
    ValidatingInput,
    ChoosingTarget,
    NamingOutput,
    Converting,
    AskingForMore,
    Terminated,
}

impl StateMachine for UrlStage {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use UrlStage::*;
        match self {
            AwaitingInput => vec![ValidatingInput, AwaitingInput, Terminated],
            ValidatingInput => vec![ChoosingTarget, ValidatingInput, AwaitingInput, Terminated],
            ChoosingTarget => vec![NamingOutput, ChoosingTarget, Terminated],
            NamingOutput => vec![Converting, NamingOutput, Terminated],
            Converting => vec![AskingForMore, Terminated],
            AskingForMore => vec![AwaitingInput, AskingForMore, Terminated],
            Terminated => vec![],
        }
    }
}

impl ConversationStage for UrlStage {
    fn initial() -> Self {
        UrlStage::AwaitingInput
    }

    fn terminated() -> Self {
        UrlStage::Terminated
    }

    fn is_transient(&self) -> bool {
        matches!(self, UrlStage::ValidatingInput | UrlStage::Converting)
    }

    fn all() -> &'static [Self] {
        use UrlStage::*;
        &[
            AwaitingInput,
            ValidatingInput,
            ChoosingTarget,
            NamingOutput,
            Converting,
            AskingForMore,
            Terminated,
        ]
    }
}

impl fmt::Display for UrlStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UrlStage::AwaitingInput => "awaiting_input",
            UrlStage::ValidatingInput => "validating_input",
            UrlStage::ChoosingTarget => "choosing_target",
            UrlStage::NamingOutput => "naming_output",
            UrlStage::Converting => "converting",
            UrlStage::AskingForMore => "asking_for_more",
            UrlStage::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Session data of the webpage conversation.
#[derive(Debug, Default)]
pub struct UrlSession {
    url: Option<Url>,
    requested_format: Option<WebpageFormat>,
    custom_name: Option<OutputName>,
}

impl UrlSession {
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    pub fn requested_format(&self) -> Option<WebpageFormat> {
        self.requested_format
    }

    pub fn custom_name(&self) -> Option<&OutputName> {
        self.custom_name.as_ref()
    }

    pub fn set_url(&mut self, url: Url) {
        self.url = Some(url);
    }

    pub fn set_requested_format(&mut self, format: WebpageFormat) {
        self.requested_format = Some(format);
    }

    pub fn set_custom_name(&mut self, name: OutputName) {
        self.custom_name = Some(name);
    }
}

impl ConversationSession for UrlSession {
    fn take_source(&mut self) -> Option<ScopedArtifact> {
        None
    }
}

/// Failures specific to the webpage conversation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlConversationError {
    #[error("the url {url} is invalid, please enter a valid url")]
    InvalidUrl { url: String },

    #[error("Unable to read {url}, please try a different url")]
    Unreadable { url: String },

    #[error("Error when converting URL {url} to target file format {format}")]
    ConversionFailed { url: String, format: WebpageFormat },
}

impl From<UrlConversationError> for StageError<UrlStage> {
    fn from(err: UrlConversationError) -> Self {
        match err {
            UrlConversationError::InvalidUrl { .. } | UrlConversationError::Unreadable { .. } => {
                StageError::validation(err.to_string(), UrlStage::ValidatingInput)
            }
            UrlConversationError::ConversionFailed { .. } => {
                StageError::conversion(err.to_string())
            }
        }
    }
}
