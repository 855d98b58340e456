//! Media-link conversation: stages, session data and errors.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use url::Url;

use super::error::StageError;
use super::stage::{ConversationSession, ConversationStage};
use crate::domain::artifact::ScopedArtifact;
use crate::domain::formats::MediaFormat;
use crate::domain::foundation::{OutputName, StateMachine};

/// Stages of the media-link conversation. There is no naming stage: the
/// output name is derived from the media title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaStage {
    AwaitingInput,
    ValidatingInput,
    ChoosingTarget,
    Converting,
    AskingForMore,
    Terminated,
}

impl StateMachine for MediaStage {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use MediaStage::*;
        match self {
            AwaitingInput => vec![ValidatingInput, AwaitingInput, Terminated],
            ValidatingInput => vec![ChoosingTarget, ValidatingInput, AwaitingInput, Terminated],
            ChoosingTarget => vec![Converting, ChoosingTarget, Terminated],
            Converting => vec![AskingForMore, Terminated],
            AskingForMore => vec![AwaitingInput, AskingForMore, Terminated],
            Terminated => vec![],
        }
    }
}

impl ConversationStage for MediaStage {
    fn initial() -> Self {
        MediaStage::AwaitingInput
    }

    fn terminated() -> Self {
        MediaStage::Terminated
    }

    fn is_transient(&self) -> bool {
        matches!(self, MediaStage::ValidatingInput | MediaStage::Converting)
    }

    fn all() -> &'static [Self] {
        use MediaStage::*;
        &[
            AwaitingInput,
            ValidatingInput,
            ChoosingTarget,
            Converting,
            AskingForMore,
            Terminated,
        ]
    }
}

impl fmt::Display for MediaStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MediaStage::AwaitingInput => "awaiting_input",
            MediaStage::ValidatingInput => "validating_input",
            MediaStage::ChoosingTarget => "choosing_target",
            MediaStage::Converting => "converting",
            MediaStage::AskingForMore => "asking_for_more",
            MediaStage::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// A media link that resolved to a playable resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaHandle {
    pub watch_url: Url,
    pub title: String,
}

impl MediaHandle {
    pub fn new(watch_url: Url, title: impl Into<String>) -> Self {
        Self {
            watch_url,
            title: title.into(),
        }
    }

    /// Output base name derived from the title.
    pub fn output_name(&self) -> OutputName {
        OutputName::from_title(&self.title)
    }
}

/// Session data of the media-link conversation.
#[derive(Debug, Default)]
pub struct MediaSession {
    media: Option<MediaHandle>,
    requested_format: Option<MediaFormat>,
}

impl MediaSession {
    pub fn media(&self) -> Option<&MediaHandle> {
        self.media.as_ref()
    }

    pub fn requested_format(&self) -> Option<MediaFormat> {
        self.requested_format
    }

    pub fn set_media(&mut self, media: MediaHandle) {
        self.media = Some(media);
    }

    pub fn set_requested_format(&mut self, format: MediaFormat) {
        self.requested_format = Some(format);
    }
}

impl ConversationSession for MediaSession {
    fn take_source(&mut self) -> Option<ScopedArtifact> {
        None
    }
}

/// Failures specific to the media-link conversation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaConversationError {
    #[error("URL {url} is not a valid YouTube video, Please enter again a valid URL")]
    InvalidMediaLink { url: String },

    #[error("Failed to download YouTube video {url} as {format}")]
    DownloadFailed { url: String, format: MediaFormat },
}

impl From<MediaConversationError> for StageError<MediaStage> {
    fn from(err: MediaConversationError) -> Self {
        match err {
            MediaConversationError::InvalidMediaLink { .. } => {
                StageError::validation(err.to_string(), MediaStage::ValidatingInput)
            }
            MediaConversationError::DownloadFailed { .. } => {
                StageError::conversion(err.to_string())
            }
        }
    }
}
