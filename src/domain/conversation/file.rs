//! File conversation: stages, session data and errors.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::error::StageError;
use super::stage::{ConversationSession, ConversationStage};
use crate::domain::artifact::ScopedArtifact;
use crate::domain::formats::FileFormat;
use crate::domain::foundation::{OutputName, StateMachine};

/// Stages of the file conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStage {
    /// Waiting for the user to upload a document or photo.
    AwaitingInput,
    /// Downloading and detecting the upload. Transient.
    ClassifyingInput,
    /// Waiting for a target format from the equivalents set.
    ChoosingTarget,
    /// Waiting for the output base name.
    NamingOutput,
    /// Running the routed conversion and delivering the result. Transient.
    Converting,
    /// Waiting for yes/no on converting another file.
    AskingForMore,
    Terminated,
}

impl StateMachine for FileStage {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use FileStage::*;
        match self {
            AwaitingInput => vec![ClassifyingInput, AwaitingInput, Terminated],
            ClassifyingInput => vec![ChoosingTarget, AwaitingInput, Terminated],
            ChoosingTarget => vec![NamingOutput, ChoosingTarget, Terminated],
            NamingOutput => vec![Converting, NamingOutput, Terminated],
            Converting => vec![AskingForMore, Terminated],
            AskingForMore => vec![AwaitingInput, AskingForMore, Terminated],
            Terminated => vec![],
        }
    }
}

impl ConversationStage for FileStage {
    fn initial() -> Self {
        FileStage::AwaitingInput
    }

    fn terminated() -> Self {
        FileStage::Terminated
    }

    fn is_transient(&self) -> bool {
        matches!(self, FileStage::ClassifyingInput | FileStage::Converting)
    }

    fn all() -> &'static [Self] {
        use FileStage::*;
        &[
            AwaitingInput,
            ClassifyingInput,
            ChoosingTarget,
            NamingOutput,
            Converting,
            AskingForMore,
            Terminated,
        ]
    }
}

impl fmt::Display for FileStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileStage::AwaitingInput => "awaiting_input",
            FileStage::ClassifyingInput => "classifying_input",
            FileStage::ChoosingTarget => "choosing_target",
            FileStage::NamingOutput => "naming_output",
            FileStage::Converting => "converting",
            FileStage::AskingForMore => "asking_for_more",
            FileStage::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// The downloaded upload.
#[derive(Debug)]
pub struct SourceDocument {
    artifact: ScopedArtifact,
    declared_name: Option<String>,
}

impl SourceDocument {
    pub fn new(artifact: ScopedArtifact, declared_name: Option<String>) -> Self {
        Self {
            artifact,
            declared_name,
        }
    }

    pub fn artifact(&self) -> &ScopedArtifact {
        &self.artifact
    }

    /// File name the user uploaded the document under, if any.
    pub fn declared_name(&self) -> Option<&str> {
        self.declared_name.as_deref()
    }

    pub fn into_artifact(self) -> ScopedArtifact {
        self.artifact
    }
}

/// Session data of the file conversation, filled in stage by stage.
#[derive(Debug, Default)]
pub struct FileSession {
    source: Option<SourceDocument>,
    source_format: Option<FileFormat>,
    requested_format: Option<FileFormat>,
    custom_name: Option<OutputName>,
}

impl FileSession {
    pub fn source(&self) -> Option<&SourceDocument> {
        self.source.as_ref()
    }

    pub fn source_format(&self) -> Option<FileFormat> {
        self.source_format
    }

    pub fn requested_format(&self) -> Option<FileFormat> {
        self.requested_format
    }

    pub fn custom_name(&self) -> Option<&OutputName> {
        self.custom_name.as_ref()
    }

    /// Stores a freshly downloaded upload, replacing (and deleting) any
    /// previous one.
    pub fn attach_source(&mut self, source: SourceDocument) {
        self.source = Some(source);
        self.source_format = None;
    }

    pub fn set_source_format(&mut self, format: FileFormat) {
        self.source_format = Some(format);
    }

    pub fn set_requested_format(&mut self, format: FileFormat) {
        self.requested_format = Some(format);
    }

    pub fn set_custom_name(&mut self, name: OutputName) {
        self.custom_name = Some(name);
    }
}

impl ConversationSession for FileSession {
    fn take_source(&mut self) -> Option<ScopedArtifact> {
        self.source.take().map(SourceDocument::into_artifact)
    }
}

/// Failures specific to the file conversation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileConversationError {
    #[error("file is of type {detected} and is not supported at the moment")]
    FileTypeNotSupported { detected: String },

    #[error("Unable to read the file you sent, please send it again")]
    DownloadFailed,

    #[error("The file is {size} bytes, files up to {limit} bytes can be converted, please send a smaller one")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Error when converting from source format {source_format} to target format {target_format}")]
    ConversionFailed {
        source_format: FileFormat,
        target_format: FileFormat,
    },
}

impl From<FileConversationError> for StageError<FileStage> {
    fn from(err: FileConversationError) -> Self {
        match err {
            FileConversationError::FileTypeNotSupported { .. } => {
                StageError::input_classification(err.to_string(), FileStage::AwaitingInput)
            }
            FileConversationError::DownloadFailed | FileConversationError::FileTooLarge { .. } => {
                StageError::validation(err.to_string(), FileStage::AwaitingInput)
            }
            FileConversationError::ConversionFailed { .. } => {
                StageError::conversion(err.to_string())
            }
        }
    }
}
