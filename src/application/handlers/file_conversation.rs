//! File conversation: upload a document, pick a target format, name the
//! result, receive the converted file.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::common::{chosen_format, reprompt, reprompt_choice};
use crate::application::conversion::ConversionService;
use crate::application::engine::{transport_failure, ConversationFlow, YesNo};
use crate::application::messages::{yes_no, ASK_OUTPUT_NAME, FAREWELL};
use crate::domain::conversation::{
    ChatRef, ConversationSession, FileConversationError, FileSession, FileStage, InboundEvent,
    SourceDocument, StageError, StageResult,
};
use crate::domain::detection::{Detection, FormatDetector};
use crate::domain::formats::{labels, FormatTag};
use crate::domain::foundation::OutputName;
use crate::ports::{ConversionInput, FileRoutes, GatewayError, MessagingGateway};

const ASK_FOR_FILE: &str = "Please add here a file you would like to convert.";
const SEND_AS_DOCUMENT: &str = "Please send the file you would like to convert as a document.";
const ASK_FOR_ANOTHER: &str = "Would you like to convert another file?";
/// Base name of the stored upload; the declared name is kept separately.
const SOURCE_BASE_NAME: &str = "source";
const UNKNOWN_SUFFIX: &str = "bin";

type Result<T> = std::result::Result<T, StageError<FileStage>>;

/// Stage handlers of the file conversation.
pub struct FileConversation {
    gateway: Arc<dyn MessagingGateway>,
    detector: FormatDetector,
    routes: Arc<FileRoutes>,
    conversions: ConversionService,
}

impl FileConversation {
    pub fn new(
        gateway: Arc<dyn MessagingGateway>,
        routes: Arc<FileRoutes>,
        conversions: ConversionService,
    ) -> Self {
        Self {
            gateway,
            detector: FormatDetector::new(),
            routes,
            conversions,
        }
    }

    async fn ask_for_file(&self, chat: &ChatRef) -> Result<FileStage> {
        self.gateway
            .prompt(chat.chat_id, ASK_FOR_FILE, &[])
            .await
            .map_err(transport_failure::<FileStage>)?;
        Ok(FileStage::AwaitingInput)
    }

    /// Downloads the uploaded document into a scoped artifact.
    async fn receive_upload(&self, data: &mut FileSession, event: &InboundEvent) -> Result<FileStage> {
        let Some(document) = event.document() else {
            reprompt(self.gateway.as_ref(), event, SEND_AS_DOCUMENT, &[]).await?;
            return Ok(FileStage::AwaitingInput);
        };

        let limit = self.conversions.max_upload_bytes();
        if let Some(size) = document.size_bytes.filter(|size| *size > limit) {
            return Err(FileConversationError::FileTooLarge { size, limit }.into());
        }

        let suffix = document
            .file_name
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or_else(|| UNKNOWN_SUFFIX.to_string());

        let artifact = self
            .conversions
            .artifacts()
            .create(SOURCE_BASE_NAME, &suffix)
            .map_err(|e| StageError::from(FileConversationError::DownloadFailed).with_cause(e))?;

        let written = self
            .gateway
            .download_document(document, artifact.path(), limit)
            .await
            .map_err(|e| match e {
                GatewayError::TooLarge { size, limit } => {
                    StageError::from(FileConversationError::FileTooLarge { size, limit })
                }
                other => StageError::from(FileConversationError::DownloadFailed).with_cause(other),
            })?;
        debug!(file_id = %document.file_id, bytes = written, "Upload stored");

        data.attach_source(SourceDocument::new(artifact, document.file_name.clone()));
        Ok(FileStage::ClassifyingInput)
    }

    async fn classify(&self, data: &mut FileSession, event: &InboundEvent) -> Result<FileStage> {
        let Some(source) = data.source() else {
            return Err(StageError::configuration("classifying without a source document"));
        };

        let content = tokio::fs::read(source.artifact().path())
            .await
            .map_err(|e| StageError::from(FileConversationError::DownloadFailed).with_cause(e))?;

        let format = match self.detector.detect(&content, source.declared_name()) {
            Detection::Supported(format) if !self.routes.equivalents(format).is_empty() => format,
            Detection::Supported(format) => {
                return Err(FileConversationError::FileTypeNotSupported {
                    detected: format.to_string(),
                }
                .into())
            }
            Detection::Unsupported { sniffed } => {
                return Err(FileConversationError::FileTypeNotSupported {
                    detected: sniffed.to_string(),
                }
                .into())
            }
        };

        data.set_source_format(format);
        let text = format!(
            "The type of the file is {format}, It can be converted to the following types, \
             please choose one of the types to convert into."
        );
        self.gateway
            .reply(&event.chat_ref(), &text, &labels(self.routes.equivalents(format)))
            .await
            .map_err(transport_failure::<FileStage>)?;
        Ok(FileStage::ChoosingTarget)
    }

    async fn choose_target(&self, data: &mut FileSession, event: &InboundEvent) -> Result<FileStage> {
        let Some(source_format) = data.source_format() else {
            return Err(StageError::configuration("choosing a target without a source format"));
        };
        let offered = self.routes.equivalents(source_format);

        let Some(target) = chosen_format(event, offered) else {
            reprompt_choice(self.gateway.as_ref(), event, offered).await?;
            return Ok(FileStage::ChoosingTarget);
        };

        data.set_requested_format(target);
        self.gateway
            .prompt(event.chat_id, ASK_OUTPUT_NAME, &[])
            .await
            .map_err(transport_failure::<FileStage>)?;
        Ok(FileStage::NamingOutput)
    }

    async fn name_output(&self, data: &mut FileSession, event: &InboundEvent) -> Result<FileStage> {
        match event.answer().map(OutputName::parse) {
            Some(Ok(name)) => {
                data.set_custom_name(name);
                Ok(FileStage::Converting)
            }
            Some(Err(e)) => {
                let text = format!("{e}. {ASK_OUTPUT_NAME}");
                reprompt(self.gateway.as_ref(), event, &text, &[]).await?;
                Ok(FileStage::NamingOutput)
            }
            None => {
                reprompt(self.gateway.as_ref(), event, ASK_OUTPUT_NAME, &[]).await?;
                Ok(FileStage::NamingOutput)
            }
        }
    }

    async fn convert(&self, data: &mut FileSession, event: &InboundEvent) -> Result<FileStage> {
        let (Some(source_format), Some(target_format), Some(name), Some(source)) = (
            data.source_format(),
            data.requested_format(),
            data.custom_name().cloned(),
            data.source(),
        ) else {
            return Err(StageError::configuration("converting with incomplete session data"));
        };
        let source_path: PathBuf = source.artifact().path().to_path_buf();

        let converter = self
            .routes
            .route(source_format, target_format)
            .map_err(|e| StageError::configuration(e.to_string()))?;

        let output = self
            .conversions
            .convert(
                converter.as_ref(),
                &ConversionInput::File(source_path),
                &name,
                target_format.extension(),
            )
            .await
            .map_err(|e| {
                StageError::from(FileConversationError::ConversionFailed {
                    source_format,
                    target_format,
                })
                .with_cause(e)
            })?;

        self.gateway
            .deliver_artifact(event.chat_id, output.path(), output.file_name())
            .await
            .map_err(|e| StageError::delivery(output.file_name()).with_cause(e))?;

        if let Err(e) = output.close() {
            warn!(error = %e, "Failed to delete delivered artifact");
        }
        if let Some(source) = data.take_source() {
            if let Err(e) = source.close() {
                warn!(error = %e, "Failed to delete source artifact");
            }
        }

        self.gateway
            .prompt(event.chat_id, ASK_FOR_ANOTHER, &yes_no())
            .await
            .map_err(transport_failure::<FileStage>)?;
        Ok(FileStage::AskingForMore)
    }

    async fn ask_for_more(&self, data: &mut FileSession, event: &InboundEvent) -> Result<FileStage> {
        match event.answer().and_then(YesNo::parse) {
            Some(YesNo::Yes) => {
                data.reset();
                self.ask_for_file(&event.chat_ref()).await
            }
            Some(YesNo::No) => {
                self.gateway
                    .edit(event.chat_id, FAREWELL)
                    .await
                    .map_err(transport_failure::<FileStage>)?;
                Ok(FileStage::Terminated)
            }
            None => {
                reprompt(self.gateway.as_ref(), event, ASK_FOR_ANOTHER, &yes_no()).await?;
                Ok(FileStage::AskingForMore)
            }
        }
    }
}

#[async_trait]
impl ConversationFlow for FileConversation {
    type Stage = FileStage;
    type Data = FileSession;

    fn name(&self) -> &'static str {
        "file"
    }

    async fn start(&self, chat: &ChatRef) -> StageResult<FileStage> {
        self.ask_for_file(chat).await
    }

    async fn handle(
        &self,
        stage: FileStage,
        data: &mut FileSession,
        event: &InboundEvent,
    ) -> StageResult<FileStage> {
        match stage {
            FileStage::AwaitingInput => self.receive_upload(data, event).await,
            FileStage::ClassifyingInput => self.classify(data, event).await,
            FileStage::ChoosingTarget => self.choose_target(data, event).await,
            FileStage::NamingOutput => self.name_output(data, event).await,
            FileStage::Converting => self.convert(data, event).await,
            FileStage::AskingForMore => self.ask_for_more(data, event).await,
            FileStage::Terminated => Ok(FileStage::Terminated),
        }
    }
}
