//! Media-link conversation: paste a video link, choose audio or video,
//! receive the download named after the video title.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;
use url::Url;

use super::common::{chosen_format, reprompt, reprompt_choice};
use crate::application::conversion::ConversionService;
use crate::application::engine::{transport_failure, ConversationFlow, YesNo};
use crate::application::messages::{yes_no, FAREWELL};
use crate::domain::conversation::{
    ChatRef, ConversationSession, InboundEvent, MediaConversationError, MediaSession, MediaStage,
    StageError, StageResult,
};
use crate::domain::formats::{labels, FormatTag, MediaSource};
use crate::ports::{ConversionInput, MediaResolver, MediaRoutes, MessagingGateway};

const ASK_FOR_LINK: &str = "Please enter the youtube URL";
const SEND_LINK_AS_TEXT: &str = "Please send the youtube URL as a text message";
const OFFER_FORMATS: &str = "Please choose in which format would you like to get the youtube video?";
const ASK_FOR_ANOTHER: &str = "Would you like to download another youtube video?";

type Result<T> = std::result::Result<T, StageError<MediaStage>>;

/// Stage handlers of the media-link conversation.
pub struct MediaConversation {
    gateway: Arc<dyn MessagingGateway>,
    resolver: Arc<dyn MediaResolver>,
    routes: Arc<MediaRoutes>,
    conversions: ConversionService,
}

impl MediaConversation {
    pub fn new(
        gateway: Arc<dyn MessagingGateway>,
        resolver: Arc<dyn MediaResolver>,
        routes: Arc<MediaRoutes>,
        conversions: ConversionService,
    ) -> Self {
        Self {
            gateway,
            resolver,
            routes,
            conversions,
        }
    }

    async fn ask_for_link(&self, chat: &ChatRef) -> Result<MediaStage> {
        self.gateway
            .prompt(chat.chat_id, ASK_FOR_LINK, &[])
            .await
            .map_err(transport_failure::<MediaStage>)?;
        Ok(MediaStage::AwaitingInput)
    }

    async fn receive_link(&self, event: &InboundEvent) -> Result<MediaStage> {
        if event.answer().is_none() {
            reprompt(self.gateway.as_ref(), event, SEND_LINK_AS_TEXT, &[]).await?;
            return Ok(MediaStage::AwaitingInput);
        }
        Ok(MediaStage::ValidatingInput)
    }

    async fn validate(&self, data: &mut MediaSession, event: &InboundEvent) -> Result<MediaStage> {
        let Some(raw) = event.answer() else {
            reprompt(self.gateway.as_ref(), event, SEND_LINK_AS_TEXT, &[]).await?;
            return Ok(MediaStage::ValidatingInput);
        };
        let raw = raw.trim();
        let invalid = || MediaConversationError::InvalidMediaLink {
            url: raw.to_string(),
        };

        let url = Url::parse(raw).map_err(|e| StageError::from(invalid()).with_cause(e))?;
        let media = self
            .resolver
            .resolve(&url)
            .await
            .map_err(|e| StageError::from(invalid()).with_cause(e))?;

        data.set_media(media);
        let offered = labels(self.routes.equivalents(MediaSource::Video));
        self.gateway
            .prompt(event.chat_id, OFFER_FORMATS, &offered)
            .await
            .map_err(transport_failure::<MediaStage>)?;
        Ok(MediaStage::ChoosingTarget)
    }

    async fn choose_target(
        &self,
        data: &mut MediaSession,
        event: &InboundEvent,
    ) -> Result<MediaStage> {
        let offered = self.routes.equivalents(MediaSource::Video);
        let Some(format) = chosen_format(event, offered) else {
            reprompt_choice(self.gateway.as_ref(), event, offered).await?;
            return Ok(MediaStage::ChoosingTarget);
        };

        data.set_requested_format(format);
        let text = format!("Please hang on while I am bring to you the video in {format} format...");
        self.gateway
            .edit(event.chat_id, &text)
            .await
            .map_err(transport_failure::<MediaStage>)?;
        Ok(MediaStage::Converting)
    }

    async fn download(&self, data: &mut MediaSession, event: &InboundEvent) -> Result<MediaStage> {
        let (Some(media), Some(format)) = (data.media().cloned(), data.requested_format()) else {
            return Err(StageError::configuration("downloading with incomplete session data"));
        };

        let converter = self
            .routes
            .route(MediaSource::Video, format)
            .map_err(|e| StageError::configuration(e.to_string()))?;

        let name = media.output_name();
        let url = media.watch_url.to_string();
        let output = self
            .conversions
            .convert(
                converter.as_ref(),
                &ConversionInput::Media(media),
                &name,
                format.extension(),
            )
            .await
            .map_err(|e| {
                StageError::from(MediaConversationError::DownloadFailed { url, format }).with_cause(e)
            })?;

        self.gateway
            .deliver_artifact(event.chat_id, output.path(), output.file_name())
            .await
            .map_err(|e| StageError::delivery(output.file_name()).with_cause(e))?;
        if let Err(e) = output.close() {
            warn!(error = %e, "Failed to delete delivered artifact");
        }

        self.gateway
            .prompt(event.chat_id, ASK_FOR_ANOTHER, &yes_no())
            .await
            .map_err(transport_failure::<MediaStage>)?;
        Ok(MediaStage::AskingForMore)
    }

    async fn ask_for_more(
        &self,
        data: &mut MediaSession,
        event: &InboundEvent,
    ) -> Result<MediaStage> {
        match event.answer().and_then(YesNo::parse) {
            Some(YesNo::Yes) => {
                data.reset();
                self.ask_for_link(&event.chat_ref()).await
            }
            Some(YesNo::No) => {
                self.gateway
                    .edit(event.chat_id, FAREWELL)
                    .await
                    .map_err(transport_failure::<MediaStage>)?;
                Ok(MediaStage::Terminated)
            }
            None => {
                reprompt(self.gateway.as_ref(), event, ASK_FOR_ANOTHER, &yes_no()).await?;
                Ok(MediaStage::AskingForMore)
            }
        }
    }
}

#[async_trait]
impl ConversationFlow for MediaConversation {
    type Stage = MediaStage;
    type Data = MediaSession;

    fn name(&self) -> &'static str {
        "media"
    }

    async fn start(&self, chat: &ChatRef) -> StageResult<MediaStage> {
        self.ask_for_link(chat).await
    }

    async fn handle(
        &self,
        stage: MediaStage,
        data: &mut MediaSession,
        event: &InboundEvent,
    ) -> StageResult<MediaStage> {
        match stage {
            MediaStage::AwaitingInput => self.receive_link(event).await,
            MediaStage::ValidatingInput => self.validate(data, event).await,
            MediaStage::ChoosingTarget => self.choose_target(data, event).await,
            MediaStage::Converting => self.download(data, event).await,
            MediaStage::AskingForMore => self.ask_for_more(data, event).await,
            MediaStage::Terminated => Ok(MediaStage::Terminated),
        }
    }
}
