//! Webpage conversation: paste a URL, pick a format, name the result,
//! receive the rendered page.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;
use url::Url;

use super::common::{chosen_format, reprompt, reprompt_choice};
use crate::application::conversion::ConversionService;
use crate::application::engine::{transport_failure, ConversationFlow, YesNo};
use crate::application::messages::{yes_no, ASK_OUTPUT_NAME, FAREWELL};
use crate::domain::conversation::{
    ChatRef, ConversationSession, InboundEvent, StageError, StageResult, UrlConversationError,
    UrlSession, UrlStage,
};
use crate::domain::formats::{labels, FormatTag, WebpageSource};
use crate::domain::foundation::OutputName;
use crate::ports::{ConversionInput, MessagingGateway, ProbeError, UrlProbe, WebpageRoutes};

const ASK_FOR_URL: &str = "Please add here a URL you would like to convert into a file";
const SEND_URL_AS_TEXT: &str = "Please send the URL you would like to convert as a text message";
const OFFER_FORMATS: &str =
    "url can be formatted to the following file formats, please choose one of them";
const ASK_FOR_ANOTHER: &str = "Would you like to convert another url into a file?";

type Result<T> = std::result::Result<T, StageError<UrlStage>>;

/// Parses a user-typed URL, accepting only http and https.
pub fn parse_web_url(raw: &str) -> std::result::Result<Url, UrlConversationError> {
    let raw = raw.trim();
    let invalid = || UrlConversationError::InvalidUrl {
        url: raw.to_string(),
    };
    let url = Url::parse(raw).map_err(|_| invalid())?;
    match url.scheme() {
        "http" | "https" if url.host().is_some() => Ok(url),
        _ => Err(invalid()),
    }
}

/// Stage handlers of the webpage conversation.
pub struct UrlConversation {
    gateway: Arc<dyn MessagingGateway>,
    probe: Arc<dyn UrlProbe>,
    routes: Arc<WebpageRoutes>,
    conversions: ConversionService,
}

impl UrlConversation {
    pub fn new(
        gateway: Arc<dyn MessagingGateway>,
        probe: Arc<dyn UrlProbe>,
        routes: Arc<WebpageRoutes>,
        conversions: ConversionService,
    ) -> Self {
        Self {
            gateway,
            probe,
            routes,
            conversions,
        }
    }

    async fn ask_for_url(&self, chat: &ChatRef) -> Result<UrlStage> {
        self.gateway
            .prompt(chat.chat_id, ASK_FOR_URL, &[])
            .await
            .map_err(transport_failure::<UrlStage>)?;
        Ok(UrlStage::AwaitingInput)
    }

    async fn receive_url(&self, event: &InboundEvent) -> Result<UrlStage> {
        if event.answer().is_none() {
            reprompt(self.gateway.as_ref(), event, SEND_URL_AS_TEXT, &[]).await?;
            return Ok(UrlStage::AwaitingInput);
        }
        Ok(UrlStage::ValidatingInput)
    }

    async fn validate(&self, data: &mut UrlSession, event: &InboundEvent) -> Result<UrlStage> {
        let Some(raw) = event.answer() else {
            reprompt(self.gateway.as_ref(), event, SEND_URL_AS_TEXT, &[]).await?;
            return Ok(UrlStage::ValidatingInput);
        };

        let url = parse_web_url(raw)?;
        if let Err(e) = self.probe.probe(&url).await {
            let err = match e {
                ProbeError::HttpStatus(_) => UrlConversationError::Unreadable {
                    url: url.to_string(),
                },
                ProbeError::Unreachable(_) => UrlConversationError::InvalidUrl {
                    url: url.to_string(),
                },
            };
            return Err(StageError::from(err).with_cause(e));
        }

        data.set_url(url);
        let offered = labels(self.routes.equivalents(WebpageSource::Webpage));
        self.gateway
            .reply(&event.chat_ref(), OFFER_FORMATS, &offered)
            .await
            .map_err(transport_failure::<UrlStage>)?;
        Ok(UrlStage::ChoosingTarget)
    }

    async fn choose_target(&self, data: &mut UrlSession, event: &InboundEvent) -> Result<UrlStage> {
        let offered = self.routes.equivalents(WebpageSource::Webpage);
        let Some(target) = chosen_format(event, offered) else {
            reprompt_choice(self.gateway.as_ref(), event, offered).await?;
            return Ok(UrlStage::ChoosingTarget);
        };

        data.set_requested_format(target);
        self.gateway
            .prompt(event.chat_id, ASK_OUTPUT_NAME, &[])
            .await
            .map_err(transport_failure::<UrlStage>)?;
        Ok(UrlStage::NamingOutput)
    }

    async fn name_output(&self, data: &mut UrlSession, event: &InboundEvent) -> Result<UrlStage> {
        match event.answer().map(OutputName::parse) {
            Some(Ok(name)) => {
                data.set_custom_name(name);
                Ok(UrlStage::Converting)
            }
            Some(Err(e)) => {
                let text = format!("{e}. {ASK_OUTPUT_NAME}");
                reprompt(self.gateway.as_ref(), event, &text, &[]).await?;
                Ok(UrlStage::NamingOutput)
            }
            None => {
                reprompt(self.gateway.as_ref(), event, ASK_OUTPUT_NAME, &[]).await?;
                Ok(UrlStage::NamingOutput)
            }
        }
    }

    async fn convert(&self, data: &mut UrlSession, event: &InboundEvent) -> Result<UrlStage> {
        let (Some(url), Some(format), Some(name)) = (
            data.url().cloned(),
            data.requested_format(),
            data.custom_name().cloned(),
        ) else {
            return Err(StageError::configuration("converting with incomplete session data"));
        };

        let converter = self
            .routes
            .route(WebpageSource::Webpage, format)
            .map_err(|e| StageError::configuration(e.to_string()))?;

        let failed = |url: &Url| UrlConversationError::ConversionFailed {
            url: url.to_string(),
            format,
        };
        let output = self
            .conversions
            .convert(
                converter.as_ref(),
                &ConversionInput::Url(url.clone()),
                &name,
                format.extension(),
            )
            .await
            .map_err(|e| StageError::from(failed(&url)).with_cause(e))?;

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
            .map_err(transport_failure::<UrlStage>)?;
        Ok(UrlStage::AskingForMore)
    }

    async fn ask_for_more(&self, data: &mut UrlSession, event: &InboundEvent) -> Result<UrlStage> {
        match event.answer().and_then(YesNo::parse) {
            Some(YesNo::Yes) => {
                data.reset();
                self.ask_for_url(&event.chat_ref()).await
            }
            Some(YesNo::No) => {
                self.gateway
                    .edit(event.chat_id, FAREWELL)
                    .await
                    .map_err(transport_failure::<UrlStage>)?;
                Ok(UrlStage::Terminated)
            }
            None => {
                reprompt(self.gateway.as_ref(), event, ASK_FOR_ANOTHER, &yes_no()).await?;
                Ok(UrlStage::AskingForMore)
            }
        }
    }
}

#[async_trait]
impl ConversationFlow for UrlConversation {
    type Stage = UrlStage;
    type Data = UrlSession;

    fn name(&self) -> &'static str {
        "url"
    }

    async fn start(&self, chat: &ChatRef) -> StageResult<UrlStage> {
        self.ask_for_url(chat).await
    }

    async fn handle(
        &self,
        stage: UrlStage,
        data: &mut UrlSession,
        event: &InboundEvent,
    ) -> StageResult<UrlStage> {
        match stage {
            UrlStage::AwaitingInput => self.receive_url(event).await,
            UrlStage::ValidatingInput => self.validate(data, event).await,
            UrlStage::ChoosingTarget => self.choose_target(data, event).await,
            UrlStage::NamingOutput => self.name_output(data, event).await,
            UrlStage::Converting => self.convert(data, event).await,
            UrlStage::AskingForMore => self.ask_for_more(data, event).await,
            UrlStage::Terminated => Ok(UrlStage::Terminated),
        }
    }
}
