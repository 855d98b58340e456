//! End-to-end conversation scenarios driven through the dispatcher with an
//! in-memory gateway, fake probes and real scoped artifacts.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use url::Url;

use mr_file_converter::adapters::gateway::Outgoing;
use mr_file_converter::adapters::{file_routes, RecordingGateway, TempArtifactFactory};
use mr_file_converter::application::{
    ConversionLimiter, ConversionService, ConversationKind, DispatchOutcome, Dispatcher,
    FileConversation, MediaConversation, UrlConversation,
};
use mr_file_converter::config::{ToolsConfig, DEFAULT_MAX_UPLOAD_BYTES};
use mr_file_converter::domain::conversation::{
    BotCommand, EventPayload, FileStage, InboundEvent, IncomingDocument, MediaHandle, MediaStage,
    UrlStage,
};
use mr_file_converter::domain::formats::{
    FileFormat, MediaFormat, MediaSource, WebpageFormat, WebpageSource,
};
use mr_file_converter::domain::foundation::{ChatId, MessageId};
use mr_file_converter::domain::routing::RoutingTable;
use mr_file_converter::ports::{
    ConversionInput, Converter, ConverterError, FileRoutes, MediaResolver, MediaRoutes,
    MessagingGateway, ProbeError, ResolveError, SharedConverter, UrlProbe, WebpageRoutes,
};

// =============================================================================
// Fakes
// =============================================================================

/// Writes fixed bytes to the output.
#[derive(Debug)]
struct WritingConverter(&'static [u8]);

#[async_trait]
impl Converter for WritingConverter {
    fn name(&self) -> &str {
        "writing"
    }

    async fn convert(&self, _input: &ConversionInput, output: &Path) -> Result<(), ConverterError> {
        tokio::fs::write(output, self.0).await?;
        Ok(())
    }
}

/// Fails after writing part of the output.
#[derive(Debug)]
struct FailingConverter;

#[async_trait]
impl Converter for FailingConverter {
    fn name(&self) -> &str {
        "failing"
    }

    async fn convert(&self, _input: &ConversionInput, output: &Path) -> Result<(), ConverterError> {
        tokio::fs::write(output, b"partial").await?;
        Err(ConverterError::ToolFailed {
            tool: "failing".to_string(),
            status: Some(1),
            stderr: "boom".to_string(),
        })
    }
}

/// Accepts only hosts listed as reachable.
struct FakeProbe {
    reachable: &'static str,
    calls: AtomicUsize,
}

#[async_trait]
impl UrlProbe for FakeProbe {
    async fn probe(&self, url: &Url) -> Result<(), ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if url.host_str() == Some(self.reachable) {
            Ok(())
        } else {
            Err(ProbeError::Unreachable(format!("no route to {url}")))
        }
    }
}

/// Resolves any youtube.com link to a fixed title.
struct FakeResolver;

#[async_trait]
impl MediaResolver for FakeResolver {
    async fn resolve(&self, url: &Url) -> Result<MediaHandle, ResolveError> {
        if url.host_str() == Some("www.youtube.com") {
            Ok(MediaHandle::new(url.clone(), "Never Gonna"))
        } else {
            Err(ResolveError::NotMedia {
                url: url.to_string(),
            })
        }
    }
}

// =============================================================================
// Harness
// =============================================================================

struct Harness {
    gateway: Arc<RecordingGateway>,
    dispatcher: Dispatcher,
    work_dir: TempDir,
    probe: Arc<FakeProbe>,
    next_message: AtomicUsize,
}

impl Harness {
    fn new() -> Self {
        Self::with_file_routes(file_routes(&ToolsConfig::default()).unwrap())
    }

    fn with_file_routes(files: FileRoutes) -> Self {
        Self::build(files, DEFAULT_MAX_UPLOAD_BYTES)
    }

    fn with_upload_limit(max_upload_bytes: u64) -> Self {
        Self::build(file_routes(&ToolsConfig::default()).unwrap(), max_upload_bytes)
    }

    fn build(files: FileRoutes, max_upload_bytes: u64) -> Self {
        let work_dir = TempDir::new().unwrap();
        let gateway = Arc::new(RecordingGateway::new());
        let shared: Arc<dyn MessagingGateway> = gateway.clone();

        let conversions = ConversionService::new(
            Arc::new(TempArtifactFactory::new(work_dir.path())),
            ConversionLimiter::new(2, Duration::from_secs(5), Duration::from_secs(5)),
        )
        .with_upload_limit(max_upload_bytes);

        let webpages: WebpageRoutes = RoutingTable::builder()
            .equivalents(WebpageSource::Webpage, [WebpageFormat::Pdf, WebpageFormat::Html])
            .route(
                WebpageSource::Webpage,
                WebpageFormat::Pdf,
                Arc::new(WritingConverter(b"%PDF-1.4")) as SharedConverter,
            )
            .route(
                WebpageSource::Webpage,
                WebpageFormat::Html,
                Arc::new(WritingConverter(b"<html></html>")) as SharedConverter,
            )
            .build()
            .unwrap();

        let media: MediaRoutes = RoutingTable::builder()
            .equivalents(MediaSource::Video, [MediaFormat::Mp3, MediaFormat::Mp4])
            .route(
                MediaSource::Video,
                MediaFormat::Mp3,
                Arc::new(WritingConverter(b"ID3")) as SharedConverter,
            )
            .route(MediaSource::Video, MediaFormat::Mp4, Arc::new(FailingConverter) as SharedConverter)
            .build()
            .unwrap();

        let probe = Arc::new(FakeProbe {
            reachable: "example.com",
            calls: AtomicUsize::new(0),
        });

        let dispatcher = Dispatcher::new(
            shared.clone(),
            FileConversation::new(shared.clone(), Arc::new(files), conversions.clone()),
            UrlConversation::new(shared.clone(), probe.clone(), Arc::new(webpages), conversions.clone()),
            MediaConversation::new(shared, Arc::new(FakeResolver), Arc::new(media), conversions),
        );

        Self {
            gateway,
            dispatcher,
            work_dir,
            probe,
            next_message: AtomicUsize::new(1),
        }
    }

    fn event(&self, chat: ChatId, payload: EventPayload) -> InboundEvent {
        let id = self.next_message.fetch_add(1, Ordering::SeqCst) as i64;
        InboundEvent::new(chat, MessageId::new(id), payload)
    }

    async fn send(&self, chat: ChatId, payload: EventPayload) -> DispatchOutcome {
        let event = self.event(chat, payload);
        self.dispatcher.handle(&event).await
    }

    async fn say(&self, chat: ChatId, text: &str) -> DispatchOutcome {
        self.send(chat, EventPayload::from_text(text)).await
    }

    async fn upload(&self, chat: ChatId, name: &str, content: &[u8]) -> DispatchOutcome {
        let file_id = format!("doc-{name}");
        self.gateway.add_document(file_id.clone(), content.to_vec());
        self.send(
            chat,
            EventPayload::Document(IncomingDocument {
                file_id,
                file_name: Some(name.to_string()),
                size_bytes: Some(content.len() as u64),
            }),
        )
        .await
    }

    async fn file_state(&self, chat: ChatId) -> Option<(FileStage, Option<FileFormat>, bool)> {
        self.dispatcher
            .inspect(chat, |active| {
                active.and_then(|c| c.as_file()).map(|session| {
                    (
                        session.stage(),
                        session.data().source_format(),
                        session.data().source().is_some(),
                    )
                })
            })
            .await
    }

    async fn url_state(&self, chat: ChatId) -> Option<(UrlStage, Option<String>)> {
        self.dispatcher
            .inspect(chat, |active| {
                active
                    .and_then(|c| c.as_url())
                    .map(|session| (session.stage(), session.data().url().map(Url::to_string)))
            })
            .await
    }

    async fn media_stage(&self, chat: ChatId) -> Option<MediaStage> {
        self.dispatcher
            .inspect(chat, |active| active.and_then(|c| c.as_media()).map(|s| s.stage()))
            .await
    }

    /// Artifact directories currently alive under the work dir.
    fn live_artifacts(&self) -> usize {
        std::fs::read_dir(self.work_dir.path())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

fn chat(id: i64) -> ChatId {
    ChatId::new(id)
}

// =============================================================================
// File conversation
// =============================================================================

#[tokio::test]
async fn json_upload_is_converted_to_named_yml() {
    let h = Harness::new();
    let c = chat(1);

    assert_eq!(h.say(c, "/convert").await, DispatchOutcome::Started(ConversationKind::File));
    h.upload(c, "data.json", br#"{"name": "demo", "tags": ["a", "b"]}"#).await;

    let (stage, format, has_source) = h.file_state(c).await.unwrap();
    assert_eq!(stage, FileStage::ChoosingTarget);
    assert_eq!(format, Some(FileFormat::Json));
    assert!(has_source);

    let offer = h.gateway.last(c).unwrap();
    assert!(offer.is_reply());
    assert_eq!(offer.choices(), ["yml", "text", "xml"]);

    h.send(c, EventPayload::Choice("yml".to_string())).await;
    h.say(c, "out").await;

    let deliveries = h.gateway.deliveries(c);
    assert_eq!(deliveries.len(), 1);
    let Outgoing::Delivery {
        display_name,
        content,
        ..
    } = &deliveries[0]
    else {
        panic!("expected a delivery");
    };
    assert_eq!(display_name, "out.yml");
    let yaml = String::from_utf8(content.clone()).unwrap();
    assert!(yaml.contains("name: demo"), "{yaml}");

    let (stage, _, has_source) = h.file_state(c).await.unwrap();
    assert_eq!(stage, FileStage::AskingForMore);
    assert!(!has_source);
    assert_eq!(h.live_artifacts(), 0);
}

#[tokio::test]
async fn unsupported_upload_returns_to_awaiting_input_without_format() {
    let h = Harness::new();
    let c = chat(2);

    h.say(c, "/convert").await;
    h.upload(c, "drawing.dxf", b"0\nSECTION\n2\nHEADER\n0\nENDSEC\n0\nEOF\n").await;

    let (stage, format, has_source) = h.file_state(c).await.unwrap();
    assert_eq!(stage, FileStage::AwaitingInput);
    assert_eq!(format, None);
    assert!(!has_source);

    let reply = h.gateway.last(c).unwrap();
    assert!(reply.is_reply());
    assert!(reply.text().unwrap().contains("not supported"));
    assert_eq!(h.live_artifacts(), 0);
}

#[tokio::test]
async fn answering_yes_resets_the_session_for_another_file() {
    let h = Harness::new();
    let c = chat(3);

    h.say(c, "/convert").await;
    h.upload(c, "data.json", br#"{"a": 1}"#).await;
    h.send(c, EventPayload::Choice("xml".to_string())).await;
    h.say(c, "again").await;
    assert_eq!(h.file_state(c).await.unwrap().0, FileStage::AskingForMore);

    h.say(c, "yes").await;

    let active = h
        .dispatcher
        .inspect(c, |active| {
            let session = active.and_then(|c| c.as_file()).unwrap();
            (
                session.stage(),
                session.data().source_format(),
                session.data().requested_format(),
                session.data().custom_name().cloned(),
            )
        })
        .await;
    assert_eq!(active, (FileStage::AwaitingInput, None, None, None));
}

#[tokio::test]
async fn answering_no_ends_the_conversation_and_frees_the_chat() {
    let h = Harness::new();
    let c = chat(4);

    h.say(c, "/convert").await;
    h.upload(c, "data.json", br#"{"a": 1}"#).await;
    h.send(c, EventPayload::Choice("text".to_string())).await;
    h.say(c, "plain").await;

    assert_eq!(h.say(c, "no").await, DispatchOutcome::Finished(ConversationKind::File));
    assert!(matches!(h.gateway.last(c), Some(Outgoing::Edit { .. })));
    assert!(h.file_state(c).await.is_none());
    assert_eq!(h.say(c, "hello?").await, DispatchOutcome::Ignored);
}

#[tokio::test]
async fn failed_conversion_sends_error_and_closing_message_then_cleans_up() {
    let files: FileRoutes = RoutingTable::builder()
        .equivalents(FileFormat::Json, [FileFormat::Yml])
        .route(FileFormat::Json, FileFormat::Yml, Arc::new(FailingConverter) as SharedConverter)
        .build()
        .unwrap();
    let h = Harness::with_file_routes(files);
    let c = chat(5);

    h.say(c, "/convert").await;
    h.upload(c, "data.json", br#"{"a": 1}"#).await;
    h.send(c, EventPayload::Choice("yml".to_string())).await;
    assert_eq!(h.live_artifacts(), 1);

    h.gateway.clear();
    let outcome = h.say(c, "out").await;

    assert_eq!(outcome, DispatchOutcome::Finished(ConversationKind::File));
    let sent = h.gateway.sent_to(c);
    assert_eq!(sent.len(), 2, "{sent:?}");
    assert!(sent[0]
        .text()
        .unwrap()
        .contains("Error when converting from source format json to target format yml"));
    assert!(sent[1].text().unwrap().contains("/convert"));
    assert!(h.gateway.deliveries(c).is_empty());
    assert_eq!(h.live_artifacts(), 0);
}

#[tokio::test]
async fn malformed_answers_reprompt_in_place() {
    let h = Harness::new();
    let c = chat(6);

    h.say(c, "/convert").await;
    h.say(c, "this is not a file").await;
    assert_eq!(h.file_state(c).await.unwrap().0, FileStage::AwaitingInput);

    h.upload(c, "data.json", br#"{"a": 1}"#).await;
    h.say(c, "docx").await;
    assert_eq!(h.file_state(c).await.unwrap().0, FileStage::ChoosingTarget);
    let reprompt = h.gateway.last(c).unwrap();
    assert!(reprompt.is_reply());
    assert_eq!(reprompt.choices(), ["yml", "text", "xml"]);

    h.send(c, EventPayload::Choice("yml".to_string())).await;
    h.say(c, "../escape").await;
    assert_eq!(h.file_state(c).await.unwrap().0, FileStage::NamingOutput);
    assert!(h.gateway.deliveries(c).is_empty());
}

#[tokio::test]
async fn oversized_upload_is_refused_before_download() {
    let h = Harness::with_upload_limit(16);
    let c = chat(7);

    h.say(c, "/convert").await;
    h.upload(c, "data.json", br#"{"name": "far too long for the limit"}"#).await;

    let (stage, format, has_source) = h.file_state(c).await.unwrap();
    assert_eq!(stage, FileStage::AwaitingInput);
    assert_eq!(format, None);
    assert!(!has_source);
    let reply = h.gateway.last(c).unwrap();
    assert!(reply.is_reply());
    assert!(reply.text().unwrap().contains("files up to 16 bytes"));
    assert_eq!(h.live_artifacts(), 0);

    h.upload(c, "small.json", br#"{"a": 1}"#).await;
    assert_eq!(h.file_state(c).await.unwrap().0, FileStage::ChoosingTarget);
}

#[tokio::test]
async fn upload_without_declared_size_is_capped_by_the_gateway() {
    let h = Harness::with_upload_limit(16);
    let c = chat(8);
    h.gateway
        .add_document("doc-undeclared", br#"{"name": "far too long for the limit"}"#.to_vec());

    h.say(c, "/convert").await;
    h.send(
        c,
        EventPayload::Document(IncomingDocument {
            file_id: "doc-undeclared".to_string(),
            file_name: Some("data.json".to_string()),
            size_bytes: None,
        }),
    )
    .await;

    let (stage, _, has_source) = h.file_state(c).await.unwrap();
    assert_eq!(stage, FileStage::AwaitingInput);
    assert!(!has_source);
    assert!(h.gateway.last(c).unwrap().text().unwrap().contains("files up to 16 bytes"));
    assert_eq!(h.live_artifacts(), 0);
}

#[tokio::test]
async fn html_page_with_leading_comment_offers_html_targets() {
    let h = Harness::new();
    let c = chat(9);

    h.say(c, "/convert").await;
    h.upload(
        c,
        "saved.html",
        b"<!-- saved from url=(0022)https://example.com -->\n<!DOCTYPE html>\n<html><body>hi</body></html>",
    )
    .await;

    let (stage, format, _) = h.file_state(c).await.unwrap();
    assert_eq!(stage, FileStage::ChoosingTarget);
    assert_eq!(format, Some(FileFormat::Html));
    assert_eq!(h.gateway.last(c).unwrap().choices(), ["pdf", "png", "jpg"]);
}

// =============================================================================
// Webpage conversation
// =============================================================================

#[tokio::test]
async fn invalid_urls_retry_in_place_until_a_valid_one_arrives() {
    let h = Harness::new();
    let c = chat(10);

    h.say(c, "/url").await;
    for bad in ["https://nowhere.invalid/a", "https://nowhere.invalid/b", "not a url"] {
        h.say(c, bad).await;
        let (stage, url) = h.url_state(c).await.unwrap();
        assert_eq!(stage, UrlStage::ValidatingInput);
        assert_eq!(url, None);
        let reply = h.gateway.last(c).unwrap();
        assert!(reply.is_reply(), "{reply:?}");
    }

    h.say(c, "https://example.com/page").await;
    let (stage, url) = h.url_state(c).await.unwrap();
    assert_eq!(stage, UrlStage::ChoosingTarget);
    assert_eq!(url.as_deref(), Some("https://example.com/page"));
    assert_eq!(h.probe.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn webpage_is_rendered_under_the_chosen_name() {
    let h = Harness::new();
    let c = chat(11);

    h.say(c, "/url").await;
    h.say(c, "https://example.com").await;
    h.send(c, EventPayload::Choice("pdf".to_string())).await;
    h.say(c, "report").await;

    let deliveries = h.gateway.deliveries(c);
    assert_eq!(deliveries.len(), 1);
    assert!(matches!(
        &deliveries[0],
        Outgoing::Delivery { display_name, content, .. }
            if display_name == "report.pdf" && content.starts_with(b"%PDF")
    ));
    assert_eq!(h.url_state(c).await.unwrap().0, UrlStage::AskingForMore);
}

// =============================================================================
// Media conversation
// =============================================================================

#[tokio::test]
async fn media_link_is_downloaded_as_mp3() {
    let h = Harness::new();
    let c = chat(20);

    h.say(c, "/youtube").await;
    h.say(c, "https://vimeo.com/123").await;
    assert_eq!(h.media_stage(c).await, Some(MediaStage::ValidatingInput));

    h.say(c, "https://www.youtube.com/watch?v=dQw4w9WgXcQ").await;
    assert_eq!(h.media_stage(c).await, Some(MediaStage::ChoosingTarget));

    h.send(c, EventPayload::Choice("mp3".to_string())).await;
    let deliveries = h.gateway.deliveries(c);
    assert_eq!(deliveries.len(), 1);
    assert!(matches!(
        &deliveries[0],
        Outgoing::Delivery { display_name, .. } if display_name == "Never Gonna.mp3"
    ));
    assert_eq!(h.media_stage(c).await, Some(MediaStage::AskingForMore));
}

#[tokio::test]
async fn failed_media_download_terminates() {
    let h = Harness::new();
    let c = chat(21);

    h.say(c, "/youtube").await;
    h.say(c, "https://www.youtube.com/watch?v=dQw4w9WgXcQ").await;
    let outcome = h.send(c, EventPayload::Choice("mp4".to_string())).await;

    assert_eq!(outcome, DispatchOutcome::Finished(ConversationKind::Media));
    assert!(h
        .gateway
        .texts(c)
        .iter()
        .any(|t| t.contains("Failed to download YouTube video")));
    assert_eq!(h.live_artifacts(), 0);
}

// =============================================================================
// Dispatcher behaviour
// =============================================================================

#[tokio::test]
async fn cancel_ends_the_conversation_and_deletes_the_upload() {
    let h = Harness::new();
    let c = chat(30);

    h.say(c, "/convert").await;
    h.upload(c, "data.json", br#"{"a": 1}"#).await;
    assert_eq!(h.live_artifacts(), 1);

    h.send(c, EventPayload::Command(BotCommand::Cancel)).await;
    assert!(h.file_state(c).await.is_none());
    assert_eq!(h.live_artifacts(), 0);
    assert!(h.gateway.last(c).unwrap().text().unwrap().contains("/convert"));
}

#[tokio::test]
async fn exit_keyword_cancels_like_the_command() {
    let h = Harness::new();
    let c = chat(31);

    h.say(c, "/url").await;
    assert_eq!(h.say(c, "exit").await, DispatchOutcome::Finished(ConversationKind::Url));
    assert!(h.url_state(c).await.is_none());
}

#[tokio::test]
async fn entry_command_replaces_an_active_conversation() {
    let h = Harness::new();
    let c = chat(32);

    h.say(c, "/convert").await;
    h.upload(c, "data.json", br#"{"a": 1}"#).await;
    assert_eq!(h.live_artifacts(), 1);

    assert_eq!(h.say(c, "/url").await, DispatchOutcome::Started(ConversationKind::Url));
    assert!(h.file_state(c).await.is_none());
    assert_eq!(h.url_state(c).await.unwrap().0, UrlStage::AwaitingInput);
    assert_eq!(h.live_artifacts(), 0);
}

#[tokio::test]
async fn help_is_answered_without_touching_the_conversation() {
    let h = Harness::new();
    let c = chat(33);

    h.say(c, "/convert").await;
    assert_eq!(h.say(c, "/help").await, DispatchOutcome::Help);
    assert_eq!(h.file_state(c).await.unwrap().0, FileStage::AwaitingInput);
    assert!(h.gateway.last(c).unwrap().text().unwrap().contains("/youtube"));
}

#[tokio::test]
async fn text_without_a_conversation_is_ignored() {
    let h = Harness::new();
    let c = chat(34);

    assert_eq!(h.say(c, "hello").await, DispatchOutcome::Ignored);
    assert_eq!(h.say(c, "/cancel").await, DispatchOutcome::Ignored);
    assert!(h.gateway.sent_to(c).is_empty());
    assert!(h.dispatcher.sessions().is_empty().await);
}

#[tokio::test]
async fn chats_progress_independently() {
    let h = Arc::new(Harness::new());
    let (a, b) = (chat(40), chat(41));

    h.say(a, "/convert").await;
    h.say(b, "/url").await;

    let (first, second) = tokio::join!(
        h.upload(a, "data.json", br#"{"a": 1}"#),
        h.say(b, "https://example.com"),
    );
    assert!(matches!(first, DispatchOutcome::Continued { .. }));
    assert!(matches!(second, DispatchOutcome::Continued { .. }));

    assert_eq!(h.file_state(a).await.unwrap().0, FileStage::ChoosingTarget);
    assert_eq!(h.url_state(b).await.unwrap().0, UrlStage::ChoosingTarget);
    assert!(h.gateway.sent_to(a).iter().all(|m| m.chat() == a));
    assert_eq!(h.dispatcher.sessions().len().await, 2);
}

#[tokio::test]
async fn idle_conversations_are_evicted_and_cleaned_up() {
    let h = Harness::new();
    let c = chat(50);

    h.say(c, "/convert").await;
    h.upload(c, "data.json", br#"{"a": 1}"#).await;
    assert_eq!(h.live_artifacts(), 1);

    assert_eq!(h.dispatcher.evict_idle(chrono::Duration::hours(1)).await, 0);
    assert_eq!(h.dispatcher.evict_idle(chrono::Duration::zero()).await, 1);
    assert!(h.file_state(c).await.is_none());
    assert_eq!(h.live_artifacts(), 0);
}
