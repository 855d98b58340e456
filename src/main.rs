//! Console front end for the converter bot.
//!
//! Reads one message per line from stdin (`/command`, `@path/to/upload` or
//! plain text) and writes the bot's replies to stdout. Delivered files land
//! in the `outbox` directory under the configured work dir.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use mr_file_converter::adapters::{
    build_http_client, file_routes, media_routes, parse_console_line, webpage_routes,
    ConsoleGateway, HttpUrlProbe, TempArtifactFactory, YtDlpResolver,
};
use mr_file_converter::application::{
    ConversionLimiter, ConversionService, Dispatcher, FileConversation, MediaConversation,
    UrlConversation,
};
use mr_file_converter::config::AppConfig;
use mr_file_converter::domain::foundation::{ChatId, MessageId};
use mr_file_converter::ports::MessagingGateway;
use mr_file_converter::telemetry::init_tracing;

/// The console hosts a single chat.
const CONSOLE_CHAT: i64 = 1;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    init_tracing(&config.logging)?;

    info!(
        work_dir = %config.storage.work_dir.display(),
        max_concurrent = config.conversion.max_concurrent,
        "Starting mr-file-converter"
    );

    tokio::fs::create_dir_all(&config.storage.work_dir)
        .await
        .context("Failed to create work directory")?;
    let outbox = config.storage.work_dir.join("outbox");

    let http = build_http_client(&config.network).context("Failed to build HTTP client")?;
    let artifacts = Arc::new(TempArtifactFactory::new(&config.storage.work_dir));
    let conversions = ConversionService::new(
        artifacts,
        ConversionLimiter::from_config(&config.conversion),
    )
    .with_upload_limit(config.conversion.max_upload_bytes);

    let files = Arc::new(file_routes(&config.tools).context("Invalid file routes")?);
    let webpages =
        Arc::new(webpage_routes(&config.tools, http.clone()).context("Invalid webpage routes")?);
    let media = Arc::new(media_routes(&config.tools).context("Invalid media routes")?);

    let gateway: Arc<dyn MessagingGateway> = Arc::new(ConsoleGateway::stdout(outbox));
    let dispatcher = Arc::new(Dispatcher::new(
        gateway.clone(),
        FileConversation::new(gateway.clone(), files, conversions.clone()),
        UrlConversation::new(
            gateway.clone(),
            Arc::new(HttpUrlProbe::new(http)),
            webpages,
            conversions.clone(),
        ),
        MediaConversation::new(
            gateway.clone(),
            Arc::new(YtDlpResolver::new(config.tools.yt_dlp.clone())),
            media,
            conversions,
        ),
    ));

    let eviction = {
        let dispatcher = dispatcher.clone();
        let idle = chrono::Duration::from_std(config.session.idle_timeout())
            .context("Idle timeout out of range")?;
        let mut ticker = tokio::time::interval(config.session.eviction_interval());
        tokio::spawn(async move {
            loop {
                ticker.tick().await;
                let evicted = dispatcher.evict_idle(idle).await;
                if evicted > 0 {
                    info!(evicted, "Evicted idle conversations");
                }
            }
        })
    };

    let chat = ChatId::new(CONSOLE_CHAT);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut message_id = 0;
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        message_id += 1;
        let Some(event) = parse_console_line(chat, MessageId::new(message_id), &line) else {
            continue;
        };
        let outcome = dispatcher.handle(&event).await;
        debug!(?outcome, "Event dispatched");
    }

    eviction.abort();
    dispatcher.evict_idle(chrono::Duration::zero()).await;
    info!("Input closed, shutting down");
    Ok(())
}
