//! Route tables wiring format pairs to concrete converters.
//!
//! Each builder declares the targets offered per source (in button order)
//! and one converter per pair; `RoutingTable::build` rejects any mismatch
//! between the two, so a bad declaration fails at startup.

use std::sync::Arc;

use super::external_tool::ExternalToolConverter;
use super::structured::{DataFormat, StructuredDataConverter};
use super::webpage::WebpageHtmlFetcher;
use crate::config::ToolsConfig;
use crate::domain::formats::{FileFormat, MediaFormat, MediaSource, WebpageFormat, WebpageSource};
use crate::domain::routing::{RoutingError, RoutingTable};
use crate::ports::{FileRoutes, MediaRoutes, SharedConverter, WebpageRoutes};

fn structured(source: DataFormat, target: DataFormat) -> SharedConverter {
    Arc::new(StructuredDataConverter::new(source, target))
}

fn tool(name: &str, program: &str, args: &[&str]) -> SharedConverter {
    Arc::new(ExternalToolConverter::new(name, program, args.iter().copied()))
}

/// Builds the file conversation routes.
pub fn file_routes(tools: &ToolsConfig) -> Result<FileRoutes, RoutingError> {
    use DataFormat as D;
    use FileFormat::*;

    let html_to_pdf = tool("html->pdf", &tools.wkhtmltopdf, &["{input}", "{output}"]);
    let image_to_pdf = |name: &str| tool(name, &tools.img2pdf, &["{input}", "-o", "{output}"]);

    RoutingTable::builder()
        .equivalents(Json, [Yml, Text, Xml])
        .equivalents(Yml, [Json, Text, Xml])
        .equivalents(Xml, [Json, Yml])
        .equivalents(Html, [Pdf, Png, Jpg])
        .equivalents(Pdf, [Docx, Text])
        .equivalents(Png, [Pdf])
        .equivalents(Photo, [Pdf, Text])
        .route(Json, Yml, structured(D::Json, D::Yaml))
        .route(Json, Text, structured(D::Json, D::Text))
        .route(Json, Xml, structured(D::Json, D::Xml))
        .route(Yml, Json, structured(D::Yaml, D::Json))
        .route(Yml, Text, structured(D::Yaml, D::Text))
        .route(Yml, Xml, structured(D::Yaml, D::Xml))
        .route(Xml, Json, structured(D::Xml, D::Json))
        .route(Xml, Yml, structured(D::Xml, D::Yaml))
        .route(Html, Pdf, html_to_pdf)
        .route(
            Html,
            Png,
            tool(
                "html->png",
                &tools.wkhtmltoimage,
                &["--format", "png", "{input}", "{output}"],
            ),
        )
        .route(
            Html,
            Jpg,
            tool(
                "html->jpg",
                &tools.wkhtmltoimage,
                &["--format", "jpg", "{input}", "{output}"],
            ),
        )
        .route(
            Pdf,
            Docx,
            tool("pdf->docx", &tools.pdf2docx, &["convert", "{input}", "{output}"]),
        )
        .route(
            Pdf,
            Text,
            tool("pdf->text", &tools.pdftotext, &["{input}", "{output}"]),
        )
        .route(Png, Pdf, image_to_pdf("png->pdf"))
        .route(Photo, Pdf, image_to_pdf("photo->pdf"))
        .route(
            Photo,
            Text,
            // tesseract appends ".txt" itself
            tool("photo->text", &tools.tesseract, &["{input}", "{output_stem}"]),
        )
        .build()
}

/// Builds the webpage conversation routes.
pub fn webpage_routes(
    tools: &ToolsConfig,
    client: reqwest::Client,
) -> Result<WebpageRoutes, RoutingError> {
    use WebpageFormat::*;
    use WebpageSource::Webpage;

    RoutingTable::builder()
        .equivalents(Webpage, [Pdf, Html, Png, Jpg])
        .route(
            Webpage,
            Pdf,
            tool("webpage->pdf", &tools.wkhtmltopdf, &["{input}", "{output}"]),
        )
        .route(Webpage, Html, Arc::new(WebpageHtmlFetcher::new(client)) as SharedConverter)
        .route(
            Webpage,
            Png,
            tool(
                "webpage->png",
                &tools.wkhtmltoimage,
                &["--format", "png", "{input}", "{output}"],
            ),
        )
        .route(
            Webpage,
            Jpg,
            tool(
                "webpage->jpg",
                &tools.wkhtmltoimage,
                &["--format", "jpg", "{input}", "{output}"],
            ),
        )
        .build()
}

/// Builds the media conversation routes.
pub fn media_routes(tools: &ToolsConfig) -> Result<MediaRoutes, RoutingError> {
    use MediaFormat::*;
    use MediaSource::Video;

    RoutingTable::builder()
        .equivalents(Video, [Mp3, Mp4])
        .route(
            Video,
            Mp3,
            tool(
                "video->mp3",
                &tools.yt_dlp,
                &[
                    "-x",
                    "--audio-format",
                    "mp3",
                    "--force-overwrites",
                    "--no-playlist",
                    "-o",
                    "{output_stem}.%(ext)s",
                    "{input}",
                ],
            ),
        )
        .route(
            Video,
            Mp4,
            tool(
                "video->mp4",
                &tools.yt_dlp,
                &[
                    "-f",
                    "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best",
                    "--merge-output-format",
                    "mp4",
                    "--force-overwrites",
                    "--no-playlist",
                    "-o",
                    "{output}",
                    "{input}",
                ],
            ),
        )
        .build()
}
