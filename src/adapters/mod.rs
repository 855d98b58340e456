//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the conversation engine to external systems:
//! - `converters` - In-process and external-tool converters, route tables
//! - `gateway` - Messaging gateways (console, in-memory)
//! - `http` - reqwest client and URL probe
//! - `media` - yt-dlp media resolver
//! - `storage` - Scoped temporary artifacts

pub mod converters;
pub mod gateway;
pub mod http;
pub mod media;
pub mod storage;

pub use converters::{file_routes, media_routes, webpage_routes};
pub use gateway::{parse_console_line, ConsoleGateway, RecordingGateway};
pub use http::{build_http_client, HttpUrlProbe};
pub use media::YtDlpResolver;
pub use storage::TempArtifactFactory;
