//! Media Adapters
//!
//! - **YtDlpResolver** - MediaResolver backed by the yt-dlp CLI

mod yt_dlp;

pub use yt_dlp::YtDlpResolver;
