//! Conversation flows.
//!
//! One [`ConversationFlow`](crate::application::engine::ConversationFlow)
//! per interaction domain:
//!
//! - `FileConversation` - `/convert`
//! - `UrlConversation` - `/url`
//! - `MediaConversation` - `/youtube`

mod common;
mod file_conversation;
mod media_conversation;
mod url_conversation;

pub use file_conversation::FileConversation;
pub use media_conversation::MediaConversation;
pub use url_conversation::{parse_web_url, UrlConversation};
