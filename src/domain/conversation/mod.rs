//! Conversation domain: stage state machines, session records, inbound
//! events and the typed error/recovery model.
//!
//! Three independent conversations share the same shape:
//!
//! - `file` - upload a document, choose a format, name the output
//! - `url` - paste a URL, choose a format, name the output
//! - `media` - paste a video link, choose audio or video

mod error;
mod event;
mod file;
mod media;
mod session;
mod stage;
mod url;

pub use error::{BoxError, ErrorKind, ReplyMode, StageError, StageResult, INTERNAL_ERROR_MESSAGE};
pub use event::{BotCommand, ChatRef, EventPayload, InboundEvent, IncomingDocument, Sender};
pub use file::{FileConversationError, FileSession, FileStage, SourceDocument};
pub use media::{MediaConversationError, MediaHandle, MediaSession, MediaStage};
pub use session::Session;
pub use stage::{ConversationSession, ConversationStage};
pub use self::url::{UrlConversationError, UrlSession, UrlStage};
