//! Application layer - the conversation engine and its wiring.
//!
//! - `engine` - flow contract, runner and error recovery
//! - `handlers` - the file, webpage and media-link conversations
//! - `conversion` - scoped, bounded conversion execution
//! - `session_registry` - per-chat session slots
//! - `dispatcher` - routes inbound events to conversations

pub mod conversion;
pub mod dispatcher;
pub mod engine;
pub mod handlers;
pub mod messages;
pub mod session_registry;

pub use conversion::{ConversionLimiter, ConversionService};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use engine::{ConversationEngine, ConversationFlow, ErrorRecovery};
pub use handlers::{FileConversation, MediaConversation, UrlConversation};
pub use session_registry::{ActiveConversation, ConversationKind, SessionRegistry};
