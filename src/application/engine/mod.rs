//! Conversation engine.
//!
//! A [`ConversationFlow`] supplies per-stage handlers; the
//! [`ConversationEngine`] runs them against a session record and hands every
//! typed failure to [`ErrorRecovery`].

mod flow;
mod recovery;
mod runner;

pub use flow::{transport_failure, ConversationFlow, YesNo};
pub use recovery::ErrorRecovery;
pub use runner::{ConversationEngine, FlowSession};
