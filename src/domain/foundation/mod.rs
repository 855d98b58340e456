//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, the stage state machine trait and
//! error types that form the vocabulary of the conversion bot.

mod errors;
mod ids;
mod output_name;
mod state_machine;

pub use errors::ValidationError;
pub use ids::{ChatId, MessageId};
pub use output_name::{OutputName, MAX_OUTPUT_NAME_LEN};
pub use state_machine::StateMachine;
