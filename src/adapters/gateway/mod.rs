//! Messaging Gateway Adapters
//!
//! - **ConsoleGateway** - Terminal transport used by the binary
//! - **RecordingGateway** - In-memory gateway for tests

mod console;
mod recording;

pub use console::{parse_console_line, ConsoleGateway, UPLOAD_PREFIX};
pub use recording::{Outgoing, RecordingGateway};
