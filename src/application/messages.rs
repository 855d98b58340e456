//! User-facing texts shared by every conversation.

use crate::domain::conversation::Sender;

/// Sent when the user declines another conversion.
pub const FAREWELL: &str = "Thank you! Run /start or /help to view available commands";

/// Buttons offered by every "another one?" question.
pub const YES: &str = "yes";
pub const NO: &str = "no";

/// Prompt asking for the output base name.
pub const ASK_OUTPUT_NAME: &str = "Please enter the file name you want for the converted file";

/// Help text listing the supported conversions.
///
/// Greets the sender by name when known. Also used as the closing message
/// whenever a conversation terminates early.
pub fn help_text(sender: Option<&Sender>) -> String {
    let greeting = match sender {
        Some(sender) => format!("Hello {}", sender.full_name()),
        None => "Hello".to_string(),
    };
    format!(
        "{greeting}, This bot supports the following commands:\n\n\
         1) /convert - convert between file types:\n\n\
         \x20 a) json -> yml, text, xml\n\
         \x20 b) yml -> json, text, xml\n\
         \x20 c) xml -> json, yml\n\
         \x20 d) html -> pdf, png, jpg\n\
         \x20 e) pdf -> docx, text\n\
         \x20 f) png -> pdf\n\
         \x20 g) photo -> pdf, text\n\n\
         2) /url - convert URL into files, supported formats: [pdf, html, png, jpg]\n\n\
         3) /youtube - convert youtube video to mp3/mp4\n\n\
         Send /cancel or exit at any time to stop."
    )
}

/// The yes/no buttons.
pub fn yes_no() -> Vec<String> {
    vec![YES.to_string(), NO.to_string()]
}
