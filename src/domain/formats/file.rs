//! Format tags for uploaded files.

use super::format_tags;

format_tags! {
    /// Source and target formats of the file conversation.
    ///
    /// `Photo` is a compressed image sent through the chat's photo channel
    /// rather than as a document; it is delivered and stored as JPEG.
    FileFormat, "file" {
        Json => ("json", "json"),
        Yml => ("yml", "yml"),
        Xml => ("xml", "xml"),
        Text => ("text", "txt"),
        Html => ("html", "html"),
        Pdf => ("pdf", "pdf"),
        Png => ("png", "png"),
        Jpg => ("jpg", "jpg"),
        Docx => ("docx", "docx"),
        Photo => ("photo", "jpg"),
    }
}
