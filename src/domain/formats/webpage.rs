//! Format tags for the webpage conversation.

use super::format_tags;

format_tags! {
    /// The only kind of source a URL conversation accepts.
    WebpageSource, "webpage source" {
        Webpage => ("webpage", "html"),
    }
}

format_tags! {
    /// Files a webpage can be rendered into.
    WebpageFormat, "webpage" {
        Pdf => ("pdf", "pdf"),
        Html => ("html", "html"),
        Png => ("png", "png"),
        Jpg => ("jpg", "jpg"),
    }
}
