//! Format tags for the media-link conversation.

use super::format_tags;

format_tags! {
    /// The only kind of source a media conversation accepts.
    MediaSource, "media source" {
        Video => ("video", "mp4"),
    }
}

format_tags! {
    /// Audio or video formats a media link can be extracted into.
    MediaFormat, "media" {
        Mp3 => ("mp3", "mp3"),
        Mp4 => ("mp4", "mp4"),
    }
}
