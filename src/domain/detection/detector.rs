//! Classification of uploaded files into `FileFormat` tags.

use std::path::Path;

use tracing::debug;

use super::sniff::{sniff, SniffedType};
use crate::domain::formats::FileFormat;

/// Outcome of format detection. Never an error: unknown content is
/// reported as `Unsupported` together with what the sniffer saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    Supported(FileFormat),
    Unsupported { sniffed: SniffedType },
}

impl Detection {
    /// Returns the detected format, if supported.
    pub fn format(&self) -> Option<FileFormat> {
        match self {
            Detection::Supported(format) => Some(*format),
            Detection::Unsupported { .. } => None,
        }
    }
}

/// Stateless format detector.
///
/// Content wins over the declared name. The name is consulted only for
/// classes the sniffer marks ambiguous: plain text (YAML vs. text), generic
/// XML, and ZIP containers (DOCX).
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatDetector;

impl FormatDetector {
    pub fn new() -> Self {
        Self
    }

    /// Classifies `content` uploaded under `file_name`.
    pub fn detect(&self, content: &[u8], file_name: Option<&str>) -> Detection {
        let sniffed = sniff(content);
        let extension = file_name.and_then(extension_of);
        let detection = classify(sniffed, extension.as_deref());

        debug!(
            sniffed = %sniffed,
            extension = ?extension,
            detection = ?detection,
            "Classified uploaded content"
        );

        detection
    }
}

fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

fn classify(sniffed: SniffedType, extension: Option<&str>) -> Detection {
    let format = if sniffed.is_ambiguous() {
        by_extension(sniffed, extension)
    } else {
        by_content(sniffed)
    };

    match format {
        Some(format) => Detection::Supported(format),
        None => Detection::Unsupported { sniffed },
    }
}

fn by_content(sniffed: SniffedType) -> Option<FileFormat> {
    match sniffed {
        SniffedType::Json => Some(FileFormat::Json),
        SniffedType::Html => Some(FileFormat::Html),
        SniffedType::Pdf => Some(FileFormat::Pdf),
        SniffedType::Png => Some(FileFormat::Png),
        SniffedType::Jpeg => Some(FileFormat::Photo),
        _ => None,
    }
}

/// Breaks the tie for content classes that several formats share.
fn by_extension(sniffed: SniffedType, extension: Option<&str>) -> Option<FileFormat> {
    match (sniffed, extension?) {
        (SniffedType::PlainText, "yml" | "yaml") => Some(FileFormat::Yml),
        (SniffedType::PlainText, "txt") => Some(FileFormat::Text),
        (SniffedType::Xml, "xml") => Some(FileFormat::Xml),
        // Markup fragments without a document skeleton
        (SniffedType::Xml, "html" | "htm") => Some(FileFormat::Html),
        (SniffedType::Zip, "docx") => Some(FileFormat::Docx),
        _ => None,
    }
}
