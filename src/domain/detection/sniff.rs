//! Content sniffing by magic bytes and text shape.
//!
//! The sniffer only looks at content. It reports generic classes such as
//! plain text or XML when the bytes alone cannot say more; the detector
//! resolves those with the declared file name.

use std::fmt;

const PDF_MAGIC: &[u8] = b"%PDF-";
const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const GIF87_MAGIC: &[u8] = b"GIF87a";
const GIF89_MAGIC: &[u8] = b"GIF89a";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const UTF8_BOM: &str = "\u{feff}";

/// Unambiguous HTML markers, searched for anywhere in the scan window.
const HTML_MARKERS: &[&str] = &["<!doctype html", "<html"];

/// Elements that also occur in plain XML vocabularies; they only mark HTML
/// when the document opens with one of them.
const HTML_OPENING_ELEMENTS: &[&str] = &["<head", "<body", "<title", "<meta"];

/// How much of a text document is searched for HTML markers.
const HTML_SCAN_LIMIT: usize = 4096;

/// Content class determined from bytes alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SniffedType {
    Pdf,
    Png,
    Jpeg,
    Gif,
    Zip,
    Json,
    Html,
    Xml,
    PlainText,
    Binary,
    Empty,
}

impl SniffedType {
    /// Returns the MIME type conventionally associated with this class.
    pub fn mime(&self) -> &'static str {
        match self {
            SniffedType::Pdf => "application/pdf",
            SniffedType::Png => "image/png",
            SniffedType::Jpeg => "image/jpeg",
            SniffedType::Gif => "image/gif",
            SniffedType::Zip => "application/zip",
            SniffedType::Json => "application/json",
            SniffedType::Html => "text/html",
            SniffedType::Xml => "text/xml",
            SniffedType::PlainText => "text/plain",
            SniffedType::Binary => "application/octet-stream",
            SniffedType::Empty => "application/x-empty",
        }
    }

    /// Returns true when content alone cannot decide the format and the
    /// declared file name has to break the tie.
    pub fn is_ambiguous(&self) -> bool {
        matches!(
            self,
            SniffedType::PlainText | SniffedType::Xml | SniffedType::Zip
        )
    }
}

impl fmt::Display for SniffedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// Classifies raw content.
///
/// Pure function of `bytes`: the same input always yields the same class.
pub fn sniff(bytes: &[u8]) -> SniffedType {
    if bytes.is_empty() {
        return SniffedType::Empty;
    }

    if bytes.starts_with(PDF_MAGIC) {
        return SniffedType::Pdf;
    }
    if bytes.starts_with(PNG_MAGIC) {
        return SniffedType::Png;
    }
    if bytes.starts_with(JPEG_MAGIC) {
        return SniffedType::Jpeg;
    }
    if bytes.starts_with(GIF87_MAGIC) || bytes.starts_with(GIF89_MAGIC) {
        return SniffedType::Gif;
    }
    if bytes.starts_with(ZIP_MAGIC) {
        return SniffedType::Zip;
    }

    let Ok(text) = std::str::from_utf8(bytes) else {
        return SniffedType::Binary;
    };
    sniff_text(text)
}

fn sniff_text(text: &str) -> SniffedType {
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(text).trim();
    if text.is_empty() {
        return SniffedType::PlainText;
    }

    if text.contains('\0') {
        return SniffedType::Binary;
    }

    if (text.starts_with('{') || text.starts_with('['))
        && serde_json::from_str::<serde_json::Value>(text).is_ok()
    {
        return SniffedType::Json;
    }

    let body = skip_leading_comments(text);
    if looks_like_html(body) {
        return SniffedType::Html;
    }

    if body.starts_with("<?xml") || (body.starts_with('<') && text.ends_with('>')) {
        return SniffedType::Xml;
    }

    SniffedType::PlainText
}

/// Drops leading `<!-- ... -->` comments and the whitespace around them.
fn skip_leading_comments(mut text: &str) -> &str {
    while let Some(rest) = text.strip_prefix("<!--") {
        match rest.find("-->") {
            Some(end) => text = rest[end + 3..].trim_start(),
            None => return "",
        }
    }
    text
}

fn looks_like_html(text: &str) -> bool {
    if !text.starts_with('<') {
        return false;
    }
    let window = &text.as_bytes()[..text.len().min(HTML_SCAN_LIMIT)];
    let lowered = String::from_utf8_lossy(window).to_ascii_lowercase();
    HTML_MARKERS.iter().any(|marker| lowered.contains(marker))
        || HTML_OPENING_ELEMENTS
            .iter()
            .any(|element| lowered.starts_with(element))
}

#[cfg(test)]
mod tests {
    use super::*;

    mod magic_bytes {
        use super::*;

        #[test]
        fn detects_pdf() {
            assert_eq!(sniff(b"%PDF-1.7\n..."), SniffedType::Pdf);
        }

        #[test]
        fn detects_png() {
            assert_eq!(sniff(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"), SniffedType::Png);
        }

        #[test]
        fn detects_jpeg() {
            assert_eq!(sniff(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]), SniffedType::Jpeg);
        }

        #[test]
        fn detects_gif_and_zip() {
            assert_eq!(sniff(b"GIF89a...."), SniffedType::Gif);
            assert_eq!(sniff(b"PK\x03\x04rest"), SniffedType::Zip);
        }

        #[test]
        fn invalid_utf8_is_binary() {
            assert_eq!(sniff(&[0x00, 0xC3, 0x28, 0xFF]), SniffedType::Binary);
        }

        #[test]
        fn empty_is_empty() {
            assert_eq!(sniff(b""), SniffedType::Empty);
        }
    }

    mod text_shapes {
        use super::*;

        #[test]
        fn detects_json_object_and_array() {
            assert_eq!(sniff(br#"{"a": 1}"#), SniffedType::Json);
            assert_eq!(sniff(b"  [1, 2, 3]\n"), SniffedType::Json);
        }

        #[test]
        fn broken_json_is_plain_text() {
            assert_eq!(sniff(b"{not json"), SniffedType::PlainText);
        }

        #[test]
        fn detects_html_case_insensitively() {
            assert_eq!(sniff(b"<!DOCTYPE html><html></html>"), SniffedType::Html);
            assert_eq!(sniff(b"<HTML><body>x</body></HTML>"), SniffedType::Html);
        }

        #[test]
        fn detects_html_after_leading_comment() {
            let page = b"<!-- saved from url=(0014)about:internet -->\n<!DOCTYPE html><html><body>x</body></html>";
            assert_eq!(sniff(page), SniffedType::Html);
        }

        #[test]
        fn detects_html_starting_with_head_elements() {
            let page = b"<meta charset=\"utf-8\"><title>Index</title><p>hi</p>";
            assert_eq!(sniff(page), SniffedType::Html);
        }

        #[test]
        fn detects_xhtml_behind_xml_declaration() {
            let page = b"<?xml version=\"1.0\"?>\n<!DOCTYPE html>\n<html xmlns=\"http://www.w3.org/1999/xhtml\"></html>";
            assert_eq!(sniff(page), SniffedType::Html);
        }

        #[test]
        fn xml_with_title_element_stays_xml() {
            assert_eq!(
                sniff(b"<catalog><book><title>Dune</title></book></catalog>"),
                SniffedType::Xml
            );
        }

        #[test]
        fn markers_beyond_scan_limit_are_ignored() {
            let page = format!("<a>{}<html></html></a>", "x".repeat(HTML_SCAN_LIMIT));
            assert_eq!(sniff(page.as_bytes()), SniffedType::Xml);
        }

        #[test]
        fn markup_fragment_without_markers_is_xml() {
            assert_eq!(sniff(b"<div><p>hello</p></div>"), SniffedType::Xml);
        }

        #[test]
        fn unterminated_leading_comment_is_plain_text() {
            assert_eq!(sniff(b"<!-- never closed"), SniffedType::PlainText);
        }

        #[test]
        fn comment_before_xml_keeps_xml() {
            assert_eq!(sniff(b"<!-- c --><note><to>x</to></note>"), SniffedType::Xml);
        }

        #[test]
        fn detects_xml() {
            assert_eq!(sniff(b"<?xml version=\"1.0\"?><a/>"), SniffedType::Xml);
            assert_eq!(sniff(b"<note><to>x</to></note>"), SniffedType::Xml);
        }

        #[test]
        fn strips_bom_before_classifying() {
            assert_eq!(sniff("\u{feff}{\"a\":1}".as_bytes()), SniffedType::Json);
        }

        #[test]
        fn yaml_is_plain_text() {
            assert_eq!(sniff(b"name: demo\nitems:\n  - 1\n"), SniffedType::PlainText);
        }

        #[test]
        fn whitespace_only_is_plain_text() {
            assert_eq!(sniff(b"   \n\t"), SniffedType::PlainText);
        }
    }

    #[test]
    fn ambiguous_classes() {
        assert!(SniffedType::PlainText.is_ambiguous());
        assert!(SniffedType::Xml.is_ambiguous());
        assert!(SniffedType::Zip.is_ambiguous());
        assert!(!SniffedType::Json.is_ambiguous());
        assert!(!SniffedType::Pdf.is_ambiguous());
    }

    #[test]
    fn mime_strings() {
        assert_eq!(SniffedType::PlainText.mime(), "text/plain");
        assert_eq!(SniffedType::Json.to_string(), "application/json");
    }
}
