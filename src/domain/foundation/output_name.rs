//! User-chosen output file names.
//!
//! A name entered during the naming stage becomes the base name of the
//! converted artifact. It must never be able to escape the artifact's
//! scoped directory, so path separators and dot segments are rejected
//! outright instead of being silently rewritten.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// Maximum number of characters accepted for an output name.
pub const MAX_OUTPUT_NAME_LEN: usize = 64;

const FALLBACK_NAME: &str = "video";

/// A validated base name (without extension) for a converted artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OutputName(String);

impl OutputName {
    /// Parses a name typed by the user.
    ///
    /// Surrounding whitespace is trimmed. Returns a `ValidationError` when the
    /// result is empty, too long, a dot segment, or contains path separators
    /// or control characters.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("file_name"));
        }

        let len = trimmed.chars().count();
        if len > MAX_OUTPUT_NAME_LEN {
            return Err(ValidationError::too_long("file_name", MAX_OUTPUT_NAME_LEN, len));
        }

        if trimmed == "." || trimmed == ".." {
            return Err(ValidationError::invalid_format(
                "file_name",
                "dot segments are not allowed",
            ));
        }

        if trimmed.contains('/') || trimmed.contains('\\') {
            return Err(ValidationError::invalid_format(
                "file_name",
                "path separators are not allowed",
            ));
        }

        if trimmed.chars().any(char::is_control) {
            return Err(ValidationError::invalid_format(
                "file_name",
                "control characters are not allowed",
            ));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Derives a safe name from free-form text such as a video title.
    ///
    /// Characters that are not alphanumeric, space, dash, underscore or dot
    /// are replaced with `_`. Never fails: an unusable title falls back to a
    /// generic name.
    pub fn from_title(title: &str) -> Self {
        let sanitized: String = title
            .trim()
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .take(MAX_OUTPUT_NAME_LEN)
            .collect();

        match Self::parse(&sanitized) {
            Ok(name) => name,
            Err(_) => Self(FALLBACK_NAME.to_string()),
        }
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the full file name with the given extension appended.
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}.{}", self.0, extension)
    }
}

impl fmt::Display for OutputName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for OutputName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<OutputName> for String {
    fn from(name: OutputName) -> Self {
        name.0
    }
}
