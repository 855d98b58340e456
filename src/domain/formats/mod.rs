//! Closed format-tag sets, one per conversation domain.
//!
//! - `FileFormat` - uploaded documents and photos
//! - `WebpageSource` / `WebpageFormat` - URLs rendered into files
//! - `MediaSource` / `MediaFormat` - video links extracted into audio/video
//!
//! Every tag set is a plain enum generated by [`format_tags!`], so the full
//! list of members is known at compile time and exposed through `all()`.

mod file;
mod media;
mod webpage;

pub use file::FileFormat;
pub use media::{MediaFormat, MediaSource};
pub use webpage::{WebpageFormat, WebpageSource};

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use thiserror::Error;

/// Behaviour shared by every format-tag enum.
pub trait FormatTag:
    Copy
    + Eq
    + Ord
    + Hash
    + fmt::Debug
    + fmt::Display
    + FromStr<Err = UnknownFormat>
    + Send
    + Sync
    + 'static
{
    /// Lowercase tag as shown to the user (e.g. `"yml"`).
    fn as_str(&self) -> &'static str;

    /// File extension used for artifacts of this format (e.g. `"txt"` for text).
    fn extension(&self) -> &'static str;

    /// Every member of the set, in declaration order.
    fn all() -> &'static [Self];
}

/// A string did not name any member of a format-tag set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{value}' is not a known {domain} format")]
pub struct UnknownFormat {
    pub domain: &'static str,
    pub value: String,
}

/// Generates a format-tag enum with `FormatTag`, `Display`, `FromStr` and
/// serde support.
///
/// Parsing is case-insensitive and ignores surrounding whitespace, since
/// tags usually arrive as button labels or typed answers.
macro_rules! format_tags {
    (
        $(#[$meta:meta])*
        $name:ident, $domain:literal {
            $($variant:ident => ($tag:literal, $ext:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $crate::domain::formats::FormatTag for $name {
            fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $tag),+
                }
            }

            fn extension(&self) -> &'static str {
                match self {
                    $($name::$variant => $ext),+
                }
            }

            fn all() -> &'static [Self] {
                &[$($name::$variant),+]
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str($crate::domain::formats::FormatTag::as_str(self))
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::domain::formats::UnknownFormat;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let needle = s.trim();
                <$name as $crate::domain::formats::FormatTag>::all()
                    .iter()
                    .copied()
                    .find(|tag| {
                        $crate::domain::formats::FormatTag::as_str(tag)
                            .eq_ignore_ascii_case(needle)
                    })
                    .ok_or_else(|| $crate::domain::formats::UnknownFormat {
                        domain: $domain,
                        value: needle.to_string(),
                    })
            }
        }
    };
}

pub(crate) use format_tags;

/// Returns the user-visible labels of the given tags, in order.
///
/// Used to build choice buttons from an equivalents set.
pub fn labels<T: FormatTag>(tags: &[T]) -> Vec<String> {
    tags.iter().map(|t| t.as_str().to_string()).collect()
}
