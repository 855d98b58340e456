//! Format detection for uploaded files.
//!
//! Two layers: [`sniff`] classifies bytes by magic numbers and text shape,
//! and [`FormatDetector`] maps that class onto a `FileFormat`, consulting the
//! declared file name only when content is ambiguous.

mod detector;
mod sniff;

pub use detector::{Detection, FormatDetector};
pub use sniff::{sniff, SniffedType};
