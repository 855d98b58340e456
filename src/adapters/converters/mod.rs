//! Converter Adapters
//!
//! Implementations of the Converter port and the route tables that wire
//! them to format pairs.
//!
//! ## Available Adapters
//!
//! - **StructuredDataConverter** - JSON / YAML / XML / text, in-process
//! - **ExternalToolConverter** - Shells out to wkhtmltopdf, pdftotext, yt-dlp, ...
//! - **WebpageHtmlFetcher** - Saves a page's HTML with reqwest

mod external_tool;
mod registry;
mod structured;
mod webpage;
mod xml;

pub use external_tool::ExternalToolConverter;
pub use registry::{file_routes, media_routes, webpage_routes};
pub use structured::{DataFormat, StructuredDataConverter};
pub use webpage::WebpageHtmlFetcher;
pub use xml::{read_xml, write_xml};
