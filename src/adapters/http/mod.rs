//! HTTP Adapters
//!
//! - **HttpUrlProbe** - UrlProbe backed by reqwest
//! - **build_http_client** - Client configured from `NetworkConfig`

mod client;
mod url_probe;

pub use client::build_http_client;
pub use url_probe::HttpUrlProbe;
