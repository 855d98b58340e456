//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the conversation engine and the outside world. Adapters implement these
//! ports.
//!
//! - `MessagingGateway` - Chat transport (prompts, replies, deliveries, downloads)
//! - `ArtifactFactory` - Scoped temporary files
//! - `Converter` - One opaque conversion operation
//! - `UrlProbe` - Webpage reachability
//! - `MediaResolver` - Video link resolution

mod artifact_factory;
mod converter;
mod media_resolver;
mod messaging_gateway;
mod url_probe;

pub use artifact_factory::{ArtifactError, ArtifactFactory};
pub use converter::{
    ConversionInput, Converter, ConverterError, FileRoutes, MediaRoutes, SharedConverter,
    WebpageRoutes,
};
pub use media_resolver::{MediaResolver, ResolveError};
pub use messaging_gateway::{GatewayError, MessagingGateway};
pub use url_probe::{ProbeError, UrlProbe};
