//! Storage Adapters
//!
//! Implementations of the ArtifactFactory port.
//!
//! ## Available Adapters
//!
//! - **TempArtifactFactory** - One private temp directory per artifact
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::TempArtifactFactory;
//!
//! let factory = TempArtifactFactory::new("./work");
//! let artifact = factory.create("out", "yml")?;
//! // artifact.path() is deleted when `artifact` goes out of scope
//! ```

mod temp_artifacts;

pub use temp_artifacts::TempArtifactFactory;
