//! Domain layer containing the conversion bot's rules and types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (identifiers, output names, state machine trait, errors)
//! - `formats` - Closed format-tag sets per conversation domain
//! - `detection` - Content sniffing and file format detection
//! - `routing` - (source, target) -> conversion operation tables
//! - `artifact` - Scoped temporary files
//! - `conversation` - Stage machines, session records, events and stage errors

pub mod artifact;
pub mod conversation;
pub mod detection;
pub mod formats;
pub mod foundation;
pub mod routing;
