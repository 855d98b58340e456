//! Mr File Converter - a chat bot that converts files, webpages and media
//! links through short multi-step conversations.
//!
//! The crate is laid out hexagonally: `domain` holds formats, routing and
//! the conversation state machines, `ports` the seams to the outside world,
//! `adapters` their implementations and `application` the engine that drives
//! conversations.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
