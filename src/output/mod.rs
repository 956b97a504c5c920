//! Built-in result handlers.
//!
//! This module delivers finished results outside the engine:
//! - Human-readable log messages
//! - JSON-lines streams for later analysis

pub mod json;
pub mod log;

// Re-export main types
pub use json::JsonLinesHandler;
pub use self::log::LogResultHandler;
