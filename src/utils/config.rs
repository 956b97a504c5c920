//! Shared constants.

/// Nanoseconds per millisecond, for rendering durations
pub const NANOS_PER_MS: u64 = 1_000_000;

/// Format tag written into the JSON-lines stream header
pub const STREAM_FORMAT: &str = "stagetrace-results";

/// Current JSON-lines stream version
pub const STREAM_VERSION: u32 = 1;
