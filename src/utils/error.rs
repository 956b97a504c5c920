//! Error types for the whole crate.
//!
//! We use `thiserror` for typed errors. Tracking and aggregation errors are
//! diagnostics: they are logged where they are detected and never surface to
//! instrumented code. Output errors are returned by handler constructors and
//! otherwise logged as well.

use thiserror::Error;

/// Errors detected while tracking the begin/end stage stream of one run
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TrackError {
    #[error("profiler '{profiler}': no open stage matches end of '{stage}'")]
    StageMismatch { profiler: String, stage: String },

    #[error("profiler '{profiler}': sibling order {order} already used under '{parent}', stage '{stage}' keeps arrival position")]
    DuplicateSiblingOrder {
        profiler: String,
        parent: String,
        stage: String,
        order: u32,
    },
}

/// Errors detected while merging runs into an averaging window
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AggregateError {
    #[error("profiler '{profiler}': run root '{got}' does not match window root '{expected}', run dropped")]
    RootMismatch {
        profiler: String,
        expected: String,
        got: String,
    },

    #[error("profiler '{profiler}': stage '{stage}' (order {order}) has no counterpart in the window, node dropped from this run")]
    UnmatchedNode {
        profiler: String,
        stage: String,
        order: u32,
    },
}

/// Errors that can occur during result output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write results: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}
