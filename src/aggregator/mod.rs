//! Cross-run statistics.
//!
//! This module turns finished runs into averaged results:
//! - Running min/max/mean per stage position
//! - Window accumulation up to a profiler's target run count

pub mod average;
pub(crate) mod runs;

// Re-export main types
pub use average::AverageTime;
