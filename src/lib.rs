//! Stagetrace
//!
//! In-process hierarchical stage profiling with optional cross-run
//! averaging.
//!
//! Instrumented code marks the boundaries of nested stages; the engine
//! assembles each run into a timing tree and hands it to registered
//! [`ResultHandler`]s, either run by run or averaged over a configured
//! number of runs.
//!
//! ## Getting Started
//!
//! ```no_run
//! use std::sync::Arc;
//! use stagetrace::{LogResultHandler, ProfilerId, StageId};
//!
//! stagetrace::add_result_handler(Arc::new(LogResultHandler));
//!
//! // Average five runs of "load" before logging one result.
//! let profiler = ProfilerId::new("load", 5);
//! for _ in 0..5 {
//!     let _run = stagetrace::scoped(StageId::new(profiler.clone(), "load", 0));
//!     let parsed = stagetrace::measure(StageId::new(profiler.clone(), "parse", 1), || {
//!         // ... the work being timed ...
//!         42
//!     });
//!     assert_eq!(parsed, 42);
//! }
//! ```
//!
//! Profiling never interferes with the instrumented code: malformed
//! begin/end sequences are repaired and reported through `log`, and a
//! panicking handler is isolated.

mod aggregator;
mod output;
mod profile;
mod result;
mod utils;

pub use aggregator::AverageTime;
pub use output::{JsonLinesHandler, LogResultHandler};
pub use profile::guard::StageGuard;
pub use profile::id::{ProfilerId, StageId};
pub use profile::registry::{
    add_result_handler, begin_stage, clear, end_stage, global, is_enabled, measure,
    remove_result_handler, scoped, set_enabled, ProfilerRegistry,
};
pub use result::{ResultHandler, ResultTree};
pub use utils::error::{AggregateError, OutputError, TrackError};
