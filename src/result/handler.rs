//! Delivery boundary for finished results.

use super::tree::ResultTree;
use crate::profile::id::ProfilerId;

/// Consumer of finished timing trees.
///
/// Called exactly once per completed single run, or once per completed
/// averaging window, synchronously on the thread whose `end_stage` finished
/// it. For one profiler, deliveries follow completion order, except that two
/// windows sealing concurrently on different threads may arrive swapped: the
/// hand-off happens outside the engine's locks. Handlers should return
/// quickly; a handler that panics is isolated and reported without disturbing
/// the instrumented code or other handlers.
pub trait ResultHandler: Send + Sync {
    fn handle_result(&self, result: &ResultTree, profiler_id: &ProfilerId);
}
