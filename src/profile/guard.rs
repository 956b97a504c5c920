//! Scope-bound instrumentation.

use super::id::StageId;
use super::registry::ProfilerRegistry;

/// Ends its stage when dropped.
///
/// [`ProfilerRegistry::scoped`] begins the stage immediately and returns this
/// guard; every exit path of the enclosing scope, early returns and unwinds
/// included, then records the matching end.
#[must_use = "the stage ends when this guard is dropped"]
pub struct StageGuard<'a> {
    registry: &'a ProfilerRegistry,
    stage: StageId,
}

impl<'a> StageGuard<'a> {
    pub(crate) fn begin(registry: &'a ProfilerRegistry, stage: StageId) -> Self {
        registry.begin_stage(&stage.profiler_id, &stage.stage_name, stage.order);
        Self { registry, stage }
    }
}

impl Drop for StageGuard<'_> {
    fn drop(&mut self) {
        self.registry
            .end_stage(&self.stage.profiler_id, &self.stage.stage_name);
    }
}
