//! Profiler registry: routing from begin/end calls to delivered results.
//!
//! The registry maps each [`ProfilerId`] to its live state (one run tracker
//! per calling thread, plus the averaging accumulator) and fans finished
//! results out to the registered handlers. Everything runs synchronously on
//! the calling thread; the only locks are short-lived map shards, the
//! per-profiler aggregator mutex, and the handler list.
//!
//! No call here ever fails the instrumented code. Misuse is repaired where
//! possible and reported through `log`.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, ThreadId};

use dashmap::DashMap;
use log::{debug, error, warn};
use parking_lot::{Mutex, RwLock};

use super::guard::StageGuard;
use super::id::{ProfilerId, StageId};
use super::tracker::RunTracker;
use crate::aggregator::runs::RunAggregator;
use crate::result::handler::ResultHandler;
use crate::result::tree::ResultTree;
use crate::utils::error::TrackError;

/// Live state of one profiler
struct ProfilerState {
    /// One tracker per thread currently running this profiler
    trackers: DashMap<ThreadId, RunTracker>,
    /// Cross-run accumulator; only locked for averaging profilers
    aggregator: Mutex<RunAggregator>,
}

impl ProfilerState {
    fn new(profiler_id: &ProfilerId) -> Self {
        Self {
            trackers: DashMap::new(),
            aggregator: Mutex::new(RunAggregator::new(profiler_id)),
        }
    }
}

/// Registry of live profilers and result handlers.
///
/// Tests and embedders can own private instances; production code usually
/// goes through the process-global one via the free functions in this module.
pub struct ProfilerRegistry {
    profilers: DashMap<ProfilerId, Arc<ProfilerState>>,
    handlers: RwLock<Vec<Arc<dyn ResultHandler>>>,
    enabled: AtomicBool,
}

impl Default for ProfilerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfilerRegistry {
    pub fn new() -> Self {
        Self {
            profilers: DashMap::new(),
            handlers: RwLock::new(Vec::new()),
            enabled: AtomicBool::new(true),
        }
    }

    /// Opens a stage for the calling thread.
    ///
    /// The profiler's state is created on first use. Stage `order` positions
    /// this stage among its siblings and aligns it across runs.
    pub fn begin_stage(&self, profiler_id: &ProfilerId, stage_name: &str, order: u32) {
        if !self.is_enabled() {
            return;
        }
        let state = self.state_for(profiler_id);
        state
            .trackers
            .entry(thread::current().id())
            .or_insert_with(|| RunTracker::new(profiler_id.name.as_str()))
            .begin_stage(stage_name, order);
    }

    /// Closes a stage for the calling thread.
    ///
    /// Closing the last open stage finishes the run: it is delivered
    /// immediately (single mode) or folded into the averaging window, whose
    /// sealed result is delivered from here as well. An end that matches no
    /// open stage is a logged no-op.
    pub fn end_stage(&self, profiler_id: &ProfilerId, stage_name: &str) {
        if !self.is_enabled() {
            return;
        }
        let Some(state) = self
            .profilers
            .get(profiler_id)
            .map(|entry| Arc::clone(entry.value()))
        else {
            warn!(
                "{}",
                TrackError::StageMismatch {
                    profiler: profiler_id.name.clone(),
                    stage: stage_name.to_string(),
                }
            );
            return;
        };

        let thread_id = thread::current().id();
        // The tracker guard must drop before `remove`, both touch the shard.
        let (completed, idle) = match state.trackers.get_mut(&thread_id) {
            Some(mut tracker) => {
                let completed = tracker.end_stage(stage_name);
                (completed, tracker.is_idle())
            }
            None => {
                warn!(
                    "{}",
                    TrackError::StageMismatch {
                        profiler: profiler_id.name.clone(),
                        stage: stage_name.to_string(),
                    }
                );
                return;
            }
        };
        if idle {
            state.trackers.remove(&thread_id);
        }
        let Some(root) = completed else {
            return;
        };

        if profiler_id.is_averaging() {
            let sealed = state.aggregator.lock().add_run(root);
            if let Some(result) = sealed {
                debug!("profiler '{}': averaging window sealed", profiler_id.name);
                self.dispatch(&result, profiler_id);
            }
        } else {
            debug!("profiler '{}': run finished", profiler_id.name);
            let result = ResultTree::from_single_run(root);
            self.dispatch(&result, profiler_id);
        }
    }

    /// Begins `stage` and returns the guard that ends it on drop
    pub fn scoped(&self, stage: StageId) -> StageGuard<'_> {
        StageGuard::begin(self, stage)
    }

    /// Runs `f` inside `stage`, ending it on every exit path
    pub fn measure<R>(&self, stage: StageId, f: impl FnOnce() -> R) -> R {
        let _guard = self.scoped(stage);
        f()
    }

    pub fn add_result_handler(&self, handler: Arc<dyn ResultHandler>) {
        self.handlers.write().push(handler);
    }

    /// Removes a previously added handler by pointer identity
    pub fn remove_result_handler(&self, handler: &Arc<dyn ResultHandler>) {
        self.handlers
            .write()
            .retain(|registered| !Arc::ptr_eq(registered, handler));
    }

    /// Turns all begin/end processing on or off.
    ///
    /// Disabling mid-run leaves that run's tracker open; it resumes if the
    /// engine is re-enabled, or goes away with [`ProfilerRegistry::clear`].
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Drops all live state: open trackers and partial windows.
    /// Handlers and the enabled flag survive.
    pub fn clear(&self) {
        self.profilers.clear();
    }

    fn state_for(&self, profiler_id: &ProfilerId) -> Arc<ProfilerState> {
        if let Some(state) = self.profilers.get(profiler_id) {
            return Arc::clone(state.value());
        }
        Arc::clone(
            self.profilers
                .entry(profiler_id.clone())
                .or_insert_with(|| Arc::new(ProfilerState::new(profiler_id)))
                .value(),
        )
    }

    fn dispatch(&self, result: &ResultTree, profiler_id: &ProfilerId) {
        // Handlers run outside the list lock so they may register or remove
        // handlers themselves.
        let handlers: Vec<Arc<dyn ResultHandler>> = self.handlers.read().clone();
        for handler in handlers {
            let delivery = catch_unwind(AssertUnwindSafe(|| {
                handler.handle_result(result, profiler_id);
            }));
            if delivery.is_err() {
                error!(
                    "profiler '{}': a result handler panicked, its delivery was dropped",
                    profiler_id.name
                );
            }
        }
    }
}

static GLOBAL: OnceLock<ProfilerRegistry> = OnceLock::new();

/// The process-global registry backing the free functions below
pub fn global() -> &'static ProfilerRegistry {
    GLOBAL.get_or_init(ProfilerRegistry::new)
}

/// Opens a stage on the global registry
pub fn begin_stage(profiler_id: &ProfilerId, stage_name: &str, order: u32) {
    global().begin_stage(profiler_id, stage_name, order);
}

/// Closes a stage on the global registry
pub fn end_stage(profiler_id: &ProfilerId, stage_name: &str) {
    global().end_stage(profiler_id, stage_name);
}

/// Begins `stage` on the global registry, ended by the returned guard
pub fn scoped(stage: StageId) -> StageGuard<'static> {
    global().scoped(stage)
}

/// Runs `f` inside `stage` on the global registry
pub fn measure<R>(stage: StageId, f: impl FnOnce() -> R) -> R {
    global().measure(stage, f)
}

pub fn add_result_handler(handler: Arc<dyn ResultHandler>) {
    global().add_result_handler(handler);
}

pub fn remove_result_handler(handler: &Arc<dyn ResultHandler>) {
    global().remove_result_handler(handler);
}

pub fn set_enabled(enabled: bool) {
    global().set_enabled(enabled);
}

pub fn is_enabled() -> bool {
    global().is_enabled()
}

/// Drops all live state on the global registry
pub fn clear() {
    global().clear();
}
