//! Per calling-context run tracking.
//!
//! A `RunTracker` owns the stack of currently-open stages for one calling
//! context and the monotonic zero point of the run in progress. `begin_stage`
//! pushes a frame; `end_stage` seals the top frame and attaches it to its
//! parent, or hands the finished root back when the stack empties.
//!
//! The tracker never fails its caller. Malformed begin/end streams are
//! repaired in place and reported through `log`.

use std::time::Instant;

use log::warn;

use super::stage::StageNode;
use crate::utils::error::TrackError;

pub(crate) struct RunTracker {
    profiler_name: String,
    /// Zero point of the run in progress; reset when a new root opens
    started_at: Instant,
    /// Open frames, bottom (root) to top (deepest)
    open: Vec<StageNode>,
}

impl RunTracker {
    pub(crate) fn new(profiler_name: impl Into<String>) -> Self {
        Self {
            profiler_name: profiler_name.into(),
            started_at: Instant::now(),
            open: Vec::new(),
        }
    }

    /// Nanoseconds since the current run's root opened
    fn now_nanos(&self) -> u64 {
        self.started_at.elapsed().as_nanos() as u64
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.open.is_empty()
    }

    /// Opens a stage at the current clock.
    ///
    /// The first stage of a run re-zeroes the clock, so a root always starts
    /// at exactly 0.
    pub(crate) fn begin_stage(&mut self, stage_name: &str, order: u32) {
        let now = if self.open.is_empty() {
            self.started_at = Instant::now();
            0
        } else {
            self.now_nanos()
        };
        self.begin_stage_at(stage_name, order, now);
    }

    /// Opens a stage at an explicit run-relative time
    pub(crate) fn begin_stage_at(&mut self, stage_name: &str, order: u32, now_nanos: u64) {
        if let Some(parent) = self.open.last() {
            if parent.has_child_order(order) {
                warn!(
                    "{}",
                    TrackError::DuplicateSiblingOrder {
                        profiler: self.profiler_name.clone(),
                        parent: parent.stage_name.clone(),
                        stage: stage_name.to_string(),
                        order,
                    }
                );
            }
        }
        let depth = self.open.len();
        self.open
            .push(StageNode::open(stage_name, order, depth, now_nanos));
    }

    /// Closes a stage at the current clock.
    ///
    /// Returns the finished root when this call completes the run.
    pub(crate) fn end_stage(&mut self, stage_name: &str) -> Option<StageNode> {
        let now = self.now_nanos();
        self.end_stage_at(stage_name, now)
    }

    /// Closes a stage at an explicit run-relative time.
    ///
    /// If `stage_name` is not the top frame, the stack is resynchronized:
    /// every frame above the nearest match is sealed as of `now_nanos` and
    /// attached where it sits, then the match is closed normally. An end with
    /// no matching open frame at all changes nothing.
    pub(crate) fn end_stage_at(&mut self, stage_name: &str, now_nanos: u64) -> Option<StageNode> {
        let matched = self
            .open
            .iter()
            .rposition(|frame| frame.stage_name == stage_name);

        let matched = match matched {
            Some(index) => index,
            None => {
                warn!(
                    "{}",
                    TrackError::StageMismatch {
                        profiler: self.profiler_name.clone(),
                        stage: stage_name.to_string(),
                    }
                );
                return None;
            }
        };

        let skipped = self.open.len() - matched - 1;
        if skipped > 0 {
            warn!(
                "profiler '{}': end of '{}' arrived with {} deeper stage(s) still open, sealing them as of now",
                self.profiler_name, stage_name, skipped
            );
        }
        // Skipped frames sit above the match, so only the last iteration can
        // empty the stack and yield the root.
        let mut completed = None;
        for _ in 0..=skipped {
            completed = self.seal_top(now_nanos);
        }
        completed
    }

    /// Seals the top frame at `now_nanos` and attaches it to its parent.
    /// Returns the frame itself when it was the root.
    fn seal_top(&mut self, now_nanos: u64) -> Option<StageNode> {
        let mut frame = self.open.pop()?;
        frame.seal(now_nanos);
        match self.open.last_mut() {
            Some(parent) => {
                parent.insert_child(frame);
                None
            }
            None => Some(frame),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::config::NANOS_PER_MS;
    use pretty_assertions::assert_eq;

    const MS: u64 = NANOS_PER_MS;

    #[test]
    fn test_nested_stages_build_the_expected_tree() {
        let mut tracker = RunTracker::new("loading");
        tracker.begin_stage_at("load", 0, 0);
        tracker.begin_stage_at("parse", 1, 10 * MS);
        assert!(tracker.end_stage_at("parse", 30 * MS).is_none());
        let root = tracker.end_stage_at("load", 50 * MS).unwrap();

        assert_eq!(root.stage_name, "load");
        assert_eq!(root.depth, 0);
        assert_eq!(root.start_time_nanos, 0);
        assert_eq!(root.exec_time_nanos, 50 * MS);
        assert_eq!(root.children.len(), 1);

        let parse = &root.children[0];
        assert_eq!(parse.stage_name, "parse");
        assert_eq!(parse.depth, 1);
        assert_eq!(parse.start_time_nanos, 10 * MS);
        assert_eq!(parse.exec_time_nanos, 20 * MS);
        assert!(tracker.is_idle());
    }

    #[test]
    fn test_siblings_sort_by_order_regardless_of_arrival() {
        let mut tracker = RunTracker::new("ordering");
        tracker.begin_stage_at("root", 0, 0);
        for (name, order) in [("late", 2), ("early", 0), ("middle", 1)] {
            tracker.begin_stage_at(name, order, 1 * MS);
            tracker.end_stage_at(name, 2 * MS);
        }
        let root = tracker.end_stage_at("root", 3 * MS).unwrap();

        let seen: Vec<(u32, &str)> = root
            .children
            .iter()
            .map(|c| (c.order, c.stage_name.as_str()))
            .collect();
        assert_eq!(seen, vec![(0, "early"), (1, "middle"), (2, "late")]);
    }

    #[test]
    fn test_recursive_names_close_innermost_first() {
        let mut tracker = RunTracker::new("recursion");
        tracker.begin_stage_at("visit", 0, 0);
        tracker.begin_stage_at("visit", 0, 5 * MS);
        assert!(tracker.end_stage_at("visit", 8 * MS).is_none());
        let root = tracker.end_stage_at("visit", 20 * MS).unwrap();

        assert_eq!(root.exec_time_nanos, 20 * MS);
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].start_time_nanos, 5 * MS);
        assert_eq!(root.children[0].exec_time_nanos, 3 * MS);
        assert_eq!(root.children[0].depth, 1);
    }

    #[test]
    fn test_missing_ends_are_sealed_where_they_sit() {
        let mut tracker = RunTracker::new("resync");
        tracker.begin_stage_at("root", 0, 0);
        tracker.begin_stage_at("outer", 0, 2 * MS);
        tracker.begin_stage_at("inner", 0, 4 * MS);
        // Neither "inner" nor "outer" was ended before the root.
        let root = tracker.end_stage_at("root", 10 * MS).unwrap();

        assert_eq!(root.exec_time_nanos, 10 * MS);
        let outer = &root.children[0];
        assert_eq!(outer.stage_name, "outer");
        assert_eq!(outer.exec_time_nanos, 8 * MS);
        let inner = &outer.children[0];
        assert_eq!(inner.stage_name, "inner");
        assert_eq!(inner.exec_time_nanos, 6 * MS);

        // The tracker is clean again for the next run.
        assert!(tracker.is_idle());
        tracker.begin_stage_at("root", 0, 0);
        let next = tracker.end_stage_at("root", 1 * MS).unwrap();
        assert_eq!(next.children.len(), 0);
        assert_eq!(next.exec_time_nanos, 1 * MS);
    }

    #[test]
    fn test_end_without_a_match_changes_nothing() {
        let mut tracker = RunTracker::new("mismatch");
        assert!(tracker.end_stage_at("never-started", 1 * MS).is_none());
        assert!(tracker.is_idle());

        tracker.begin_stage_at("root", 0, 0);
        assert!(tracker.end_stage_at("never-started", 1 * MS).is_none());
        assert!(!tracker.is_idle());
        let root = tracker.end_stage_at("root", 2 * MS).unwrap();
        assert_eq!(root.exec_time_nanos, 2 * MS);
    }

    #[test]
    fn test_duplicate_sibling_order_keeps_first_arrival_position() {
        let mut tracker = RunTracker::new("duplicates");
        tracker.begin_stage_at("root", 0, 0);
        for name in ["first", "second"] {
            tracker.begin_stage_at(name, 7, 1 * MS);
            tracker.end_stage_at(name, 2 * MS);
        }
        let root = tracker.end_stage_at("root", 3 * MS).unwrap();

        // Both siblings survive, earliest arrival first.
        let names: Vec<&str> = root
            .children
            .iter()
            .map(|c| c.stage_name.as_str())
            .collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn test_wall_clock_run_reports_nested_nonzero_times() {
        let mut tracker = RunTracker::new("wall-clock");
        tracker.begin_stage("work", 0);
        tracker.begin_stage("step", 0);
        std::thread::sleep(std::time::Duration::from_millis(2));
        tracker.end_stage("step");
        let root = tracker.end_stage("work").unwrap();

        assert_eq!(root.start_time_nanos, 0);
        let step = &root.children[0];
        assert!(step.exec_time_nanos >= 2 * MS);
        assert!(step.start_time_nanos + step.exec_time_nanos <= root.exec_time_nanos);
    }
}
